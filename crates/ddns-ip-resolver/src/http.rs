//! Public egress address via plain-text HTTP echo services
//!
//! Services are tried in order until one answers with an IPv4 address. A
//! service that times out, returns an error status, or answers with
//! something that is not IPv4 is skipped.

use ddns_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Echo services queried in order
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ipv4.icanhazip.com",
    "https://ifconfig.me/ip",
];

/// Per-request timeout
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the public IPv4 address with failover between services
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    services: Vec<String>,
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Resolver over [`DEFAULT_IP_SERVICES`]
    pub fn new() -> Result<Self> {
        Self::with_services(DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_services(services: Vec<String>) -> Result<Self> {
        if services.is_empty() {
            return Err(Error::config("At least one IP echo service is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { services, client })
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Query each service in turn, first IPv4 answer wins
    pub async fn fetch(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.services {
            match self.fetch_from(url).await {
                Ok(ip) => {
                    tracing::debug!("{} reported {}", url, ip);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP lookup via {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::ip_resolver(format!(
            "All {} IP services failed, last error: {}",
            self.services.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn fetch_from(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        parse_ipv4(&text)
    }
}

/// Parse an echo service body, accepting only IPv4
fn parse_ipv4(body: &str) -> Result<IpAddr> {
    let text = body.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_resolver(format!("Invalid IP address: {}", text)))?;

    if !ip.is_ipv4() {
        return Err(Error::ip_resolver(format!("Expected IPv4, got: {}", ip)));
    }
    Ok(ip)
}
