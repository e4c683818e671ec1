// # DNSPod DNS Provider
//
// This crate provides the DNSPod implementation of `DnsProvider`.
//
// ## Behaviour
//
// - One HTTP request per call; no retries, no backoff, no caching
// - 30 second timeout on every request
// - HTTP status codes mapped to specific errors (401/403, 429, 5xx)
// - A call only succeeds when the API answers with status code "1"
// - Only `A` records are written
//
// ## Security Requirements
//
// - The login token NEVER appears in logs or `Debug` output
// - Construction fails fast if the token is empty
//
// ## API Reference
//
// - List records: POST `https://dnsapi.cn/Record.List`
// - Modify record: POST `https://dnsapi.cn/Record.Modify`
//
// Both take a form-encoded body with `login_token` and `format=json`.

mod api;

use api::{RecordListResponse, RecordModifyResponse, STATUS_NO_RECORDS};
use async_trait::async_trait;
use ddns_core::traits::{DnsProvider, RecordEntry, RecordHandle, RecordUpdate, UpdateAck};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;

/// DNSPod API base URL
pub const DNSPOD_API_BASE: &str = "https://dnsapi.cn";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The only record type this provider writes
const RECORD_TYPE: &str = "A";

/// DNSPod's name for the default resolution line
const DNSPOD_DEFAULT_LINE: &str = "默认";

const PROVIDER_NAME: &str = "dnspod";

/// DNSPod DNS provider
///
/// Stateless: holds the credentials and an HTTP client, nothing else.
pub struct DnspodProvider {
    /// `<id>,<token>` pair issued by DNSPod
    /// ⚠️ NEVER log this value
    login_token: String,

    /// Base URL, overridable for tests
    api_base: String,

    /// HTTP client with timeout and User-Agent configured
    client: reqwest::Client,
}

// Custom Debug implementation that hides the login token
impl std::fmt::Debug for DnspodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodProvider")
            .field("login_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DnspodProvider {
    /// Create a new DNSPod provider
    ///
    /// # Parameters
    ///
    /// - `login_token`: DNSPod API token in `<id>,<token>` form
    /// - `email`: Contact address placed in the User-Agent, as DNSPod asks
    ///   API clients to identify themselves
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the token is empty or the HTTP client cannot
    /// be built.
    pub fn new(login_token: impl Into<String>, email: &str) -> Result<Self> {
        let login_token = login_token.into();
        if login_token.trim().is_empty() {
            return Err(Error::config("DNSPod login token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(user_agent(email))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            login_token,
            api_base: DNSPOD_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn list_form(&self, domain: &str) -> Vec<(&'static str, String)> {
        vec![
            ("login_token", self.login_token.clone()),
            ("format", "json".to_string()),
            ("domain", domain.to_string()),
        ]
    }

    fn modify_form(&self, update: &RecordUpdate) -> Result<Vec<(&'static str, String)>> {
        if !matches!(update.ip, IpAddr::V4(_)) {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("Only IPv4 addresses can be written, got {}", update.ip),
            ));
        }

        Ok(vec![
            ("login_token", self.login_token.clone()),
            ("format", "json".to_string()),
            ("domain", update.domain.clone()),
            ("sub_domain", update.sub_domain.clone()),
            ("record_id", update.record_id.to_string()),
            ("record_line", line_name(&update.line).to_string()),
            ("record_type", RECORD_TYPE.to_string()),
            ("ttl", update.ttl.to_string()),
            ("value", update.ip.to_string()),
        ])
    }

    /// POST a form to `<api_base>/<action>` and decode the JSON body
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        form: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_base, action);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !status.is_success() {
            return Err(http_status_error(action, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("Failed to parse {} response: {}", action, e),
            )
        })
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<RecordEntry>> {
        tracing::debug!("Listing DNSPod records of {}", domain);

        let response: RecordListResponse = self.call("Record.List", &self.list_form(domain)).await?;

        if response.status.code == STATUS_NO_RECORDS {
            return Ok(Vec::new());
        }
        if !response.status.is_ok() {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!(
                    "Record.List rejected (code {}): {}",
                    response.status.code, response.status.message
                ),
            ));
        }

        Ok(response
            .records
            .into_iter()
            .map(|item| {
                tracing::trace!("{} {} {} (id {})", item.name, item.record_type, item.value, item.id);
                RecordEntry {
                    name: item.name,
                    id: RecordHandle::new(item.id),
                }
            })
            .collect())
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<UpdateAck> {
        let form = self.modify_form(update)?;

        tracing::info!(
            "Updating DNSPod record {}.{} (id {}) -> {}",
            update.sub_domain,
            update.domain,
            update.record_id,
            update.ip
        );

        let response: RecordModifyResponse = self.call("Record.Modify", &form).await?;

        if !response.status.is_ok() {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!(
                    "Record.Modify rejected (code {}): {}",
                    response.status.code, response.status.message
                ),
            ));
        }

        let ack = match response.record {
            Some(record) => UpdateAck {
                record_id: RecordHandle::new(record.id),
                value: if record.value.is_empty() {
                    update.ip.to_string()
                } else {
                    record.value
                },
            },
            None => UpdateAck {
                record_id: update.record_id.clone(),
                value: update.ip.to_string(),
            },
        };

        tracing::debug!("record updated: {:?}", ack);
        Ok(ack)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn user_agent(email: &str) -> String {
    format!("ddns-dnspod/{} ({})", env!("CARGO_PKG_VERSION"), email)
}

/// Translate the provider-neutral line name into DNSPod's
fn line_name(line: &str) -> &str {
    if line.eq_ignore_ascii_case("default") {
        DNSPOD_DEFAULT_LINE
    } else {
        line
    }
}

fn http_status_error(action: &str, status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER_NAME,
            format!("{}: authentication failed. Status: {}", action, status),
        ),
        429 => Error::provider(
            PROVIDER_NAME,
            format!("{}: rate limit exceeded. Status: {}", action, status),
        ),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: DNSPod server error (transient): {} - {}", action, status, body),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", action, status, body),
        ),
    }
}
