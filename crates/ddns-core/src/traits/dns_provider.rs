// # DNS Provider Trait
//
// Defines the interface the engine uses to talk to the DNS provider's API.
//
// ## Implementations
//
// - DNSPod: `ddns-provider-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{DnsProvider, RecordUpdate};
//
// let records = provider.list_records("example.com").await?;
// let handle = records.iter().find(|r| r.name == "www").map(|r| r.id.clone());
//
// provider.update_record(&RecordUpdate::new(
//     "example.com", "www", handle.unwrap(), "203.0.113.7".parse()?,
// )).await?;
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

/// TTL sent with every update, in seconds
pub const DEFAULT_TTL: u32 = 60;

/// Resolution line sent with every update
pub const DEFAULT_RECORD_LINE: &str = "default";

/// Provider-assigned identifier of the managed record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHandle(String);

impl RecordHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Sub-domain label (`@` for the apex)
    pub name: String,
    /// Provider-assigned identifier
    pub id: RecordHandle,
}

/// Parameters of a single record update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub domain: String,
    pub sub_domain: String,
    pub record_id: RecordHandle,
    pub ip: IpAddr,
    pub ttl: u32,
    pub line: String,
}

impl RecordUpdate {
    /// Update with the default TTL and resolution line
    pub fn new(
        domain: impl Into<String>,
        sub_domain: impl Into<String>,
        record_id: RecordHandle,
        ip: IpAddr,
    ) -> Self {
        Self {
            domain: domain.into(),
            sub_domain: sub_domain.into(),
            record_id,
            ip,
            ttl: DEFAULT_TTL,
            line: DEFAULT_RECORD_LINE.to_string(),
        }
    }
}

/// Provider acknowledgement of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAck {
    pub record_id: RecordHandle,
    /// Value the provider now serves, as it reported it
    pub value: String,
}

/// Trait for DNS provider clients
///
/// Implementations are single-shot: one API request per call, no retries,
/// no backoff, no caching. The engine's poll interval is the retry policy,
/// and an error returned here simply leaves the update for the next tick.
///
/// # Security
///
/// Credentials must never appear in logs, errors, or `Debug` output.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of a domain
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<RecordEntry>)`: Every record the provider returned
    /// - `Err(Error)`: Transport failure or an error status from the API
    async fn list_records(&self, domain: &str) -> Result<Vec<RecordEntry>, crate::Error>;

    /// Point a record at a new address
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateAck)`: The provider confirmed the change
    /// - `Err(Error)`: The update was not confirmed
    async fn update_record(&self, update: &RecordUpdate) -> Result<UpdateAck, crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
