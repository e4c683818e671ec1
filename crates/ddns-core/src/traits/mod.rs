//! Collaborator traits
//!
//! - [`IpResolver`]: Determine the host's current address
//! - [`DnsProvider`]: List and update records via the provider API
//! - [`StateStore`]: Persist the configuration snapshot

pub mod ip_resolver;
pub mod dns_provider;
pub mod state_store;

pub use ip_resolver::IpResolver;
pub use dns_provider::{
    DEFAULT_RECORD_LINE, DEFAULT_TTL, DnsProvider, RecordEntry, RecordHandle, RecordUpdate,
    UpdateAck,
};
pub use state_store::StateStore;
