//! Error types for the DDNS updater
//!
//! Startup errors ([`Error::Config`], [`Error::Resolution`]) are fatal.
//! Everything raised inside the poll loop is logged and the loop carries on;
//! the next tick is the retry.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid required setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record lookup failed or no record matched the sub-domain
    #[error("Record resolution failed: {0}")]
    Resolution(String),

    /// The egress address could not be determined
    #[error("IP resolver error: {0}")]
    IpResolver(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// State could not be written to durable storage
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a record resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create an IP resolver error
    pub fn ip_resolver(msg: impl Into<String>) -> Self {
        Self::IpResolver(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error should terminate the process at startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Resolution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_fatal() {
        assert!(Error::config("domain is empty").is_fatal());
        assert!(Error::resolution("no record named www").is_fatal());
        assert!(!Error::ip_resolver("timeout").is_fatal());
        assert!(!Error::provider("dnspod", "rate limited").is_fatal());
        assert!(!Error::persistence("read-only file system").is_fatal());
    }

    #[test]
    fn provider_error_names_the_provider() {
        let err = Error::provider("dnspod", "Domain id invalid");
        assert_eq!(err.to_string(), "Provider error (dnspod): Domain id invalid");
    }
}
