// # IP Resolver Trait
//
// Defines how the engine learns the host's current address.
//
// ## Implementations
//
// - HTTP echo services and local UDP probe: `ddns-ip-resolver` crate

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP resolver implementations
///
/// Called once per poll. Failures are transient: the engine logs them and
/// tries again after the next sleep, so implementations should not retry
/// internally beyond their own failover list.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Determine the current address
    ///
    /// # Parameters
    ///
    /// - `use_local`: report the address of the local outbound interface
    ///   instead of the public egress address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address
    /// - `Err(Error)`: No address could be determined this time
    async fn current_ip(&self, use_local: bool) -> Result<IpAddr, crate::Error>;

    /// Resolver name (for logging)
    fn resolver_name(&self) -> &'static str {
        "ip-resolver"
    }
}
