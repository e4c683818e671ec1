// # IP Resolver
//
// This crate tells the engine which IPv4 address the record should carry.
//
// ## Modes
//
// - **Public** (default): the egress address as seen from the internet,
//   fetched from plain-text echo services with failover
// - **Local** (`using_local_ip=1`): the source address of the outbound
//   interface, for hosts behind NAT whose record should point inside the
//   private network
//
// Neither mode caches; every poll asks again. Failures are reported as
// `Error::IpResolver` and the engine simply tries again next tick.

pub mod http;
pub mod local;

use async_trait::async_trait;
use ddns_core::Result;
use ddns_core::traits::IpResolver;
use std::net::IpAddr;

pub use http::{DEFAULT_IP_SERVICES, HttpIpResolver};
pub use local::LocalIpResolver;

/// Dispatches to the public or local lookup per call
#[derive(Debug, Clone)]
pub struct SystemIpResolver {
    public: HttpIpResolver,
    local: LocalIpResolver,
}

impl SystemIpResolver {
    /// Resolver with the default echo services and route probe
    pub fn new() -> Result<Self> {
        Ok(Self::from_parts(HttpIpResolver::new()?, LocalIpResolver::new()))
    }

    pub fn from_parts(public: HttpIpResolver, local: LocalIpResolver) -> Self {
        Self { public, local }
    }
}

#[async_trait]
impl IpResolver for SystemIpResolver {
    async fn current_ip(&self, use_local: bool) -> Result<IpAddr> {
        if use_local {
            self.local.discover().await
        } else {
            self.public.fetch().await
        }
    }

    fn resolver_name(&self) -> &'static str {
        "system"
    }
}
