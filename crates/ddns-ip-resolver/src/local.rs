//! Local interface address via a connected UDP socket
//!
//! Connecting a UDP socket sends nothing; it only makes the kernel pick the
//! outbound route, whose source address is then read back.

use ddns_core::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

/// Address used to select the outbound route
pub const DEFAULT_PROBE: SocketAddr =
    SocketAddr::new(IpAddr::V4(std::net::Ipv4Addr::new(8, 8, 8, 8)), 80);

#[derive(Debug, Clone, Copy)]
pub struct LocalIpResolver {
    probe: SocketAddr,
}

impl LocalIpResolver {
    pub fn new() -> Self {
        Self::with_probe(DEFAULT_PROBE)
    }

    pub fn with_probe(probe: SocketAddr) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> SocketAddr {
        self.probe
    }

    /// Source IPv4 address of the route towards the probe
    pub async fn discover(&self) -> Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Error::ip_resolver(format!("UDP bind failed: {}", e)))?;

        socket
            .connect(self.probe)
            .await
            .map_err(|e| Error::ip_resolver(format!("No route to {}: {}", self.probe, e)))?;

        let local = socket
            .local_addr()
            .map_err(|e| Error::ip_resolver(format!("Reading local address failed: {}", e)))?
            .ip();

        if local.is_unspecified() {
            return Err(Error::ip_resolver("Outbound interface has no address"));
        }
        Ok(local)
    }
}

impl Default for LocalIpResolver {
    fn default() -> Self {
        Self::new()
    }
}
