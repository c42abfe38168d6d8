use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Largest datagram the monitors will accept.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// TCP monitors read in chunks of this size.
pub const STREAM_READ_SIZE: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Start a new session as soon as the log is exhausted.
    pub repeat: bool,
}

#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub port: u16,
    pub destination: Ipv4Addr,
    /// Local addresses to send from. Empty means the unspecified address.
    pub sources: Vec<Ipv4Addr>,
}

impl BroadcastConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_sources(mut self, sources: Vec<Ipv4Addr>) -> Self {
        self.sources = sources;
        self
    }

    pub fn destination_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.destination), self.port)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            port: 0,
            destination: Ipv4Addr::BROADCAST,
            sources: Vec::new(),
        }
    }
}

/// `0.0.0.0:<port>`, the address every listener binds to.
pub fn any_addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_defaults_to_limited_broadcast() {
        let config = BroadcastConfig::new(2000);
        assert_eq!(
            config.destination_addr(),
            "255.255.255.255:2000".parse::<SocketAddr>().unwrap()
        );
        assert!(config.sources.is_empty());
    }
}
