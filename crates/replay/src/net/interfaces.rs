use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Any routable public address works; nothing is ever sent to it.
const ROUTE_LOOKUP_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// Local IPv4 address of the interface carrying the default route.
///
/// Connecting a UDP socket only selects a route, so no traffic leaves the host.
pub fn default_route_ipv4() -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_LOOKUP_ADDR)?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        ip => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable IPv4 source address (got {ip})"),
        )),
    }
}

/// Addresses the broadcaster sends from.
///
/// Explicit addresses win. Otherwise the default-route address is used, and
/// failing that the unspecified address, leaving the choice to the OS.
pub fn broadcast_sources(explicit: &[Ipv4Addr]) -> Vec<Ipv4Addr> {
    if !explicit.is_empty() {
        let mut sources = Vec::with_capacity(explicit.len());
        for ip in explicit {
            if !sources.contains(ip) {
                sources.push(*ip);
            }
        }
        return sources;
    }

    match default_route_ipv4() {
        Ok(ip) => vec![ip],
        Err(e) => {
            log::warn!("Could not determine source address, using 0.0.0.0: {}", e);
            vec![Ipv4Addr::UNSPECIFIED]
        }
    }
}
