//! Host name resolution

use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{NodeSocketError, Result};

/// Address family filter for resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

/// Resolve `host` and pick the first address of an accepted family
///
/// With no filter both IPv4 and IPv6 are accepted.
pub fn resolve(host: &str, port: u16, families: Option<&[AddressFamily]>) -> Result<SocketAddr> {
    let candidates = (host, port)
        .to_socket_addrs()
        .map_err(|e| NodeSocketError::Resolve(format!("{}: {}", host, e)))?;

    select_address(candidates, families).ok_or_else(|| {
        NodeSocketError::Resolve(format!(
            "{}: no records with matching address families",
            host
        ))
    })
}

/// First candidate whose family passes the filter
pub fn select_address<I>(candidates: I, families: Option<&[AddressFamily]>) -> Option<SocketAddr>
where
    I: IntoIterator<Item = SocketAddr>,
{
    candidates.into_iter().find(|addr| match families {
        Some(allowed) => allowed.contains(&AddressFamily::of(addr)),
        None => true,
    })
}
