//! Address family resolution for session endpoints.
//!
//! Addresses are literals only: an IPv4 parse is attempted first, then IPv6.
//! No name resolution happens here, so construction never touches the network.

use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::ConfigError;

/// IP version of a session's endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddressFamily {
    /// Family of an already parsed address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    /// Wildcard address of this family, used for port-only binds
    pub fn unspecified(self) -> IpAddr {
        match self {
            AddressFamily::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressFamily::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Parse an IPv4 dotted-quad literal
pub fn try_parse_v4(addr: &str) -> Result<Ipv4Addr, AddrParseError> {
    addr.parse()
}

/// Parse an IPv6 literal
pub fn try_parse_v6(addr: &str) -> Result<Ipv6Addr, AddrParseError> {
    addr.parse()
}

/// Resolve a literal to an address, IPv4 first, then IPv6
pub fn resolve(addr: &str) -> Result<IpAddr, ConfigError> {
    let v4_error = match try_parse_v4(addr) {
        Ok(ip) => return Ok(IpAddr::V4(ip)),
        Err(e) => e,
    };

    match try_parse_v6(addr) {
        Ok(ip) => Ok(IpAddr::V6(ip)),
        Err(v6_error) => Err(ConfigError::UnknownFamily {
            addr: addr.to_string(),
            v4_error,
            v6_error,
        }),
    }
}

/// Resolve the destination and optional source, checking they share a family.
///
/// An empty source means "no bind address" and yields `None`.
pub fn resolve_pair(target: &str, source: &str) -> Result<(IpAddr, Option<IpAddr>), ConfigError> {
    let target_ip = resolve(target)?;
    if source.is_empty() {
        return Ok((target_ip, None));
    }

    let source_ip = resolve(source)?;
    if AddressFamily::of(&source_ip) != AddressFamily::of(&target_ip) {
        return Err(ConfigError::FamilyMismatch {
            target_host: target.to_string(),
            source_host: source.to_string(),
        });
    }

    Ok((target_ip, Some(source_ip)))
}
