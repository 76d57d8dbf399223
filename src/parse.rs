//! Literal address parsing and the text form of address rdata.

use std::convert::TryInto;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::query::{TYPE_A, TYPE_AAAA};

/// Returns the address if `addr` is a literal IPv4 or IPv6 address.
pub fn parse_literal_ip(addr: &str) -> Option<IpAddr> {
    addr.parse::<IpAddr>().ok()
}

/// Renders raw address rdata in canonical text form, dotted-quad for A
/// data and colon-hex for AAAA data. `None` when the data does not have
/// the fixed size of its record type.
pub fn format_address(rtype: u16, rdata: &[u8]) -> Option<String> {
    match rtype {
        TYPE_A => {
            let octets: [u8; 4] = rdata.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        TYPE_AAAA => {
            let octets: [u8; 16] = rdata.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}
