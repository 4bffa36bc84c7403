//! IPv4 range-string parsing.
//!
//! Blocklist sources write ranges in three shapes: a bare address, a CIDR
//! block, or two addresses joined by a hyphen. Lines may carry a trailing
//! `# comment`. Everything here is pure string work; no store interaction.

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::Ipv4Net;

use crate::error::{Result, RiprError};

/// Strip a trailing `# comment` and surrounding whitespace.
fn strip_comment(input: &str) -> &str {
    match input.split_once('#') {
        Some((head, _)) => head.trim(),
        None => input.trim(),
    }
}

/// Parse a single IPv4 address.
///
/// IPv6 input is detected and rejected with its own error so callers can
/// tell "wrong address family" apart from garbage.
pub fn parse_ip(input: &str) -> Result<Ipv4Addr> {
    let s = strip_comment(input);

    if let Ok(ip) = s.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    if s.parse::<Ipv6Addr>().is_ok() {
        return Err(RiprError::Ipv6NotSupported);
    }
    Err(RiprError::InvalidIp)
}

/// Parse a range string into its inclusive bounds.
///
/// Accepted forms, tried in order:
/// 1. a bare IPv4 address, yielding a one-address range,
/// 2. IPv4 CIDR `a.b.c.d/m` with `1 <= m <= 32`, expanded to
///    network..broadcast,
/// 3. `lo - hi` with optional whitespace around the hyphen, rejected when
///    `lo > hi`.
pub fn parse_range(input: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let s = strip_comment(input);
    if s.is_empty() {
        return Err(RiprError::InvalidRange);
    }

    if let Ok(ip) = s.parse::<Ipv4Addr>() {
        return Ok((ip, ip));
    }

    if let Some((addr_part, prefix_part)) = s.split_once('/') {
        if addr_part.contains(':') {
            return Err(RiprError::Ipv6NotSupported);
        }
        let prefix: u8 = prefix_part
            .trim()
            .parse()
            .map_err(|_| RiprError::InvalidRange)?;
        if !(1..=32).contains(&prefix) {
            return Err(RiprError::InvalidRange);
        }
        let addr: Ipv4Addr = addr_part
            .trim()
            .parse()
            .map_err(|_| RiprError::InvalidRange)?;
        let net = Ipv4Net::new(addr, prefix).map_err(|_| RiprError::InvalidRange)?;
        return Ok((net.network(), net.broadcast()));
    }

    if let Some((lo_part, hi_part)) = s.split_once('-') {
        if lo_part.contains(':') || hi_part.contains(':') {
            return Err(RiprError::Ipv6NotSupported);
        }
        let lo: Ipv4Addr = lo_part.trim().parse().map_err(|_| RiprError::InvalidRange)?;
        let hi: Ipv4Addr = hi_part.trim().parse().map_err(|_| RiprError::InvalidRange)?;
        if u32::from(lo) > u32::from(hi) {
            return Err(RiprError::InvalidRange);
        }
        return Ok((lo, hi));
    }

    if s.contains(':') {
        return Err(RiprError::Ipv6NotSupported);
    }
    Err(RiprError::InvalidRange)
}
