//! Scan target parsing and CIDR expansion

use crate::ScanError;
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

/// A parsed target and the host addresses it expands to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTarget {
    pub original: String,
    pub hosts: Vec<Ipv4Addr>,
    /// Usable host count before the cap was applied
    pub total_hosts: u64,
}

impl ExpandedTarget {
    fn single(original: &str, addr: Ipv4Addr) -> Self {
        Self {
            original: original.to_string(),
            hosts: vec![addr],
            total_hosts: 1,
        }
    }

    fn from_network(original: &str, network: Ipv4Network, max_hosts: usize) -> Self {
        let host_bits = 32 - u32::from(network.prefix());
        let total_addresses = 1u64 << host_bits;
        let base = u32::from(network.network());

        // /31 and /32 have no network or broadcast address to skip
        let (first, usable) = if host_bits <= 1 {
            (base, total_addresses)
        } else {
            (base + 1, total_addresses - 2)
        };

        let take = usable.min(max_hosts as u64);
        let hosts = (0..take)
            .map(|offset| Ipv4Addr::from(first + offset as u32))
            .collect();

        Self {
            original: original.to_string(),
            hosts,
            total_hosts: usable,
        }
    }

    /// Whether the cap dropped hosts
    pub fn is_truncated(&self) -> bool {
        (self.hosts.len() as u64) < self.total_hosts
    }
}

/// Expand one target string into at most `max_hosts` host addresses.
///
/// CIDR notation is tried first (host bits may be set, `10.0.0.7/24` means
/// `10.0.0.0/24`), then a bare IPv4 address.
pub fn expand_target(target: &str, max_hosts: usize) -> crate::Result<ExpandedTarget> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ScanError::InvalidTarget("Target cannot be empty".to_string()));
    }

    match target.parse::<Ipv4Network>() {
        Ok(network) => Ok(ExpandedTarget::from_network(target, network, max_hosts)),
        Err(network_err) => match target.parse::<Ipv4Addr>() {
            Ok(addr) => Ok(ExpandedTarget::single(target, addr)),
            Err(_) => Err(ScanError::InvalidTarget(format!(
                "{}: {}",
                target, network_err
            ))),
        },
    }
}
