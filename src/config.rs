//! Stack configuration: local identity and table sizes.

use crate::error::{NetError, Result};
use crate::link::MacAddr;
use crate::network::ipv4::IPV4_HEADER_LEN;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_MTU: usize = 1500;

/// Smallest MTU every IPv4 host must accept (RFC 791).
pub const MIN_MTU: usize = 68;

pub const ARP_MAX_ENTRY: usize = 16;
pub const ARP_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const UDP_MAX_HANDLER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// Largest network-layer payload the link accepts.
    pub mtu: usize,
    pub arp_capacity: usize,
    /// Age after which an ARP entry may be reclaimed.
    pub arp_timeout: Duration,
    pub udp_capacity: usize,
}

impl StackConfig {
    /// Configuration with default table sizes and MTU.
    pub fn new(ip: Ipv4Addr, mac: MacAddr) -> Self {
        StackConfig {
            ip,
            mac,
            mtu: DEFAULT_MTU,
            arp_capacity: ARP_MAX_ENTRY,
            arp_timeout: ARP_TIMEOUT,
            udp_capacity: UDP_MAX_HANDLER,
        }
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_arp_capacity(mut self, capacity: usize) -> Self {
        self.arp_capacity = capacity;
        self
    }

    pub fn with_arp_timeout(mut self, timeout: Duration) -> Self {
        self.arp_timeout = timeout;
        self
    }

    pub fn with_udp_capacity(mut self, capacity: usize) -> Self {
        self.udp_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mtu < MIN_MTU {
            return Err(NetError::InvalidConfig(format!(
                "mtu {} is below the IPv4 minimum of {}",
                self.mtu, MIN_MTU
            )));
        }
        if self.arp_capacity == 0 {
            return Err(NetError::InvalidConfig(
                "arp cache needs at least one entry".to_string(),
            ));
        }
        Ok(())
    }

    /// Payload bytes carried by each IPv4 fragment, kept a multiple of 8
    /// so fragment offsets stay exact.
    pub fn max_fragment_payload(&self) -> usize {
        (self.mtu - IPV4_HEADER_LEN) & !7
    }
}

/// Parse `aa:bb:cc:dd:ee:ff` (or `-` separated).
pub fn parse_mac(s: &str) -> Result<MacAddr> {
    let parts: Vec<&str> = s.split(|c: char| c == ':' || c == '-').collect();
    if parts.len() != 6 {
        return Err(NetError::InvalidMac(s.to_string()));
    }

    let mut mac = [0u8; 6];
    for (byte, part) in mac.iter_mut().zip(parts) {
        *byte = u8::from_str_radix(part, 16).map_err(|_| NetError::InvalidMac(s.to_string()))?;
    }
    Ok(mac)
}

/// Parse `10.0.0.1/24` into the address and its netmask.
pub fn parse_ipv4_cidr(ip_cidr: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let invalid = || NetError::InvalidCidr(ip_cidr.to_string());

    let (ip, prefix) = ip_cidr.split_once('/').ok_or_else(invalid)?;
    let ip: Ipv4Addr = ip.parse().map_err(|_| invalid())?;
    let prefix_len: u32 = prefix.parse().map_err(|_| invalid())?;
    if prefix_len > 32 {
        return Err(invalid());
    }

    let netmask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
    Ok((ip, Ipv4Addr::from(netmask)))
}
