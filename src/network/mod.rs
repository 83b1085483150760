//! Network layer protocols implementation
//!
//! This module contains the wire formats and per-protocol state that the
//! stack builds on:
//! - ARP: packet format and the bounded address cache
//! - IPv4: Internet Protocol version 4 header
//! - ICMP: Internet Control Message Protocol header

pub mod arp;
pub mod icmp;
pub mod ipv4;

// Re-export commonly used items
pub use arp::{ArpCache, ArpEntry, ArpPacket, ArpState};
pub use icmp::IcmpHeader;
pub use ipv4::{flags, protocol, Ipv4Header};

/// Calculate Internet checksum
///
/// Algorithm: Sum data in 16-bit chunks, add carry bits to the sum,
/// and return the one's complement of the result.
/// Odd-length data is treated as if padded with a trailing zero byte.
/// Used for the IPv4 header, ICMP and UDP (with its pseudo-header).
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let [last] = chunks.remainder() {
        sum += (*last as u32) << 8;
    }

    while (sum >> 16) > 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}
