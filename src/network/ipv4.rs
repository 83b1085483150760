//! IPv4 protocol implementation
//!
//! This module provides the typed IPv4 header: parsing, serialization and
//! checksum handling. Options are not supported; every header this stack
//! writes is the fixed 20-byte form.
//!
//! Features:
//! - IPv4 header parsing and serialization
//! - Checksum calculation and validation
//! - Fragment flag/offset accessors

use crate::network::checksum;
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;

pub const IPV4_HEADER_LEN: usize = 20;
pub const IPV4_VERSION: u8 = 4;
/// 5 * 4 = 20 bytes, the only header length accepted.
pub const DEFAULT_IHL: u8 = 5;
pub const DEFAULT_TTL: u8 = 64;

/// Largest payload a single (pre-fragmentation) datagram can carry.
pub const MAX_DATAGRAM_PAYLOAD: usize = u16::MAX as usize - IPV4_HEADER_LEN;

/// IPv4 packet header structure
///
/// Represents the standard 20-byte IPv4 header as defined in RFC 791
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8, // Internet Header Length, in 32-bit words
    pub tos: u8, // Type of Service
    pub total_len: u16,
    pub id: u16,
    pub flags_frag_offset: u16, // Flags and Fragment Offset
    pub ttl: u8,                // Time to Live
    pub protocol: u8,           // Next Protocol
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl Ipv4Header {
    /// Header for one outbound fragment.
    ///
    /// `frag_offset` is in 8-byte units. The checksum is left at zero;
    /// call [`Ipv4Header::update_checksum`] once all fields are final.
    pub fn fragment(
        protocol: u8,
        src_addr: Ipv4Addr,
        dst_addr: Ipv4Addr,
        payload_len: u16,
        id: u16,
        frag_offset: u16,
        more_fragments: bool,
    ) -> Self {
        let mut flags_frag_offset = frag_offset & flags::FRAGMENT_OFFSET_MASK;
        if more_fragments {
            flags_frag_offset |= flags::MORE_FRAGMENTS;
        }

        Ipv4Header {
            version: IPV4_VERSION,
            ihl: DEFAULT_IHL,
            tos: 0,
            total_len: IPV4_HEADER_LEN as u16 + payload_len,
            id,
            flags_frag_offset,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
        }
    }

    /// Parse IPv4 header from byte slice
    ///
    /// Returns None if the data is too short or if the version field is not 4
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < IPV4_HEADER_LEN {
            return None;
        }

        let version = (data[0] & 0xF0) >> 4;
        if version != IPV4_VERSION {
            return None;
        }

        Some(Ipv4Header {
            version,
            ihl: data[0] & 0x0F,
            tos: data[1],
            total_len: BigEndian::read_u16(&data[2..4]),
            id: BigEndian::read_u16(&data[4..6]),
            flags_frag_offset: BigEndian::read_u16(&data[6..8]),
            ttl: data[8],
            protocol: data[9],
            checksum: BigEndian::read_u16(&data[10..12]),
            src_addr: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst_addr: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }

    /// Convert IPv4 header to bytes
    ///
    /// Serializes the header to a 20-byte array ready for transmission
    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut bytes = [0u8; IPV4_HEADER_LEN];
        bytes[0] = (self.version << 4) | self.ihl;
        bytes[1] = self.tos;
        BigEndian::write_u16(&mut bytes[2..4], self.total_len);
        BigEndian::write_u16(&mut bytes[4..6], self.id);
        BigEndian::write_u16(&mut bytes[6..8], self.flags_frag_offset);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol;
        BigEndian::write_u16(&mut bytes[10..12], self.checksum);
        bytes[12..16].copy_from_slice(&self.src_addr.octets());
        bytes[16..20].copy_from_slice(&self.dst_addr.octets());

        bytes
    }

    /// Checksum of this header with its checksum field taken as zero.
    pub fn compute_checksum(&self) -> u16 {
        let mut bytes = self.to_bytes();
        bytes[10..12].copy_from_slice(&[0, 0]);
        checksum(&bytes)
    }

    /// Recalculate and store the checksum.
    /// Call this after modifying any header fields.
    pub fn update_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Returns true if the stored checksum matches the header contents
    pub fn verify_checksum(&self) -> bool {
        self.compute_checksum() == self.checksum
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_frag_offset & flags::MORE_FRAGMENTS != 0
    }

    /// Fragment offset in 8-byte units.
    pub fn fragment_offset(&self) -> u16 {
        self.flags_frag_offset & flags::FRAGMENT_OFFSET_MASK
    }

    /// True if this datagram is one piece of a larger one.
    pub fn is_fragment(&self) -> bool {
        self.more_fragments() || self.fragment_offset() != 0
    }
}

/// IPv4 protocol constants
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
}

/// IPv4 flags constants
pub mod flags {
    pub const DONT_FRAGMENT: u16 = 0x4000;
    pub const MORE_FRAGMENTS: u16 = 0x2000;
    pub const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ipv4Header {
        let mut header = Ipv4Header::fragment(
            protocol::UDP,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            1480,
            7,
            185,
            true,
        );
        header.update_checksum();
        header
    }

    #[test]
    fn test_fragment_header_fields() {
        let header = sample();
        assert_eq!(header.total_len, 1500);
        assert_eq!(header.ttl, 64);
        assert!(header.more_fragments());
        assert_eq!(header.fragment_offset(), 185);
        assert!(header.is_fragment());

        let bytes = header.to_bytes();
        assert_eq!(bytes[0], 0x45);
        assert_eq!(BigEndian::read_u16(&bytes[6..8]), 0x2000 | 185);
    }

    #[test]
    fn test_parse_and_verify() {
        let bytes = sample().to_bytes();
        let parsed = Ipv4Header::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, sample());
        assert!(parsed.verify_checksum());
        assert_eq!(checksum(&bytes), 0);
    }

    #[test]
    fn test_bit_flip_breaks_checksum() {
        let mut bytes = sample().to_bytes();
        bytes[8] ^= 0x01;
        let parsed = Ipv4Header::from_bytes(&bytes).unwrap();
        assert!(!parsed.verify_checksum());
    }

    #[test]
    fn test_rejects_short_and_wrong_version() {
        assert!(Ipv4Header::from_bytes(&[0x45; 19]).is_none());

        let mut bytes = sample().to_bytes();
        bytes[0] = 0x65;
        assert!(Ipv4Header::from_bytes(&bytes).is_none());
    }
}
