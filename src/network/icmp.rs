//! ICMP (Internet Control Message Protocol) implementation
//!
//! This module provides ICMP header parsing and the message types the stack
//! speaks: Echo Request/Reply and Destination Unreachable.

use crate::network::checksum;
use crate::network::ipv4::IPV4_HEADER_LEN;
use byteorder::{BigEndian, ByteOrder};

/// ICMP header length in bytes
pub const ICMP_HEADER_LEN: usize = 8;

/// Bytes of the offending datagram quoted in an error: its IP header plus
/// the first 8 bytes of its payload.
pub const ICMP_QUOTE_LEN: usize = IPV4_HEADER_LEN + 8;

/// ICMP message types
pub const ICMP_TYPE_ECHO_REPLY: u8 = 0;
pub const ICMP_TYPE_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 8;

/// Destination Unreachable codes
pub const ICMP_CODE_PROTOCOL_UNREACHABLE: u8 = 2;
pub const ICMP_CODE_PORT_UNREACHABLE: u8 = 3;

/// ICMP packet header structure
///
/// Represents the standard 8-byte ICMP header as defined in RFC 792
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub msg_type: u8,  // ICMP message type
    pub msg_code: u8,  // ICMP message code
    pub checksum: u16, // ICMP checksum
    pub rest: [u8; 4], // Type-specific data (identifier and sequence for echo, unused for errors)
}

impl IcmpHeader {
    /// Parse ICMP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid ICMP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ICMP_HEADER_LEN {
            return None;
        }

        let mut rest = [0u8; 4];
        rest.copy_from_slice(&data[4..8]);

        Some(IcmpHeader {
            msg_type: data[0],
            msg_code: data[1],
            checksum: BigEndian::read_u16(&data[2..4]),
            rest,
        })
    }

    /// Convert ICMP header to bytes
    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut bytes = [0u8; ICMP_HEADER_LEN];
        bytes[0] = self.msg_type;
        bytes[1] = self.msg_code;
        BigEndian::write_u16(&mut bytes[2..4], self.checksum);
        bytes[4..8].copy_from_slice(&self.rest);
        bytes
    }

    /// Echo Request carrying `identifier` and `sequence`
    pub fn echo_request(identifier: u16, sequence: u16) -> Self {
        let mut header = IcmpHeader {
            msg_type: ICMP_TYPE_ECHO_REQUEST,
            msg_code: 0,
            checksum: 0,
            rest: [0; 4],
        };
        header.set_identifier(identifier);
        header.set_sequence(sequence);
        header
    }

    /// Destination Unreachable with zeroed identifier/sequence
    pub fn unreachable(code: u8) -> Self {
        IcmpHeader {
            msg_type: ICMP_TYPE_DEST_UNREACHABLE,
            msg_code: code,
            checksum: 0,
            rest: [0; 4],
        }
    }

    /// Check if this is an Echo Request message
    pub fn is_echo_request(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REQUEST && self.msg_code == 0
    }

    /// Check if this is an Echo Reply message
    pub fn is_echo_reply(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REPLY
    }

    /// Get the identifier field for Echo Request/Reply messages
    pub fn identifier(&self) -> u16 {
        BigEndian::read_u16(&self.rest[0..2])
    }

    /// Get the sequence number field for Echo Request/Reply messages
    pub fn sequence(&self) -> u16 {
        BigEndian::read_u16(&self.rest[2..4])
    }

    /// Set the identifier field for Echo Request/Reply messages
    pub fn set_identifier(&mut self, id: u16) {
        BigEndian::write_u16(&mut self.rest[0..2], id);
    }

    /// Set the sequence number field for Echo Request/Reply messages
    pub fn set_sequence(&mut self, seq: u16) {
        BigEndian::write_u16(&mut self.rest[2..4], seq);
    }
}

/// Serialize `header` followed by `body`, with the checksum computed over the
/// whole message (the header's own checksum field is ignored).
pub fn build_message(header: &IcmpHeader, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(ICMP_HEADER_LEN + body.len());
    message.extend_from_slice(&header.to_bytes());
    message.extend_from_slice(body);
    fill_checksum(&mut message);
    message
}

/// Zero the checksum field of a complete ICMP message, then store the
/// checksum of the whole message in it.
pub fn fill_checksum(message: &mut [u8]) {
    message[2..4].copy_from_slice(&[0, 0]);
    let sum = checksum(message);
    BigEndian::write_u16(&mut message[2..4], sum);
}
