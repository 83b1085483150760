//! UDP (User Datagram Protocol) implementation
//!
//! This module provides the UDP header, the checksum pseudo-header and the
//! bounded port-to-handler table used for demultiplexing.

use crate::error::{NetError, Result};
use crate::network::ipv4::{protocol, MAX_DATAGRAM_PAYLOAD};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use std::net::Ipv4Addr;

/// UDP header length in bytes
pub const UDP_HEADER_LEN: usize = 8;

/// Pseudo-header length in bytes, never transmitted
pub const UDP_PSEUDO_HEADER_LEN: usize = 12;

/// Largest application payload one UDP datagram can carry over IPv4.
pub const MAX_UDP_PAYLOAD: usize = MAX_DATAGRAM_PAYLOAD - UDP_HEADER_LEN;

/// UDP packet header structure
///
/// Represents the standard 8-byte UDP header as defined in RFC 768
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16, // Length of UDP header and data
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse UDP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid UDP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < UDP_HEADER_LEN {
            return None;
        }

        Some(UdpHeader {
            src_port: BigEndian::read_u16(&data[0..2]),
            dst_port: BigEndian::read_u16(&data[2..4]),
            length: BigEndian::read_u16(&data[4..6]),
            checksum: BigEndian::read_u16(&data[6..8]),
        })
    }

    /// Convert UDP header to bytes
    pub fn to_bytes(&self) -> [u8; UDP_HEADER_LEN] {
        let mut bytes = [0u8; UDP_HEADER_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.src_port);
        BigEndian::write_u16(&mut bytes[2..4], self.dst_port);
        BigEndian::write_u16(&mut bytes[4..6], self.length);
        BigEndian::write_u16(&mut bytes[6..8], self.checksum);
        bytes
    }
}

/// Read the checksum field of a serialized UDP header.
pub fn checksum_field(datagram: &[u8]) -> u16 {
    BigEndian::read_u16(&datagram[6..8])
}

pub fn set_checksum_field(datagram: &mut [u8], checksum: u16) {
    BigEndian::write_u16(&mut datagram[6..8], checksum);
}

/// IPv4 pseudo-header: src_ip(4) + dst_ip(4) + zero(1) + protocol(1) + udp_len(2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub udp_len: u16,
}

impl PseudoHeader {
    pub fn to_bytes(&self) -> [u8; UDP_PSEUDO_HEADER_LEN] {
        let mut bytes = [0u8; UDP_PSEUDO_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.src_addr.octets());
        bytes[4..8].copy_from_slice(&self.dst_addr.octets());
        bytes[8] = 0;
        bytes[9] = protocol::UDP;
        BigEndian::write_u16(&mut bytes[10..12], self.udp_len);
        bytes
    }
}

/// One slot of the handler table.
pub struct UdpHandlerEntry<H> {
    pub port: u16,
    pub valid: bool,
    handler: Option<H>,
}

impl<H> fmt::Debug for UdpHandlerEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpHandlerEntry")
            .field("port", &self.port)
            .field("valid", &self.valid)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Fixed-capacity port-to-handler table with linear lookup.
///
/// Among valid entries, ports are unique.
#[derive(Debug)]
pub struct UdpHandlerTable<H> {
    entries: Vec<UdpHandlerEntry<H>>,
}

impl<H> UdpHandlerTable<H> {
    pub fn new(capacity: usize) -> Self {
        let entries = (0..capacity)
            .map(|_| UdpHandlerEntry {
                port: 0,
                valid: false,
                handler: None,
            })
            .collect();
        UdpHandlerTable { entries }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[UdpHandlerEntry<H>] {
        &self.entries
    }

    /// Register `handler` for `port`.
    ///
    /// A slot already carrying this port (valid or not) is reused and its
    /// handler replaced; otherwise the first invalid slot is claimed.
    pub fn open(&mut self, port: u16, handler: H) -> Result<()> {
        let slot = self
            .entries
            .iter()
            .position(|e| e.port == port)
            .or_else(|| self.entries.iter().position(|e| !e.valid))
            .ok_or(NetError::HandlerTableFull { port })?;

        let entry = &mut self.entries[slot];
        entry.port = port;
        entry.handler = Some(handler);
        entry.valid = true;
        Ok(())
    }

    /// Invalidate every entry for `port` and drop its handler.
    pub fn close(&mut self, port: u16) {
        for entry in self.entries.iter_mut().filter(|e| e.port == port) {
            entry.valid = false;
            entry.handler = None;
        }
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.find(port).is_some()
    }

    /// Index of the valid entry for `port`.
    pub fn find(&self, port: u16) -> Option<usize> {
        self.entries.iter().position(|e| e.valid && e.port == port)
    }

    /// Take the handler out of slot `index` so it can be called while the
    /// table is borrowed elsewhere.
    pub fn take_handler(&mut self, index: usize) -> Option<H> {
        self.entries.get_mut(index).and_then(|e| e.handler.take())
    }

    /// Put a handler taken with [`UdpHandlerTable::take_handler`] back,
    /// unless the slot was closed or re-registered in the meantime.
    pub fn restore_handler(&mut self, index: usize, port: u16, handler: H) {
        if let Some(entry) = self.entries.get_mut(index) {
            if entry.valid && entry.port == port && entry.handler.is_none() {
                entry.handler = Some(handler);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = UdpHeader {
            src_port: 8000,
            dst_port: 9000,
            length: 12,
            checksum: 0xBEEF,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..2], &8000u16.to_be_bytes());
        assert_eq!(checksum_field(&bytes), 0xBEEF);
        assert_eq!(UdpHeader::from_bytes(&bytes), Some(header));
        assert!(UdpHeader::from_bytes(&bytes[..7]).is_none());
    }

    #[test]
    fn test_pseudo_header_layout() {
        let pseudo = PseudoHeader {
            src_addr: Ipv4Addr::new(10, 0, 0, 1),
            dst_addr: Ipv4Addr::new(10, 0, 0, 2),
            udp_len: 0x0123,
        };
        assert_eq!(
            pseudo.to_bytes(),
            [10, 0, 0, 1, 10, 0, 0, 2, 0, 17, 0x01, 0x23]
        );
    }

    #[test]
    fn test_open_find_close() {
        let mut table: UdpHandlerTable<&str> = UdpHandlerTable::new(2);
        table.open(53, "dns").unwrap();
        assert_eq!(table.find(53), Some(0));
        assert!(table.is_open(53));

        table.close(53);
        assert_eq!(table.find(53), None);
        assert!(table.take_handler(0).is_none());
    }

    #[test]
    fn test_open_replaces_existing_port() {
        let mut table: UdpHandlerTable<&str> = UdpHandlerTable::new(2);
        table.open(7, "first").unwrap();
        table.open(7, "second").unwrap();

        assert_eq!(table.find(7), Some(0));
        assert_eq!(table.take_handler(0), Some("second"));
        assert!(!table.entries()[1].valid);
    }

    #[test]
    fn test_closed_slot_reused_for_same_port() {
        let mut table: UdpHandlerTable<&str> = UdpHandlerTable::new(2);
        table.open(1, "a").unwrap();
        table.open(2, "b").unwrap();
        table.close(2);
        table.open(2, "c").unwrap();
        assert_eq!(table.find(2), Some(1));
    }

    #[test]
    fn test_full_table() {
        let mut table: UdpHandlerTable<&str> = UdpHandlerTable::new(2);
        table.open(1, "a").unwrap();
        table.open(2, "b").unwrap();

        let err = table.open(3, "c").unwrap_err();
        assert!(matches!(err, NetError::HandlerTableFull { port: 3 }));

        // Re-registering a present port still works when full.
        table.open(2, "d").unwrap();
    }

    #[test]
    fn test_restore_skips_closed_slot() {
        let mut table: UdpHandlerTable<&str> = UdpHandlerTable::new(1);
        table.open(9, "h").unwrap();
        let handler = table.take_handler(0).unwrap();
        table.close(9);
        table.restore_handler(0, 9, handler);
        assert!(table.take_handler(0).is_none());

        table.open(9, "h").unwrap();
        let handler = table.take_handler(0).unwrap();
        table.restore_handler(0, 9, handler);
        assert_eq!(table.take_handler(0), Some("h"));
    }
}
