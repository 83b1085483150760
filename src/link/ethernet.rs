//! Ethernet II framing
//!
//! Only the 14-byte header is handled here; the FCS is added and checked by
//! the device.

use super::MacAddr;
use byteorder::{BigEndian, ByteOrder};

pub const ETHERNET_HEADER_LEN: usize = 14;

/// Smallest frame the wire accepts, header included and FCS excluded.
pub const ETHERNET_MIN_FRAME_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Parse an Ethernet header from the start of a frame.
    ///
    /// Returns None if the frame is too short
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return None;
        }

        let mut dst_mac = [0u8; 6];
        let mut src_mac = [0u8; 6];
        dst_mac.copy_from_slice(&data[0..6]);
        src_mac.copy_from_slice(&data[6..12]);

        Some(EthernetHeader {
            dst_mac,
            src_mac,
            ethertype: BigEndian::read_u16(&data[12..14]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ETHERNET_HEADER_LEN] {
        let mut bytes = [0u8; ETHERNET_HEADER_LEN];
        bytes[0..6].copy_from_slice(&self.dst_mac);
        bytes[6..12].copy_from_slice(&self.src_mac);
        BigEndian::write_u16(&mut bytes[12..14], self.ethertype);
        bytes
    }

    /// Build a complete frame around `payload`, zero-padded to the minimum frame size.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let len = (ETHERNET_HEADER_LEN + payload.len()).max(ETHERNET_MIN_FRAME_LEN);
        let mut frame = Vec::with_capacity(len);
        frame.extend_from_slice(&self.to_bytes());
        frame.extend_from_slice(payload);
        frame.resize(len, 0);
        frame
    }
}
