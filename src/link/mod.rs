//! Link layer collaborators
//!
//! The stack never touches a device directly. Everything it sends goes
//! through a [`Link`], which owns framing and physical transmission:
//! - `ethernet`: Ethernet II header encoding
//! - `tap`: a [`Link`] backed by a Linux TAP device
//! - `capture`: an in-memory [`Link`] that records frames

pub mod capture;
pub mod ethernet;
pub mod tap;

use std::io;

pub use capture::{CaptureLink, SentFrame};
pub use ethernet::EthernetHeader;
pub use tap::TapLink;

/// 48-bit hardware address.
pub type MacAddr = [u8; 6];

pub const BROADCAST_MAC: MacAddr = [0xFF; 6];

/// Payload type carried by a link frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EtherType {
    Ipv4 = 0x0800,
    Arp = 0x0806,
}

impl EtherType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0800 => Some(EtherType::Ipv4),
            0x0806 => Some(EtherType::Arp),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Outbound half of the link layer.
pub trait Link {
    /// Hand a fully formed network-layer payload to the link for delivery to `dest_mac`.
    fn transmit(&mut self, payload: &[u8], dest_mac: MacAddr, ethertype: EtherType)
        -> io::Result<()>;
}

/// Render a MAC address as `aa:bb:cc:dd:ee:ff`.
pub fn format_mac(mac: &MacAddr) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
