//! TAP device link
//!
//! Wraps a Linux TAP interface (layer 2, so ARP works) and does the Ethernet
//! framing the stack leaves to the link. Creating the device needs
//! CAP_NET_ADMIN.

use super::ethernet::{EthernetHeader, ETHERNET_HEADER_LEN};
use super::{EtherType, Link, MacAddr, BROADCAST_MAC};
use std::io;
use tracing::trace;
use tun_tap::{Iface, Mode};

/// MTU + Ethernet header + some slack for VLAN tags.
const RECV_BUF_LEN: usize = 1522;

pub struct TapLink {
    iface: Iface,
    mac: MacAddr,
    recv_buf: Vec<u8>,
}

impl TapLink {
    /// Open (or create) the TAP device `name`, answering as `mac`.
    pub fn open(name: &str, mac: MacAddr) -> io::Result<Self> {
        let iface = Iface::without_packet_info(name, Mode::Tap)?;
        Ok(TapLink {
            iface,
            mac,
            recv_buf: vec![0u8; RECV_BUF_LEN],
        })
    }

    pub fn name(&self) -> &str {
        self.iface.name()
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Block until a frame arrives and strip its Ethernet header.
    ///
    /// Returns `Ok(None)` for frames that are too short or addressed to
    /// someone else, otherwise the raw ethertype and the payload.
    pub fn recv_frame(&mut self) -> io::Result<Option<(u16, Vec<u8>)>> {
        let nbytes = self.iface.recv(&mut self.recv_buf)?;
        let frame = &self.recv_buf[..nbytes];

        let header = match EthernetHeader::from_bytes(frame) {
            Some(header) => header,
            None => {
                trace!(len = nbytes, "runt frame");
                return Ok(None);
            }
        };

        if header.dst_mac != self.mac && header.dst_mac != BROADCAST_MAC {
            return Ok(None);
        }

        Ok(Some((
            header.ethertype,
            frame[ETHERNET_HEADER_LEN..].to_vec(),
        )))
    }
}

impl Link for TapLink {
    fn transmit(
        &mut self,
        payload: &[u8],
        dest_mac: MacAddr,
        ethertype: EtherType,
    ) -> io::Result<()> {
        let header = EthernetHeader {
            dst_mac: dest_mac,
            src_mac: self.mac,
            ethertype: ethertype.as_u16(),
        };
        let frame = header.frame(payload);
        self.iface.send(&frame)?;
        trace!(len = frame.len(), ?ethertype, "frame sent");
        Ok(())
    }
}
