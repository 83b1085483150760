use crate::buf::PacketBuf;
use crate::error::Result;
use crate::iface::stack::{NetStack, PendingSend};
use crate::link::{EtherType, Link, BROADCAST_MAC};
use crate::network::arp::ArpPacket;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<L: Link> NetStack<L> {
    /// Clear the cache and the pending slot, then announce our own address.
    pub fn arp_init(&mut self) -> Result<()> {
        self.arp_cache.clear();
        self.pending = None;
        self.arp_request(self.config.ip)
    }

    /// Broadcast a request for `target_ip`.
    pub fn arp_request(&mut self, target_ip: Ipv4Addr) -> Result<()> {
        let request = ArpPacket::request(self.config.mac, self.config.ip, target_ip);
        debug!(%target_ip, "arp request");
        self.link
            .transmit(&request.to_bytes(), BROADCAST_MAC, EtherType::Arp)?;
        Ok(())
    }

    /// Handle an inbound ARP packet.
    ///
    /// The sender is always learned first. A reply may then release the
    /// pending packet; otherwise a request for our address is answered.
    pub fn arp_receive(&mut self, data: &[u8]) -> Result<()> {
        let packet = match ArpPacket::from_bytes(data) {
            Some(packet) if packet.is_valid() => packet,
            _ => {
                trace!(len = data.len(), "malformed arp packet, dropped");
                return Ok(());
            }
        };

        self.arp_cache.update(packet.sender_ip, packet.sender_mac);

        if self.pending.is_some() && packet.is_reply() {
            let resolved = self
                .pending
                .as_ref()
                .and_then(|pending| self.arp_cache.lookup(pending.ip));
            if let Some(mac) = resolved {
                if let Some(pending) = self.pending.take() {
                    debug!(ip = %pending.ip, "arp resolved, releasing pending packet");
                    self.link
                        .transmit(pending.buf.as_slice(), mac, pending.ethertype)?;
                }
            }
        } else if packet.is_request() && packet.target_ip == self.config.ip {
            let reply = ArpPacket::reply_to(&packet, self.config.mac, self.config.ip);
            debug!(requester = %packet.sender_ip, "arp reply");
            self.link
                .transmit(&reply.to_bytes(), reply.target_mac, EtherType::Arp)?;
        }

        Ok(())
    }

    /// Deliver `buf` to the next hop `ip`, resolving its MAC first if needed.
    ///
    /// On a cache miss the packet is parked in the single pending slot,
    /// replacing (and losing) whatever was waiting there.
    pub fn arp_send(&mut self, buf: PacketBuf, ip: Ipv4Addr, ethertype: EtherType) -> Result<()> {
        if let Some(mac) = self.arp_cache.lookup(ip) {
            self.link.transmit(buf.as_slice(), mac, ethertype)?;
            return Ok(());
        }

        if let Some(old) = &self.pending {
            debug!(old = %old.ip, new = %ip, "pending arp slot overwritten");
        }
        self.pending = Some(PendingSend { buf, ip, ethertype });
        self.arp_request(ip)
    }
}
