//! The stack context
//!
//! `NetStack` owns every piece of mutable protocol state (ARP cache, the
//! pending-send slot, UDP handler table, IP datagram id counter) together
//! with the link it transmits through. Processing is single-threaded and
//! run-to-completion: one call to [`NetStack::deliver`] handles a frame all
//! the way down to any frames it causes to be transmitted.
//!
//! The per-protocol operations live next to this file (`arp.rs`, `ipv4.rs`,
//! `icmp.rs`, `udp.rs`), each as its own `impl NetStack` block.

use crate::buf::PacketBuf;
use crate::config::StackConfig;
use crate::error::Result;
use crate::link::{EtherType, Link, MacAddr};
use crate::network::arp::ArpCache;
use crate::transport::udp::UdpHandlerTable;
use std::net::Ipv4Addr;
use tracing::trace;

/// Callback invoked for each datagram arriving on an open UDP port, with
/// the sender's address, the sender's port and the payload.
pub type UdpHandler<L> = Box<dyn FnMut(&mut NetStack<L>, Ipv4Addr, u16, &[u8])>;

/// An outbound packet parked until its next hop's MAC is known.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub buf: PacketBuf,
    pub ip: Ipv4Addr,
    pub ethertype: EtherType,
}

pub struct NetStack<L: Link> {
    pub(crate) config: StackConfig,
    pub(crate) link: L,
    pub(crate) arp_cache: ArpCache,
    /// Single slot: a newer unresolved send replaces an older one.
    pub(crate) pending: Option<PendingSend>,
    pub(crate) udp_handlers: UdpHandlerTable<UdpHandler<L>>,
    pub(crate) next_ip_id: u16,
}

impl<L: Link> NetStack<L> {
    /// Create a stack with empty tables. Nothing is transmitted until
    /// [`NetStack::init`] or the first send.
    pub fn new(config: StackConfig, link: L) -> Result<Self> {
        config.validate()?;
        Ok(NetStack {
            arp_cache: ArpCache::new(config.arp_capacity, config.arp_timeout),
            pending: None,
            udp_handlers: UdpHandlerTable::new(config.udp_capacity),
            next_ip_id: 0,
            config,
            link,
        })
    }

    /// Reset address resolution and announce ourselves on the link.
    pub fn init(&mut self) -> Result<()> {
        self.arp_init()
    }

    /// Inbound entry point: one frame payload, link header already stripped.
    pub fn deliver(&mut self, ethertype: u16, payload: &[u8]) -> Result<()> {
        match EtherType::from_u16(ethertype) {
            Some(EtherType::Arp) => self.arp_receive(payload),
            Some(EtherType::Ipv4) => self.ip_receive(PacketBuf::from_payload(payload)),
            None => {
                trace!(ethertype, "unsupported ethertype, dropped");
                Ok(())
            }
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn local_ip(&self) -> Ipv4Addr {
        self.config.ip
    }

    pub fn local_mac(&self) -> MacAddr {
        self.config.mac
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    pub fn arp_cache(&self) -> &ArpCache {
        &self.arp_cache
    }

    pub fn arp_cache_mut(&mut self) -> &mut ArpCache {
        &mut self.arp_cache
    }

    pub fn pending_send(&self) -> Option<&PendingSend> {
        self.pending.as_ref()
    }

    /// Id the next outbound datagram will carry.
    pub fn next_ip_id(&self) -> u16 {
        self.next_ip_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::CaptureLink;

    fn stack() -> NetStack<CaptureLink> {
        let config = StackConfig::new(Ipv4Addr::new(10, 0, 0, 1), [2, 0, 0, 0, 0, 1]);
        NetStack::new(config, CaptureLink::new()).unwrap()
    }

    #[test]
    fn test_new_stack_is_quiet_and_empty() {
        let stack = stack();
        assert!(stack.link().frames().is_empty());
        assert!(stack.arp_cache().is_empty());
        assert!(stack.pending_send().is_none());
        assert_eq!(stack.next_ip_id(), 0);
        assert_eq!(stack.local_ip(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = StackConfig::new(Ipv4Addr::new(10, 0, 0, 1), [0; 6]).with_mtu(20);
        assert!(NetStack::new(config, CaptureLink::new()).is_err());
    }

    #[test]
    fn test_deliver_ignores_unknown_ethertype() {
        let mut stack = stack();
        stack.deliver(0x86DD, &[0u8; 40]).unwrap();
        assert!(stack.link().frames().is_empty());
    }
}
