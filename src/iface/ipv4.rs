use crate::buf::PacketBuf;
use crate::error::{NetError, Result};
use crate::iface::stack::NetStack;
use crate::link::{EtherType, Link};
use crate::network::icmp::ICMP_CODE_PROTOCOL_UNREACHABLE;
use crate::network::ipv4::{
    protocol, Ipv4Header, DEFAULT_IHL, IPV4_HEADER_LEN, MAX_DATAGRAM_PAYLOAD,
};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<L: Link> NetStack<L> {
    /// Validate an inbound datagram and hand it to ICMP or UDP.
    ///
    /// Anything malformed, misaddressed or fragmented is dropped without a
    /// word to the sender. An unknown protocol is answered with ICMP
    /// protocol-unreachable.
    pub fn ip_receive(&mut self, mut buf: PacketBuf) -> Result<()> {
        let ip_header = match Ipv4Header::from_bytes(buf.as_slice()) {
            Some(ip_header) => ip_header,
            None => {
                trace!(len = buf.len(), "not an ipv4 datagram, dropped");
                return Ok(());
            }
        };

        if ip_header.ihl != DEFAULT_IHL {
            trace!(ihl = ip_header.ihl, "ipv4 options not supported, dropped");
            return Ok(());
        }

        let total_len = ip_header.total_len as usize;
        if total_len > self.config.mtu || total_len < IPV4_HEADER_LEN || total_len > buf.len() {
            trace!(total_len, received = buf.len(), "bad ipv4 total length, dropped");
            return Ok(());
        }

        if !ip_header.verify_checksum() {
            debug!(src = %ip_header.src_addr, "ipv4 header checksum mismatch, dropped");
            return Ok(());
        }

        if ip_header.dst_addr != self.config.ip {
            trace!(dst = %ip_header.dst_addr, "ipv4 datagram not for us, dropped");
            return Ok(());
        }

        if ip_header.is_fragment() {
            debug!(
                src = %ip_header.src_addr,
                id = ip_header.id,
                offset = ip_header.fragment_offset(),
                "ipv4 fragment received, reassembly not supported, dropped"
            );
            return Ok(());
        }

        // Link layers may pad short frames.
        buf.truncate(total_len);

        let src_ip = ip_header.src_addr;
        match ip_header.protocol {
            protocol::ICMP => {
                buf.remove_header(IPV4_HEADER_LEN);
                self.icmp_receive(buf, src_ip)
            }
            protocol::UDP => {
                buf.remove_header(IPV4_HEADER_LEN);
                self.udp_receive(buf, src_ip)
            }
            other => {
                debug!(protocol = other, src = %src_ip, "unsupported protocol");
                self.icmp_send_unreachable(buf.as_slice(), src_ip, ICMP_CODE_PROTOCOL_UNREACHABLE)
            }
        }
    }

    /// Send one datagram to `dst`, fragmenting it if it exceeds the MTU.
    ///
    /// All fragments share one id; the id counter advances once per call.
    pub fn ip_send(&mut self, buf: PacketBuf, dst: Ipv4Addr, protocol: u8) -> Result<()> {
        if buf.len() > MAX_DATAGRAM_PAYLOAD {
            return Err(NetError::PayloadTooLarge {
                len: buf.len(),
                max: MAX_DATAGRAM_PAYLOAD,
            });
        }

        let id = self.next_ip_id;
        self.next_ip_id = self.next_ip_id.wrapping_add(1);

        let fragment_size = self.config.max_fragment_payload();
        if buf.len() <= fragment_size {
            return self.ip_send_fragment(buf, dst, protocol, id, 0, false);
        }

        let chunks: Vec<&[u8]> = buf.as_slice().chunks(fragment_size).collect();
        let last = chunks.len() - 1;
        debug!(len = buf.len(), fragments = chunks.len(), id, "fragmenting datagram");
        for (i, chunk) in chunks.into_iter().enumerate() {
            let offset = (i * fragment_size / 8) as u16;
            self.ip_send_fragment(
                PacketBuf::from_payload(chunk),
                dst,
                protocol,
                id,
                offset,
                i != last,
            )?;
        }
        Ok(())
    }

    /// Prepend an IPv4 header to `buf` and pass it to ARP for delivery.
    ///
    /// `offset` is in 8-byte units.
    pub fn ip_send_fragment(
        &mut self,
        mut buf: PacketBuf,
        dst: Ipv4Addr,
        protocol: u8,
        id: u16,
        offset: u16,
        more_fragments: bool,
    ) -> Result<()> {
        let mut ip_header = Ipv4Header::fragment(
            protocol,
            self.config.ip,
            dst,
            buf.len() as u16,
            id,
            offset,
            more_fragments,
        );
        ip_header.update_checksum();

        buf.add_header(IPV4_HEADER_LEN)
            .copy_from_slice(&ip_header.to_bytes());
        self.arp_send(buf, dst, EtherType::Ipv4)
    }
}
