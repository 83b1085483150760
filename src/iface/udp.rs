use crate::buf::PacketBuf;
use crate::error::{NetError, Result};
use crate::iface::stack::NetStack;
use crate::link::Link;
use crate::network::checksum;
use crate::network::icmp::ICMP_CODE_PORT_UNREACHABLE;
use crate::network::ipv4::{protocol, IPV4_HEADER_LEN};
use crate::transport::udp::{
    checksum_field, set_checksum_field, PseudoHeader, UdpHeader, MAX_UDP_PAYLOAD,
    UDP_HEADER_LEN, UDP_PSEUDO_HEADER_LEN,
};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<L: Link> NetStack<L> {
    /// Pseudo-header checksum of the UDP datagram in `buf`.
    ///
    /// The pseudo-header is written into the headroom just in front of the
    /// datagram and removed again; the bytes it covered are put back, so
    /// `buf` leaves exactly as it came in. The checksum field itself is
    /// summed as-is.
    pub fn udp_checksum(&self, buf: &mut PacketBuf, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> u16 {
        let pseudo = PseudoHeader {
            src_addr: src_ip,
            dst_addr: dst_ip,
            udp_len: buf.len() as u16,
        };

        let header = buf.add_header(UDP_PSEUDO_HEADER_LEN);
        let mut saved = [0u8; UDP_PSEUDO_HEADER_LEN];
        saved.copy_from_slice(header);
        header.copy_from_slice(&pseudo.to_bytes());

        let sum = checksum(buf.as_slice());

        buf.as_mut_slice()[..UDP_PSEUDO_HEADER_LEN].copy_from_slice(&saved);
        buf.remove_header(UDP_PSEUDO_HEADER_LEN);
        sum
    }

    /// Handle an inbound UDP datagram (IP header already removed, but still
    /// in the buffer's headroom).
    pub fn udp_receive(&mut self, mut buf: PacketBuf, src_ip: Ipv4Addr) -> Result<()> {
        let udp_header = match UdpHeader::from_bytes(buf.as_slice()) {
            Some(header) => header,
            None => {
                trace!(len = buf.len(), "udp datagram too short, dropped");
                return Ok(());
            }
        };

        let length = udp_header.length as usize;
        if length < UDP_HEADER_LEN || length > buf.len() {
            trace!(length, received = buf.len(), "bad udp length, dropped");
            return Ok(());
        }
        buf.truncate(length);

        // Zero means the sender did not compute one.
        let received = udp_header.checksum;
        if received != 0 {
            set_checksum_field(buf.as_mut_slice(), 0);
            let computed = self.udp_checksum(&mut buf, src_ip, self.config.ip);
            set_checksum_field(buf.as_mut_slice(), received);

            if on_wire_checksum(computed) != received {
                debug!(%src_ip, port = udp_header.dst_port, "udp checksum mismatch, dropped");
                return Ok(());
            }
        }

        let index = match self.udp_handlers.find(udp_header.dst_port) {
            Some(index) => index,
            None => {
                debug!(%src_ip, port = udp_header.dst_port, "no handler for udp port");
                buf.add_header(IPV4_HEADER_LEN);
                return self.icmp_send_unreachable(buf.as_slice(), src_ip, ICMP_CODE_PORT_UNREACHABLE);
            }
        };

        buf.remove_header(UDP_HEADER_LEN);
        if let Some(mut handler) = self.udp_handlers.take_handler(index) {
            trace!(%src_ip, src_port = udp_header.src_port, len = buf.len(), "udp dispatch");
            handler(self, src_ip, udp_header.src_port, buf.as_slice());
            self.udp_handlers
                .restore_handler(index, udp_header.dst_port, handler);
        }
        Ok(())
    }

    /// Prepend a UDP header to `buf` and send it to `dst_ip:dst_port`.
    pub fn udp_send_buf(
        &mut self,
        mut buf: PacketBuf,
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
    ) -> Result<()> {
        if buf.len() > MAX_UDP_PAYLOAD {
            return Err(NetError::PayloadTooLarge {
                len: buf.len(),
                max: MAX_UDP_PAYLOAD,
            });
        }

        let udp_header = UdpHeader {
            src_port,
            dst_port,
            length: (buf.len() + UDP_HEADER_LEN) as u16,
            checksum: 0,
        };
        buf.add_header(UDP_HEADER_LEN)
            .copy_from_slice(&udp_header.to_bytes());

        let sum = self.udp_checksum(&mut buf, self.config.ip, dst_ip);
        set_checksum_field(buf.as_mut_slice(), on_wire_checksum(sum));
        debug_assert_eq!(checksum_field(buf.as_slice()), on_wire_checksum(sum));

        self.ip_send(buf, dst_ip, protocol::UDP)
    }

    /// Send `payload` from local `src_port` to `dst_ip:dst_port`.
    pub fn udp_send(
        &mut self,
        payload: &[u8],
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
    ) -> Result<()> {
        self.udp_send_buf(PacketBuf::from_payload(payload), src_port, dst_ip, dst_port)
    }

    /// Register `handler` for datagrams arriving on `port`, replacing any
    /// handler already registered there.
    pub fn udp_open<F>(&mut self, port: u16, handler: F) -> Result<()>
    where
        F: FnMut(&mut NetStack<L>, Ipv4Addr, u16, &[u8]) + 'static,
    {
        self.udp_handlers.open(port, Box::new(handler))?;
        debug!(port, "udp port opened");
        Ok(())
    }

    pub fn udp_close(&mut self, port: u16) {
        self.udp_handlers.close(port);
        debug!(port, "udp port closed");
    }

    pub fn udp_is_open(&self, port: u16) -> bool {
        self.udp_handlers.is_open(port)
    }
}

/// A computed checksum of zero goes on the wire as all ones, since zero
/// there means "no checksum".
fn on_wire_checksum(sum: u16) -> u16 {
    if sum == 0 {
        0xFFFF
    } else {
        sum
    }
}
