use crate::buf::PacketBuf;
use crate::error::Result;
use crate::iface::stack::NetStack;
use crate::link::Link;
use crate::network::icmp::{
    build_message, fill_checksum, IcmpHeader, ICMP_HEADER_LEN, ICMP_QUOTE_LEN,
    ICMP_TYPE_ECHO_REPLY,
};
use crate::network::ipv4::protocol;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<L: Link> NetStack<L> {
    /// Handle an inbound ICMP message (IP header already removed).
    ///
    /// Echo requests are answered with the same bytes turned into a reply;
    /// everything else is ignored.
    pub fn icmp_receive(&mut self, buf: PacketBuf, src_ip: Ipv4Addr) -> Result<()> {
        let icmp_header = match IcmpHeader::from_bytes(buf.as_slice()) {
            Some(header) => header,
            None => {
                trace!(len = buf.len(), "icmp message too short, dropped");
                return Ok(());
            }
        };

        if icmp_header.is_echo_request() {
            debug!(
                %src_ip,
                id = icmp_header.identifier(),
                seq = icmp_header.sequence(),
                "echo request, replying"
            );
            let mut reply = buf.as_slice().to_vec();
            reply[0] = ICMP_TYPE_ECHO_REPLY;
            reply[1] = 0;
            fill_checksum(&mut reply);
            return self.ip_send(PacketBuf::from(reply), src_ip, protocol::ICMP);
        }

        if icmp_header.is_echo_reply() {
            debug!(
                %src_ip,
                id = icmp_header.identifier(),
                seq = icmp_header.sequence(),
                "echo reply"
            );
        } else {
            trace!(
                %src_ip,
                msg_type = icmp_header.msg_type,
                code = icmp_header.msg_code,
                "unhandled icmp message"
            );
        }
        Ok(())
    }

    /// Report `original` (a full IPv4 datagram) as undeliverable to `dst`.
    ///
    /// The message quotes the datagram's IP header and first 8 payload
    /// bytes; shorter datagrams are zero-filled.
    pub fn icmp_send_unreachable(&mut self, original: &[u8], dst: Ipv4Addr, code: u8) -> Result<()> {
        let mut quote = [0u8; ICMP_QUOTE_LEN];
        let n = original.len().min(ICMP_QUOTE_LEN);
        quote[..n].copy_from_slice(&original[..n]);

        let message = build_message(&IcmpHeader::unreachable(code), &quote);
        debug_assert_eq!(message.len(), ICMP_HEADER_LEN + ICMP_QUOTE_LEN);
        debug!(%dst, code, "destination unreachable");
        self.ip_send(PacketBuf::from(message), dst, protocol::ICMP)
    }

    /// Send an echo request ("ping") to `dst`.
    pub fn icmp_send_echo_request(
        &mut self,
        dst: Ipv4Addr,
        identifier: u16,
        sequence: u16,
        payload: &[u8],
    ) -> Result<()> {
        let message = build_message(&IcmpHeader::echo_request(identifier, sequence), payload);
        self.ip_send(PacketBuf::from(message), dst, protocol::ICMP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;
    use crate::link::{CaptureLink, MacAddr};
    use crate::network::checksum;
    use crate::network::icmp::{
        ICMP_CODE_PORT_UNREACHABLE, ICMP_TYPE_DEST_UNREACHABLE, ICMP_TYPE_ECHO_REQUEST,
    };
    use crate::network::ipv4::{Ipv4Header, IPV4_HEADER_LEN};

    const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
    const PEER_MAC: MacAddr = [2, 0, 0, 0, 0, 2];

    fn stack() -> NetStack<CaptureLink> {
        let config = StackConfig::new(LOCAL_IP, [2, 0, 0, 0, 0, 1]);
        let mut stack = NetStack::new(config, CaptureLink::new()).unwrap();
        stack.arp_cache_mut().update(PEER_IP, PEER_MAC);
        stack
    }

    fn sent_icmp(stack: &NetStack<CaptureLink>) -> Vec<Vec<u8>> {
        stack
            .link()
            .frames()
            .iter()
            .map(|f| {
                let header = Ipv4Header::from_bytes(&f.payload).unwrap();
                assert_eq!(header.protocol, protocol::ICMP);
                f.payload[IPV4_HEADER_LEN..].to_vec()
            })
            .collect()
    }

    #[test]
    fn test_echo_request_gets_reply() {
        let mut stack = stack();
        let request = build_message(&IcmpHeader::echo_request(0x55, 3), b"abcdefgh");
        stack
            .icmp_receive(PacketBuf::from(request.clone()), PEER_IP)
            .unwrap();

        let sent = sent_icmp(&stack);
        assert_eq!(sent.len(), 1);
        let reply = &sent[0];
        assert_eq!(reply.len(), request.len());
        assert_eq!(reply[0], ICMP_TYPE_ECHO_REPLY);
        assert_eq!(reply[1], 0);
        assert_eq!(&reply[4..], &request[4..]);
        assert_eq!(checksum(reply), 0);

        let ip_header = Ipv4Header::from_bytes(&stack.link().frames()[0].payload).unwrap();
        assert_eq!(ip_header.dst_addr, PEER_IP);
    }

    #[test]
    fn test_odd_length_echo_reply_checksum() {
        let mut stack = stack();
        let request = build_message(&IcmpHeader::echo_request(1, 1), b"odd");
        stack.icmp_receive(PacketBuf::from(request), PEER_IP).unwrap();
        assert_eq!(checksum(&sent_icmp(&stack)[0]), 0);
    }

    #[test]
    fn test_other_messages_ignored() {
        let mut stack = stack();

        let mut nonzero_code = build_message(&IcmpHeader::echo_request(1, 1), b"x");
        nonzero_code[1] = 5;
        stack
            .icmp_receive(PacketBuf::from(nonzero_code), PEER_IP)
            .unwrap();

        let reply = build_message(
            &IcmpHeader {
                msg_type: ICMP_TYPE_ECHO_REPLY,
                ..IcmpHeader::echo_request(1, 1)
            },
            b"x",
        );
        stack.icmp_receive(PacketBuf::from(reply), PEER_IP).unwrap();

        stack
            .icmp_receive(PacketBuf::from_payload(&[ICMP_TYPE_ECHO_REQUEST, 0, 0]), PEER_IP)
            .unwrap();

        assert!(stack.link().frames().is_empty());
    }

    #[test]
    fn test_unreachable_is_36_bytes() {
        let mut stack = stack();
        let original: Vec<u8> = (0..60u8).collect();
        stack
            .icmp_send_unreachable(&original, PEER_IP, ICMP_CODE_PORT_UNREACHABLE)
            .unwrap();

        let sent = sent_icmp(&stack);
        let message = &sent[0];
        assert_eq!(message.len(), 36);
        assert_eq!(message[0], ICMP_TYPE_DEST_UNREACHABLE);
        assert_eq!(message[1], ICMP_CODE_PORT_UNREACHABLE);
        assert_eq!(&message[4..8], &[0, 0, 0, 0]);
        assert_eq!(&message[8..], &original[..28]);
        assert_eq!(checksum(message), 0);
    }

    #[test]
    fn test_unreachable_short_original_zero_filled() {
        let mut stack = stack();
        stack
            .icmp_send_unreachable(&[0xEE; 22], PEER_IP, ICMP_CODE_PORT_UNREACHABLE)
            .unwrap();

        let message = &sent_icmp(&stack)[0];
        assert_eq!(message.len(), 36);
        assert_eq!(&message[8..30], &[0xEE; 22]);
        assert_eq!(&message[30..], &[0; 6]);
    }

    #[test]
    fn test_echo_request_out() {
        let mut stack = stack();
        stack
            .icmp_send_echo_request(PEER_IP, 0x1234, 9, b"ping")
            .unwrap();

        let message = &sent_icmp(&stack)[0];
        let header = IcmpHeader::from_bytes(message).unwrap();
        assert!(header.is_echo_request());
        assert_eq!(header.identifier(), 0x1234);
        assert_eq!(header.sequence(), 9);
        assert_eq!(&message[8..], b"ping");
    }
}
