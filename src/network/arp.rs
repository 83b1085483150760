//! ARP (Address Resolution Protocol), RFC 826
//!
//! Packet format and the bounded IP-to-MAC cache. Only the Ethernet/IPv4
//! profile is understood:
//!
//! ```text
//! [HW Type (2)][Proto Type (2)][HW Len (1)][Proto Len (1)][Opcode (2)]
//! [Sender MAC (6)][Sender IP (4)][Target MAC (6)][Target IP (4)]
//! ```
//!
//! The cache is a fixed array scanned linearly. Expired entries are only
//! reclaimed when the next mapping is written, never on lookup.

use crate::link::MacAddr;
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

pub const ARP_PACKET_LEN: usize = 28;

pub const ARP_HW_ETHERNET: u16 = 1;
pub const ARP_PROTO_IPV4: u16 = 0x0800;
pub const ARP_HW_LEN: u8 = 6;
pub const ARP_PROTO_LEN: u8 = 4;

pub const ARP_REQUEST: u16 = 1;
pub const ARP_REPLY: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub hw_type: u16,
    pub proto_type: u16,
    pub hw_len: u8,
    pub proto_len: u8,
    pub opcode: u16,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    fn ethernet_ipv4(opcode: u16) -> Self {
        ArpPacket {
            hw_type: ARP_HW_ETHERNET,
            proto_type: ARP_PROTO_IPV4,
            hw_len: ARP_HW_LEN,
            proto_len: ARP_PROTO_LEN,
            opcode,
            sender_mac: [0; 6],
            sender_ip: Ipv4Addr::UNSPECIFIED,
            target_mac: [0; 6],
            target_ip: Ipv4Addr::UNSPECIFIED,
        }
    }

    /// Who has `target_ip`? Tell `sender_ip`.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpPacket {
            sender_mac,
            sender_ip,
            target_ip,
            ..Self::ethernet_ipv4(ARP_REQUEST)
        }
    }

    /// Answer addressed back to the sender of `request`.
    pub fn reply_to(request: &ArpPacket, local_mac: MacAddr, local_ip: Ipv4Addr) -> Self {
        ArpPacket {
            sender_mac: local_mac,
            sender_ip: local_ip,
            target_mac: request.sender_mac,
            target_ip: request.sender_ip,
            ..Self::ethernet_ipv4(ARP_REPLY)
        }
    }

    /// Parse an ARP packet. Trailing bytes (link padding) are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ARP_PACKET_LEN {
            return None;
        }

        let mut sender_mac = [0u8; 6];
        let mut target_mac = [0u8; 6];
        sender_mac.copy_from_slice(&data[8..14]);
        target_mac.copy_from_slice(&data[18..24]);

        Some(ArpPacket {
            hw_type: BigEndian::read_u16(&data[0..2]),
            proto_type: BigEndian::read_u16(&data[2..4]),
            hw_len: data[4],
            proto_len: data[5],
            opcode: BigEndian::read_u16(&data[6..8]),
            sender_mac,
            sender_ip: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_mac,
            target_ip: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ARP_PACKET_LEN] {
        let mut bytes = [0u8; ARP_PACKET_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.hw_type);
        BigEndian::write_u16(&mut bytes[2..4], self.proto_type);
        bytes[4] = self.hw_len;
        bytes[5] = self.proto_len;
        BigEndian::write_u16(&mut bytes[6..8], self.opcode);
        bytes[8..14].copy_from_slice(&self.sender_mac);
        bytes[14..18].copy_from_slice(&self.sender_ip.octets());
        bytes[18..24].copy_from_slice(&self.target_mac);
        bytes[24..28].copy_from_slice(&self.target_ip.octets());
        bytes
    }

    /// True for a well-formed Ethernet/IPv4 request or reply.
    pub fn is_valid(&self) -> bool {
        self.hw_type == ARP_HW_ETHERNET
            && self.proto_type == ARP_PROTO_IPV4
            && self.hw_len == ARP_HW_LEN
            && self.proto_len == ARP_PROTO_LEN
            && (self.opcode == ARP_REQUEST || self.opcode == ARP_REPLY)
    }

    pub fn is_request(&self) -> bool {
        self.opcode == ARP_REQUEST
    }

    pub fn is_reply(&self) -> bool {
        self.opcode == ARP_REPLY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpState {
    Invalid,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// When the mapping was last written.
    pub refreshed: Instant,
    pub state: ArpState,
}

impl ArpEntry {
    fn invalid(now: Instant) -> Self {
        ArpEntry {
            ip: Ipv4Addr::UNSPECIFIED,
            mac: [0; 6],
            refreshed: now,
            state: ArpState::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state == ArpState::Valid
    }
}

/// Fixed-capacity IP-to-MAC table.
#[derive(Debug, Clone)]
pub struct ArpCache {
    entries: Vec<ArpEntry>,
    timeout: Duration,
}

impl ArpCache {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        let now = Instant::now();
        ArpCache {
            entries: vec![ArpEntry::invalid(now); capacity],
            timeout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ArpEntry] {
        &self.entries
    }

    /// Number of valid entries, stale or not.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate every entry.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.state = ArpState::Invalid;
        }
    }

    /// Learn `ip -> mac` now.
    pub fn update(&mut self, ip: Ipv4Addr, mac: MacAddr) {
        self.update_at(ip, mac, Instant::now());
    }

    /// Learn `ip -> mac` as of `now`.
    ///
    /// Entries older than the timeout are invalidated first. The mapping
    /// then goes into, in order of preference: the live entry already
    /// holding `ip`, the first invalid slot, or the slot with the oldest
    /// refresh time.
    pub fn update_at(&mut self, ip: Ipv4Addr, mac: MacAddr, now: Instant) {
        for entry in &mut self.entries {
            if entry.is_valid() && now.saturating_duration_since(entry.refreshed) > self.timeout {
                entry.state = ArpState::Invalid;
            }
        }

        let slot = self
            .entries
            .iter()
            .position(|e| e.is_valid() && e.ip == ip)
            .or_else(|| self.entries.iter().position(|e| !e.is_valid()))
            .or_else(|| {
                self.entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| e.refreshed)
                    .map(|(i, _)| i)
            });

        if let Some(i) = slot {
            self.entries[i] = ArpEntry {
                ip,
                mac,
                refreshed: now,
                state: ArpState::Valid,
            };
        }
    }

    /// MAC bound to `ip`, if any. Staleness is not checked here.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries
            .iter()
            .find(|e| e.is_valid() && e.ip == ip)
            .map(|e| e.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn mac(last: u8) -> MacAddr {
        [2, 0, 0, 0, 0, last]
    }

    #[test]
    fn test_packet_round_trip() {
        let request = ArpPacket::request(mac(1), ip(1), ip(2));
        let bytes = request.to_bytes();
        assert_eq!(&bytes[0..8], &[0, 1, 8, 0, 6, 4, 0, 1]);

        let parsed = ArpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, request);
        assert!(parsed.is_valid());
        assert!(parsed.is_request());
    }

    #[test]
    fn test_reply_targets_requester() {
        let request = ArpPacket::request(mac(2), ip(2), ip(1));
        let reply = ArpPacket::reply_to(&request, mac(1), ip(1));
        assert!(reply.is_reply());
        assert_eq!(reply.target_ip, ip(2));
        assert_eq!(reply.target_mac, mac(2));
        assert_eq!(reply.sender_ip, ip(1));
        assert_eq!(reply.sender_mac, mac(1));
    }

    #[test]
    fn test_invalid_profiles() {
        let good = ArpPacket::request(mac(1), ip(1), ip(2));

        let mut bad = good;
        bad.hw_type = 6;
        assert!(!bad.is_valid());

        let mut bad = good;
        bad.proto_type = 0x86DD;
        assert!(!bad.is_valid());

        let mut bad = good;
        bad.hw_len = 8;
        assert!(!bad.is_valid());

        let mut bad = good;
        bad.opcode = 3;
        assert!(!bad.is_valid());

        assert!(ArpPacket::from_bytes(&good.to_bytes()[..27]).is_none());
    }

    #[test]
    fn test_update_and_lookup() {
        let mut cache = ArpCache::new(4, Duration::from_secs(60));
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(ip(2)), None);

        cache.update(ip(2), mac(2));
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_update_same_ip_keeps_one_entry() {
        let mut cache = ArpCache::new(4, Duration::from_secs(60));
        let t0 = Instant::now();
        cache.update_at(ip(2), mac(2), t0);
        cache.update_at(ip(2), mac(9), t0 + Duration::from_secs(1));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(ip(2)), Some(mac(9)));
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let mut cache = ArpCache::new(3, Duration::from_secs(60));
        let t0 = Instant::now();
        cache.update_at(ip(2), mac(2), t0 + Duration::from_secs(2));
        cache.update_at(ip(3), mac(3), t0);
        cache.update_at(ip(4), mac(4), t0 + Duration::from_secs(1));

        cache.update_at(ip(5), mac(5), t0 + Duration::from_secs(3));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.lookup(ip(3)), None);
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
        assert_eq!(cache.lookup(ip(4)), Some(mac(4)));
        assert_eq!(cache.lookup(ip(5)), Some(mac(5)));
    }

    #[test]
    fn test_expired_entry_reclaimed_on_update() {
        let mut cache = ArpCache::new(2, Duration::from_secs(10));
        let t0 = Instant::now();
        cache.update_at(ip(2), mac(2), t0);
        cache.update_at(ip(3), mac(3), t0 + Duration::from_secs(8));

        // Stale but still answered until the next write.
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));

        cache.update_at(ip(4), mac(4), t0 + Duration::from_secs(11));
        assert_eq!(cache.lookup(ip(2)), None);
        assert_eq!(cache.lookup(ip(3)), Some(mac(3)));
        assert_eq!(cache.lookup(ip(4)), Some(mac(4)));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = ArpCache::new(4, Duration::from_secs(60));
        let t0 = Instant::now();
        for i in 0..40u8 {
            cache.update_at(ip(i % 9), mac(i), t0 + Duration::from_millis(i as u64));
            assert!(cache.len() <= cache.capacity());

            let mut seen: Vec<Ipv4Addr> = cache
                .entries()
                .iter()
                .filter(|e| e.is_valid())
                .map(|e| e.ip)
                .collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), total, "duplicate valid entry for one ip");
        }
    }

    #[test]
    fn test_clear() {
        let mut cache = ArpCache::new(2, Duration::from_secs(60));
        cache.update(ip(2), mac(2));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(ip(2)), None);
    }
}
