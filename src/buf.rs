//! Packet buffer with headroom for prepending headers without moving the payload.
//!
//! ```text
//! |<-- headroom -->|<-- packet (head..) -->|
//! 0              head                  data.len()
//! ```
//!
//! Each layer on the transmit path calls [`PacketBuf::add_header`] to claim
//! the bytes in front of the current start; the receive path walks the
//! other way with [`PacketBuf::remove_header`]. Bytes uncovered by
//! `remove_header` stay in the headroom, so a later `add_header` of the same
//! size gives the old header back.

use std::fmt;

/// Headroom reserved by [`PacketBuf::from_payload`].
///
/// Covers Ethernet (14) + IPv4 (20) + UDP (8) + UDP pseudo-header (12).
pub const HEADROOM: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct PacketBuf {
    data: Vec<u8>,
    head: usize,
}

impl PacketBuf {
    /// Build a buffer holding `payload` with [`HEADROOM`] zeroed bytes in front.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(HEADROOM + payload.len());
        data.resize(HEADROOM, 0);
        data.extend_from_slice(payload);
        PacketBuf {
            data,
            head: HEADROOM,
        }
    }

    /// Length of the packet, headroom excluded.
    pub fn len(&self) -> usize {
        self.data.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.head..]
    }

    /// Move the start of the packet `n` bytes backward and return the newly
    /// exposed bytes. Whatever was in the headroom is left in place; missing
    /// headroom is grown with zeros.
    pub fn add_header(&mut self, n: usize) -> &mut [u8] {
        if n > self.head {
            let extra = n - self.head;
            self.data.splice(0..0, std::iter::repeat(0).take(extra));
            self.head += extra;
        }
        self.head -= n;
        &mut self.data[self.head..self.head + n]
    }

    /// Move the start of the packet `n` bytes forward. Never moves past the end.
    pub fn remove_header(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "remove_header past end of packet");
        self.head += n.min(self.len());
    }

    /// Shorten the packet to `len` bytes. No effect if it is already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.data.truncate(self.head + len);
        }
    }
}

impl From<Vec<u8>> for PacketBuf {
    fn from(packet: Vec<u8>) -> Self {
        PacketBuf::from_payload(&packet)
    }
}

// Metadata only; payloads can be large.
impl fmt::Debug for PacketBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketBuf")
            .field("head", &self.head)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_header() {
        let mut buf = PacketBuf::from_payload(&[1, 2, 3]);
        assert_eq!(buf.len(), 3);

        buf.add_header(2).copy_from_slice(&[9, 8]);
        assert_eq!(buf.as_slice(), &[9, 8, 1, 2, 3]);

        buf.remove_header(2);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);

        // The old header is still sitting in the headroom.
        assert_eq!(buf.add_header(2), &[9, 8]);
    }

    #[test]
    fn test_add_header_grows_headroom() {
        let mut buf = PacketBuf::from_payload(&[7]);
        let header = buf.add_header(HEADROOM + 10);
        assert!(header.iter().all(|&b| b == 0));
        assert_eq!(buf.len(), HEADROOM + 11);
        assert_eq!(buf.as_slice().last(), Some(&7));
    }

    #[test]
    fn test_truncate() {
        let mut buf = PacketBuf::from_payload(&[1, 2, 3, 4]);
        buf.truncate(10);
        assert_eq!(buf.len(), 4);
        buf.truncate(2);
        assert_eq!(buf.as_slice(), &[1, 2]);
    }
}
