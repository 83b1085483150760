//! In-memory link that keeps every transmitted frame.
//!
//! Useful for tests and for wiring two stacks together in one process:
//! drain one side with [`CaptureLink::take_frames`] and feed the payloads to
//! the other side's `deliver`.

use super::{EtherType, Link, MacAddr};
use std::io;

/// One frame handed to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub payload: Vec<u8>,
    pub dest_mac: MacAddr,
    pub ethertype: EtherType,
}

#[derive(Debug, Default)]
pub struct CaptureLink {
    frames: Vec<SentFrame>,
}

impl CaptureLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[SentFrame] {
        &self.frames
    }

    /// Remove and return everything transmitted so far.
    pub fn take_frames(&mut self) -> Vec<SentFrame> {
        std::mem::take(&mut self.frames)
    }
}

impl Link for CaptureLink {
    fn transmit(
        &mut self,
        payload: &[u8],
        dest_mac: MacAddr,
        ethertype: EtherType,
    ) -> io::Result<()> {
        self.frames.push(SentFrame {
            payload: payload.to_vec(),
            dest_mac,
            ethertype,
        });
        Ok(())
    }
}
