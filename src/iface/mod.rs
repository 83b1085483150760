//! The stack itself
//!
//! This module ties the protocols together around one context object:
//! - `stack`: `NetStack`, its state and the inbound entry point
//! - `arp`: address resolution and the pending-send slot
//! - `ipv4`: datagram validation, dispatch and fragmentation
//! - `icmp`: echo replies and unreachable errors
//! - `udp`: checksums, port demultiplexing and sending

mod arp;
mod icmp;
mod ipv4;
pub mod stack;
mod udp;

// Re-export commonly used items
pub use stack::{NetStack, PendingSend, UdpHandler};
