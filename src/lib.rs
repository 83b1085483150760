//! A small userspace IPv4 stack implementation in Rust
//!
//! This library provides the protocol logic between a link layer and UDP
//! applications:
//! - ARP resolution with a bounded cache and a single pending-send slot
//! - IPv4 receive validation, dispatch and send-side fragmentation
//! - ICMP echo replies and destination-unreachable errors
//! - UDP checksums and port demultiplexing
//!
//! All state lives in one [`NetStack`] value driven from a single thread;
//! frames go out through a [`Link`] and come in through [`NetStack::deliver`].

pub mod buf;
pub mod config;
pub mod error;
pub mod iface;
pub mod link;
pub mod network;
pub mod transport;

// Re-export commonly used types
pub use buf::PacketBuf;
pub use config::StackConfig;
pub use error::{NetError, Result};
pub use iface::{NetStack, UdpHandler};
pub use link::{CaptureLink, EtherType, Link, MacAddr, TapLink};
pub use network::icmp::{IcmpHeader, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
pub use network::ipv4::Ipv4Header;
pub use transport::udp::UdpHeader;
