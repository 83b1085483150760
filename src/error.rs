//! Error types shared by the whole stack.
//!
//! Malformed or misaddressed packets are never reported here: they are
//! dropped (and logged) by the layer that sees them. `NetError` covers the
//! failures a caller can actually act on.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    /// Every UDP handler slot is taken and the port is not already present.
    #[error("udp handler table is full, cannot open port {port}")]
    HandlerTableFull { port: u16 },

    /// Payload does not fit in a single IPv4 datagram.
    #[error("payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("invalid stack configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("invalid IPv4 CIDR: {0}")]
    InvalidCidr(String),

    /// The link layer failed to transmit or receive a frame.
    #[error("link error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
