//! Helpers shared by the demos that drive a real TAP device.

pub mod network;
