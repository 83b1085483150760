//! UDP echo server on a TAP device.
//!
//! ```sh
//! sudo cargo run --example udp_echo -- [tap0] [10.0.0.254/24] [10.0.0.1] [02:00:00:00:00:01]
//! ```
//!
//! The host side of the TAP device gets the CIDR address; the stack answers
//! ARP, ping and UDP port 7 as the given IP/MAC. Try:
//!
//! ```sh
//! ping 10.0.0.1
//! echo hi | nc -u 10.0.0.1 7
//! ```

mod utils;

use std::env;
use std::net::Ipv4Addr;

use toy_netstack::config::{parse_ipv4_cidr, parse_mac};
use toy_netstack::{NetStack, Result, StackConfig, TapLink};
use utils::network::configure_interface;

const ECHO_PORT: u16 = 7;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let tap_name = args.next().unwrap_or_else(|| "tap0".to_string());
    let host_cidr = args.next().unwrap_or_else(|| "10.0.0.254/24".to_string());
    let local_ip: Ipv4Addr = args
        .next()
        .unwrap_or_else(|| "10.0.0.1".to_string())
        .parse()
        .map_err(|_| toy_netstack::NetError::InvalidConfig("bad local ip".to_string()))?;
    let local_mac = parse_mac(&args.next().unwrap_or_else(|| "02:00:00:00:00:01".to_string()))?;

    // Validate early so a typo does not leave a half-configured device.
    parse_ipv4_cidr(&host_cidr)?;

    let link = TapLink::open(&tap_name, local_mac)?;
    configure_interface(link.name(), &host_cidr)?;

    let mut stack = NetStack::new(StackConfig::new(local_ip, local_mac), link)?;
    stack.init()?;
    stack.udp_open(ECHO_PORT, |stack, src_ip, src_port, payload| {
        println!("{} bytes from {}:{}, echoing", payload.len(), src_ip, src_port);
        if let Err(e) = stack.udp_send(payload, ECHO_PORT, src_ip, src_port) {
            eprintln!("Failed to echo: {}", e);
        }
    })?;

    println!("UDP echo listening on {}:{} via {}", local_ip, ECHO_PORT, tap_name);

    loop {
        let frame = stack.link_mut().recv_frame()?;
        if let Some((ethertype, payload)) = frame {
            stack.deliver(ethertype, &payload)?;
        }
    }
}
