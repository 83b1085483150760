//! Two stacks in one process, wired back to back.
//!
//! ```sh
//! cargo run --example loopback
//! ```
//!
//! Host A sends a datagram to host B before knowing B's MAC, then a second
//! one large enough to be fragmented. Frames are shuttled between the two
//! in-memory links and printed as they go. No privileges needed.

use std::net::Ipv4Addr;

use toy_netstack::link::{format_mac, BROADCAST_MAC};
use toy_netstack::{CaptureLink, EtherType, Ipv4Header, MacAddr, NetStack, Result, StackConfig};

const A_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const A_MAC: MacAddr = [0x02, 0, 0, 0, 0, 0x01];
const B_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
const B_MAC: MacAddr = [0x02, 0, 0, 0, 0, 0x02];

/// Move frames from one stack to the other until both links are quiet.
fn settle(a: &mut NetStack<CaptureLink>, b: &mut NetStack<CaptureLink>) -> Result<()> {
    loop {
        let moved = shuttle("A", a, b)? + shuttle("B", b, a)?;
        if moved == 0 {
            return Ok(());
        }
    }
}

fn shuttle(
    name: &str,
    from: &mut NetStack<CaptureLink>,
    to: &mut NetStack<CaptureLink>,
) -> Result<usize> {
    let frames = from.link_mut().take_frames();
    for frame in &frames {
        match frame.ethertype {
            EtherType::Arp => println!(
                "{} -> {}  ARP  {} bytes",
                name,
                format_mac(&frame.dest_mac),
                frame.payload.len()
            ),
            EtherType::Ipv4 => {
                if let Some(header) = Ipv4Header::from_bytes(&frame.payload) {
                    println!(
                        "{} -> {}  IPv4 proto={} id={} offset={} mf={} len={}",
                        name,
                        format_mac(&frame.dest_mac),
                        header.protocol,
                        header.id,
                        header.fragment_offset(),
                        header.more_fragments(),
                        header.total_len
                    );
                }
            }
        }
        if frame.dest_mac == to.local_mac() || frame.dest_mac == BROADCAST_MAC {
            to.deliver(frame.ethertype.as_u16(), &frame.payload)?;
        }
    }
    Ok(frames.len())
}

fn main() -> Result<()> {
    let mut a = NetStack::new(StackConfig::new(A_IP, A_MAC), CaptureLink::new())?;
    let mut b = NetStack::new(StackConfig::new(B_IP, B_MAC), CaptureLink::new())?;
    // A announces itself, so B learns A's MAC; A still has to ask for B's.
    a.init()?;
    settle(&mut a, &mut b)?;

    b.udp_open(9000, |_, src_ip, src_port, payload| {
        println!(
            "B received {} bytes from {}:{}: {:?}",
            payload.len(),
            src_ip,
            src_port,
            String::from_utf8_lossy(payload)
        );
    })?;

    println!("\n-- small datagram, MAC not yet known --");
    a.udp_send(b"hello from A", 8000, B_IP, 9000)?;
    settle(&mut a, &mut b)?;

    println!("\n-- 3000-byte datagram, fragmented (B drops fragments) --");
    a.udp_send(&[b'x'; 3000], 8000, B_IP, 9000)?;
    settle(&mut a, &mut b)?;

    println!("\n-- datagram to a closed port --");
    a.udp_send(b"anyone?", 8000, B_IP, 9999)?;
    settle(&mut a, &mut b)?;

    println!("\n-- ping --");
    a.icmp_send_echo_request(B_IP, 1, 1, b"ping")?;
    settle(&mut a, &mut b)?;

    Ok(())
}
