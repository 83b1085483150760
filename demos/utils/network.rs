use std::io;
use std::process::Command;

/// Give the host side of `iface_name` an address and bring it up.
pub fn configure_interface(iface_name: &str, ip_cidr: &str) -> io::Result<()> {
    // Configure IP address: ip addr add <ip_cidr> dev <iface_name>
    let status = Command::new("ip")
        .args(["addr", "add", ip_cidr, "dev", iface_name])
        .status()?;

    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("failed to configure {} on {}", ip_cidr, iface_name),
        ));
    }

    // Bring interface up: ip link set up dev <iface_name>
    let status = Command::new("ip")
        .args(["link", "set", "up", "dev", iface_name])
        .status()?;

    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("failed to bring up {}", iface_name),
        ));
    }

    println!(
        "Interface {} configured with IP {} and brought up",
        iface_name, ip_cidr
    );
    Ok(())
}
