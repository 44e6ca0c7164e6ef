//! Network primitives shared by the discovery components

pub mod mac;

pub use mac::MacAddress;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// SSDP multicast group
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// SSDP port
pub const SSDP_PORT: u16 = 1900;

/// Default destination for M-SEARCH requests
pub fn ssdp_multicast_target() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT))
}
