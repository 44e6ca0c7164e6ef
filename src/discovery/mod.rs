//! Device discovery and correlation
//!
//! Devices come from the operating system's ARP cache and are enriched with
//! the UPNP description locations they announce over SSDP.

pub mod arp;
pub mod correlate;
pub mod device;
pub mod engine;
pub mod ssdp;
pub mod upnp;

pub use arp::{ArpEntry, ArpTableParser};
pub use correlate::{correlate, group_by_host, UpnpHostMap};
pub use device::{DeviceRecord, DeviceTable};
pub use engine::{DiscoveryEngine, ScanReport};
pub use ssdp::{SsdpDiscoverer, SsdpLocationSet, SsdpScan, SsdpStatus};
pub use upnp::{UpnpDeviceDescription, UpnpFetcher};
