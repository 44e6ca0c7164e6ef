//! lanscout - local network device discovery
//!
//! Devices are read from the operating system's ARP cache, attributed to a
//! vendor through their OUI, and correlated with the UPNP description
//! locations announced over SSDP.

pub mod config;
pub mod discovery;
pub mod error;
pub mod network;
pub mod output;
pub mod utils;
pub mod vendor;

// Re-export commonly used types
pub use config::DiscoveryConfig;
pub use discovery::{DeviceRecord, DeviceTable, DiscoveryEngine, ScanReport, SsdpStatus, UpnpDeviceDescription};
pub use error::{DiscoveryError, VendorError};
pub use network::MacAddress;
pub use vendor::{OuiResolver, Vendor, VendorResolver, VendorSource, UNKNOWN_VENDOR};

pub type Result<T> = std::result::Result<T, DiscoveryError>;
