//! Discovery engine - main scan orchestrator

use super::arp::ArpTableParser;
use super::correlate::{correlate, group_by_host};
use super::device::DeviceTable;
use super::ssdp::{SsdpDiscoverer, SsdpScan, SsdpStatus};
use super::upnp::{UpnpDeviceDescription, UpnpFetcher};
use crate::config::DiscoveryConfig;
use crate::vendor::{OuiResolver, VendorResolver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub devices: DeviceTable,
    pub ssdp_status: SsdpStatus,
    /// Distinct SSDP locations seen, including hosts absent from the ARP cache
    pub ssdp_locations: usize,
}

/// Runs ARP acquisition, SSDP discovery and correlation
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    arp: ArpTableParser,
    ssdp: SsdpDiscoverer,
    upnp: UpnpFetcher,
}

impl DiscoveryEngine {
    /// Create an engine with the remote-first OUI resolver
    pub fn new(config: DiscoveryConfig) -> crate::Result<Self> {
        let resolver = OuiResolver::from_config(&config)?;
        Self::with_resolver(config, Arc::new(resolver))
    }

    /// Create an engine with a custom vendor resolver
    pub fn with_resolver(config: DiscoveryConfig, resolver: Arc<dyn VendorResolver>) -> crate::Result<Self> {
        config.validate()?;

        Ok(Self {
            arp: ArpTableParser::new(resolver, config.vendor_concurrency),
            ssdp: SsdpDiscoverer::new(config.ssdp_target, config.ssdp_window(), config.ssdp_mx),
            upnp: UpnpFetcher::new(config.upnp_timeout())?,
            config,
        })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Read the ARP cache and resolve vendors
    pub async fn scan_arp(&self) -> DeviceTable {
        self.arp.scan(&self.config.arp_command).await
    }

    /// Full scan: ARP first, then one SSDP pass, then correlation.
    ///
    /// Always completes; a missing ARP utility gives an empty table and absent
    /// multicast connectivity is reported through `ssdp_status`.
    pub async fn scan(&self) -> ScanReport {
        let started_at = Utc::now();

        log::info!("Scanning ARP cache with {:?}", self.config.arp_command);
        let arp_devices = self.scan_arp().await;

        let ssdp = if self.config.ssdp_enabled {
            log::info!("Sending SSDP M-SEARCH to {}", self.config.ssdp_target);
            self.ssdp.discover().await
        } else {
            SsdpScan::skipped()
        };
        if ssdp.status.no_connectivity() {
            log::warn!("No SSDP responses received ({:?})", ssdp.status);
        }

        let upnp_hosts = group_by_host(&ssdp.locations);
        let devices = correlate(&arp_devices, &upnp_hosts);

        ScanReport {
            started_at,
            devices,
            ssdp_status: ssdp.status,
            ssdp_locations: ssdp.locations.len(),
        }
    }

    /// Fetch the description behind one location. Not cached.
    pub async fn describe(&self, location: &str) -> UpnpDeviceDescription {
        self.upnp.describe(location).await
    }

    /// Fetch descriptions for several locations concurrently
    pub async fn describe_all<'a, I>(&self, locations: I) -> Vec<(String, UpnpDeviceDescription)>
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.upnp.describe_all(locations).await
    }
}
