//! Configuration module for the discovery engine

use crate::error::DiscoveryError;
use crate::network::ssdp_multicast_target;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the MAC address in `vendor_api_url`
pub const MAC_PLACEHOLDER: &str = "{mac}";

/// Main configuration structure for discovery runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Command and arguments used to list the ARP cache
    pub arp_command: Vec<String>,

    /// Vendor lookup endpoint, `{mac}` is replaced by the address
    pub vendor_api_url: String,

    /// Timeout for a single vendor lookup request in seconds
    pub vendor_timeout_secs: u64,

    /// Skip the remote vendor service and use only the offline database
    pub offline: bool,

    /// Tab-separated OUI database used when the remote lookup fails.
    ///
    /// Not bundled. Wireshark's `manuf` file
    /// (<https://www.wireshark.org/download/automated/data/manuf>) is the
    /// expected layout; when unset it is looked up at
    /// `<data_local_dir>/lanscout/manuf`.
    pub oui_database: Option<PathBuf>,

    /// Maximum concurrent vendor lookups
    pub vendor_concurrency: usize,

    /// Run the SSDP pass at all
    pub ssdp_enabled: bool,

    /// Destination of the M-SEARCH request
    pub ssdp_target: SocketAddr,

    /// Length of the SSDP receive window in milliseconds
    pub ssdp_window_ms: u64,

    /// MX value advertised in the M-SEARCH request
    pub ssdp_mx: u8,

    /// Timeout for fetching a UPNP device description in seconds
    pub upnp_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            arp_command: vec!["arp".to_string(), "-a".to_string()],
            vendor_api_url: "http://macvendors.co/api/{mac}".to_string(),
            vendor_timeout_secs: 3,
            offline: false,
            oui_database: None,
            vendor_concurrency: 8,
            ssdp_enabled: true,
            ssdp_target: ssdp_multicast_target(),
            ssdp_window_ms: 3000,
            ssdp_mx: 1,
            upnp_timeout_secs: 2,
        }
    }
}

impl DiscoveryConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Use only the offline vendor database
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the offline OUI database path
    pub fn with_oui_database<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.oui_database = Some(path.into());
        self
    }

    /// Set the vendor lookup URL template
    pub fn with_vendor_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.vendor_api_url = url.into();
        self
    }

    /// Set the SSDP target address
    pub fn with_ssdp_target(mut self, target: SocketAddr) -> Self {
        self.ssdp_target = target;
        self
    }

    /// Turn the SSDP pass on or off
    pub fn with_ssdp_enabled(mut self, enabled: bool) -> Self {
        self.ssdp_enabled = enabled;
        self
    }

    /// Set the SSDP receive window, saturating at `u64::MAX` milliseconds
    pub fn with_ssdp_window(mut self, window: Duration) -> Self {
        self.ssdp_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the ARP listing command
    pub fn with_arp_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arp_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_secs(self.vendor_timeout_secs)
    }

    pub fn ssdp_window(&self) -> Duration {
        Duration::from_millis(self.ssdp_window_ms)
    }

    pub fn upnp_timeout(&self) -> Duration {
        Duration::from_secs(self.upnp_timeout_secs)
    }

    /// Offline database location, falling back to the per-user data directory
    pub fn oui_database_path(&self) -> Option<PathBuf> {
        self.oui_database
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("lanscout").join("manuf")))
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            DiscoveryError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: DiscoveryConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `~/.lanscout.toml` if present
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let path = home_dir.join(".lanscout.toml");

        if path.exists() {
            match Self::from_toml_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.arp_command.is_empty() || self.arp_command[0].trim().is_empty() {
            return Err(DiscoveryError::ConfigError("ARP command cannot be empty".to_string()));
        }

        if !self.vendor_api_url.contains(MAC_PLACEHOLDER) {
            return Err(DiscoveryError::ConfigError(format!(
                "vendor_api_url must contain {}",
                MAC_PLACEHOLDER
            )));
        }

        if self.ssdp_window_ms == 0 {
            return Err(DiscoveryError::ConfigError("SSDP window must be greater than 0".to_string()));
        }

        if self.vendor_concurrency == 0 {
            return Err(DiscoveryError::ConfigError(
                "Vendor concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
