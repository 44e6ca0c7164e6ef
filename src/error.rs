//! Error handling for the discovery engine
//!
//! Every component degrades per-item failures to a default value at its own
//! boundary. The variants below travel inside a component (for example between
//! the two vendor lookup stages) and only configuration errors reach callers.

use thiserror::Error;

/// Main error type for discovery operations
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Vendor lookup failed: {0}")]
    VendorError(#[from] VendorError),
}

/// Why a single vendor lookup stage produced no answer
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("remote lookup disabled")]
    RemoteDisabled,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response carries no company")]
    MissingCompany,

    #[error("offline database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("no offline record for {0}")]
    NoRecord(String),
}

impl From<toml::de::Error> for DiscoveryError {
    fn from(e: toml::de::Error) -> Self {
        DiscoveryError::ConfigError(e.to_string())
    }
}
