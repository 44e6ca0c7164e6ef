//! Hardware address type

use crate::error::DiscoveryError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 6-octet MAC address.
///
/// Always rendered in canonical form: uppercase hex pairs joined by colons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Organizationally unique identifier, e.g. `AA:BB:CC`
    pub fn oui(&self) -> String {
        format!("{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for MacAddress {
    type Err = DiscoveryError;

    /// Accepts hyphen- or colon-delimited input. Octets may be one or two hex
    /// digits since BSD `arp` drops leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let delimiter = if s.contains('-') { '-' } else { ':' };

        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.split(delimiter) {
            if count == 6 || part.is_empty() || part.len() > 2 {
                return Err(DiscoveryError::InvalidMac(s.to_string()));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| DiscoveryError::InvalidMac(s.to_string()))?;
            count += 1;
        }

        if count != 6 {
            return Err(DiscoveryError::InvalidMac(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        f.pad(&format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        ))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
