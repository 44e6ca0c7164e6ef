//! Device records and the insertion-ordered device table

use crate::network::MacAddress;
use crate::vendor::Vendor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// One device observed in the ARP cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// 1-based position in ARP discovery order, stable within a run
    pub sequence: usize,
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
    pub vendor: Vendor,
    /// Interface name or address the entry was listed under, empty if unknown
    pub interface: String,
    /// SSDP location URLs announced by this address, first-seen order
    pub upnp_locations: Vec<String>,
}

impl DeviceRecord {
    pub fn new(sequence: usize, ip: Ipv4Addr, mac: MacAddress, interface: impl Into<String>) -> Self {
        Self {
            sequence,
            ip,
            mac,
            vendor: Vendor::Unknown,
            interface: interface.into(),
            upnp_locations: Vec::new(),
        }
    }
}

/// Devices keyed by IPv4 address.
///
/// Iteration follows first insertion of each address; replacing a record
/// keeps its slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceTable {
    records: Vec<DeviceRecord>,
    index: HashMap<Ipv4Addr, usize>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `record.ip`, returning the previous one
    pub fn upsert(&mut self, record: DeviceRecord) -> Option<DeviceRecord> {
        match self.index.get(&record.ip) {
            Some(&slot) => Some(std::mem::replace(&mut self.records[slot], record)),
            None => {
                self.index.insert(record.ip, self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, ip: &Ipv4Addr) -> Option<&DeviceRecord> {
        self.index.get(ip).map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, ip: &Ipv4Addr) -> Option<&mut DeviceRecord> {
        match self.index.get(ip) {
            Some(&slot) => Some(&mut self.records[slot]),
            None => None,
        }
    }

    pub fn contains(&self, ip: &Ipv4Addr) -> bool {
        self.index.contains_key(ip)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DeviceRecord> {
        self.records.iter_mut()
    }
}

impl<'a> IntoIterator for &'a DeviceTable {
    type Item = &'a DeviceRecord;
    type IntoIter = std::slice::Iter<'a, DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<DeviceRecord> for DeviceTable {
    fn from_iter<I: IntoIterator<Item = DeviceRecord>>(iter: I) -> Self {
        let mut table = DeviceTable::new();
        for record in iter {
            table.upsert(record);
        }
        table
    }
}

impl Serialize for DeviceTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DeviceTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<DeviceRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}
