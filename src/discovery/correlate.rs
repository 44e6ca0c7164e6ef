//! Merging ARP and UPNP observations
//!
//! The ARP table defines device identity. UPNP locations are attached to the
//! record with the same IPv4 address; hosts that were only seen over SSDP are
//! dropped.

use super::device::DeviceTable;
use super::ssdp::SsdpLocationSet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::net::Ipv4Addr;

static URL_HOST_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("valid IPv4 pattern")
});

/// Locations announced per host
pub type UpnpHostMap = HashMap<Ipv4Addr, Vec<String>>;

/// First IPv4 address appearing in a location URL
pub fn location_host(location: &str) -> Option<Ipv4Addr> {
    URL_HOST_IPV4
        .captures_iter(location)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .next()
}

/// Group SSDP locations by the IPv4 address in their URL
pub fn group_by_host(locations: &SsdpLocationSet) -> UpnpHostMap {
    let mut hosts = UpnpHostMap::new();
    for location in locations {
        match location_host(location) {
            Some(ip) => hosts.entry(ip).or_default().push(location.clone()),
            None => log::debug!("No IPv4 host in SSDP location {}", location),
        }
    }
    hosts
}

/// Attach UPNP locations to ARP records.
///
/// Every record's locations are replaced with the list for its address, or
/// cleared when the address never answered over SSDP.
pub fn correlate(arp: &DeviceTable, upnp: &UpnpHostMap) -> DeviceTable {
    let mut merged = arp.clone();
    for record in merged.iter_mut() {
        record.upnp_locations = upnp.get(&record.ip).cloned().unwrap_or_default();
    }

    let dropped = upnp.keys().filter(|ip| !arp.contains(ip)).count();
    if dropped > 0 {
        log::debug!("{} UPNP-only hosts not present in the ARP cache", dropped);
    }

    merged
}
