//! ARP cache acquisition and parsing
//!
//! Three listing dialects are understood:
//!
//! * Windows `arp -a`: an `Interface: 192.168.1.10 --- 0xb` header followed by
//!   `192.168.1.1    aa-bb-cc-dd-ee-ff    dynamic` rows.
//! * BSD / macOS and Linux net-tools `arp -a`: one self-contained row per entry,
//!   `? (192.168.1.1) at aa:bb:cc:dd:ee:ff [ether] on eth0`.
//! * iproute2 `ip neigh`: `192.168.1.1 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE`.

use super::device::{DeviceRecord, DeviceTable};
use crate::network::MacAddress;
use crate::vendor::VendorResolver;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;

static INTERFACE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Interface:\s+(.+?)\s+---").expect("valid interface header pattern"));

static IPV4_ADDR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").expect("valid IPv4 pattern")
});

static MAC_ADDR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9A-Fa-f]{1,2}(?:[:-][0-9A-Fa-f]{1,2}){5})\b").expect("valid MAC pattern")
});

static ENTRY_INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bat\s+\S+(?:\s+\S+)*?\s+on\s+(\S+)").expect("valid entry interface pattern")
});

static NEIGH_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdev\s+(\S+)").expect("valid neighbour interface pattern"));

/// One matching row of ARP output, before deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub sequence: usize,
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
    pub interface: String,
}

/// Interface named by a header line, if `line` is one
pub fn interface_header(line: &str) -> Option<&str> {
    INTERFACE_HEADER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Interface embedded in a self-contained entry row
fn entry_interface(line: &str) -> Option<&str> {
    ENTRY_INTERFACE
        .captures(line)
        .or_else(|| NEIGH_INTERFACE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// IP and MAC of an entry row
fn entry_addresses(line: &str) -> Option<(Ipv4Addr, MacAddress)> {
    let ip = IPV4_ADDR.captures(line)?.get(1)?.as_str().parse().ok()?;
    let mac = MAC_ADDR.captures(line)?.get(1)?.as_str().parse().ok()?;
    Some((ip, mac))
}

/// Scan ARP output lines in order, returning every entry row.
///
/// The entry counter starts at 1 and counts every matching row, including
/// rows for an address that was already seen.
pub fn parse_entries<I, S>(lines: I) -> Vec<ArpEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut current_interface = String::new();

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(iface) = interface_header(line) {
            current_interface = iface.to_string();
            continue;
        }

        let Some((ip, mac)) = entry_addresses(line) else {
            continue;
        };

        let interface = entry_interface(line)
            .map(str::to_string)
            .unwrap_or_else(|| current_interface.clone());

        entries.push(ArpEntry {
            sequence: entries.len() + 1,
            ip,
            mac,
            interface,
        });
    }

    entries
}

/// Collapse entries into a table keyed by IP. The last entry for an address
/// wins; the table keeps the position where the address first appeared.
pub fn collapse_entries(entries: Vec<ArpEntry>) -> DeviceTable {
    entries
        .into_iter()
        .map(|entry| DeviceRecord::new(entry.sequence, entry.ip, entry.mac, entry.interface))
        .collect()
}

/// Run the platform ARP listing and return its trimmed output lines.
///
/// Standard output and standard error are concatenated. When the command
/// cannot be started the result is empty.
pub async fn read_arp_cache(command: &[String]) -> Vec<String> {
    let Some((program, args)) = command.split_first() else {
        return Vec::new();
    };

    let output = match Command::new(program).args(args).output().await {
        Ok(output) => output,
        Err(e) => {
            log::warn!("ARP listing unavailable ({}): {}", program, e);
            return Vec::new();
        }
    };

    if !output.status.success() {
        log::debug!("{} exited with {}", program, output.status);
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    text.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Turns ARP output into vendor-attributed device records
pub struct ArpTableParser {
    resolver: Arc<dyn VendorResolver>,
    concurrency: usize,
}

impl ArpTableParser {
    pub fn new(resolver: Arc<dyn VendorResolver>, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Parse lines and resolve the vendor of every surviving record.
    ///
    /// Lookups run concurrently up to the configured limit and are written
    /// back in table order once all of them finished.
    pub async fn parse<I, S>(&self, lines: I) -> DeviceTable
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = collapse_entries(parse_entries(lines));
        if table.is_empty() {
            return table;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let lookups = table.iter().map(|record| {
            let semaphore = Arc::clone(&semaphore);
            let resolver = Arc::clone(&self.resolver);
            let mac = record.mac;
            async move {
                let _permit = semaphore.acquire().await.ok();
                resolver.resolve(&mac).await
            }
        });
        let vendors = join_all(lookups).await;

        for (record, vendor) in table.iter_mut().zip(vendors) {
            record.vendor = vendor;
        }

        log::info!("ARP cache yielded {} devices", table.len());
        table
    }

    /// Read the ARP cache with `command` and parse it
    pub async fn scan(&self, command: &[String]) -> DeviceTable {
        let lines = read_arp_cache(command).await;
        self.parse(lines).await
    }
}
