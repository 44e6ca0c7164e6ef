//! SSDP active discovery
//!
//! One M-SEARCH is sent and responses are read until a session-wide deadline.
//! The deadline is checked before every receive, so running out of time ends
//! the loop normally and is never reported as an I/O failure.

use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// Receive buffer for one SSDP response
const RECV_BUFFER_SIZE: usize = 2048;

/// Multicast TTL for the search request
const MULTICAST_TTL: u32 = 2;

/// Build the M-SEARCH request for `target`
pub fn search_request(target: SocketAddr, mx: u8) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: ssdp:all\r\n\
         \r\n",
        target, mx
    )
}

/// Value of the `LOCATION` header of an SSDP response, matched case-insensitively
pub fn extract_location(response: &str) -> Option<&str> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("location") {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Unique location URLs from one scan window, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsdpLocationSet {
    locations: Vec<String>,
    seen: HashSet<String>,
}

impl SsdpLocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, returning `false` if the exact string was already present
    pub fn insert(&mut self, location: impl Into<String>) -> bool {
        let location = location.into();
        if self.seen.contains(&location) {
            return false;
        }
        self.seen.insert(location.clone());
        self.locations.push(location);
        true
    }

    /// Record the location carried by a raw response payload, if any
    pub fn record_response(&mut self, payload: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(payload) else {
            return false;
        };
        match extract_location(text) {
            Some(location) => self.insert(location),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.locations.iter()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.seen.contains(location)
    }
}

impl<'a> IntoIterator for &'a SsdpLocationSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

impl FromIterator<String> for SsdpLocationSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = SsdpLocationSet::new();
        for location in iter {
            set.insert(location);
        }
        set
    }
}

/// How the multicast pass went
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum SsdpStatus {
    /// At least one datagram came back
    Responded,
    /// Nothing arrived before the deadline
    Silent,
    /// The request could not be sent
    SendFailed(String),
    /// Multicast discovery was turned off for this run
    Skipped,
}

impl SsdpStatus {
    /// True when the host appears to have no multicast connectivity at all
    pub fn no_connectivity(&self) -> bool {
        matches!(self, SsdpStatus::Silent | SsdpStatus::SendFailed(_))
    }
}

/// Result of one discovery pass
#[derive(Debug, Clone)]
pub struct SsdpScan {
    pub locations: SsdpLocationSet,
    pub status: SsdpStatus,
    pub responses: usize,
}

impl SsdpScan {
    pub fn skipped() -> Self {
        Self {
            locations: SsdpLocationSet::new(),
            status: SsdpStatus::Skipped,
            responses: 0,
        }
    }
}

/// Sends M-SEARCH requests and gathers LOCATION headers
#[derive(Debug, Clone)]
pub struct SsdpDiscoverer {
    target: SocketAddr,
    window: Duration,
    mx: u8,
}

impl SsdpDiscoverer {
    pub fn new(target: SocketAddr, window: Duration, mx: u8) -> Self {
        Self { target, window, mx }
    }

    fn open_socket() -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
        socket.set_nonblocking(true)?;
        let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        socket.bind(&bind.into())?;
        UdpSocket::from_std(socket.into())
    }

    /// Run one discovery pass. Never fails; transport problems are reported
    /// through [`SsdpStatus`].
    pub async fn discover(&self) -> SsdpScan {
        let mut scan = SsdpScan {
            locations: SsdpLocationSet::new(),
            status: SsdpStatus::Silent,
            responses: 0,
        };

        let socket = match Self::open_socket() {
            Ok(socket) => socket,
            Err(e) => {
                log::warn!("SSDP socket setup failed: {}", e);
                scan.status = SsdpStatus::SendFailed(e.to_string());
                return scan;
            }
        };

        let request = search_request(self.target, self.mx);
        if let Err(e) = socket.send_to(request.as_bytes(), self.target).await {
            log::warn!("SSDP M-SEARCH to {} failed: {}", self.target, e);
            scan.status = SsdpStatus::SendFailed(e.to_string());
            return scan;
        }

        let deadline = Instant::now() + self.window;
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            match tokio::time::timeout(deadline - now, socket.recv_from(&mut buf)).await {
                Ok(Ok((size, from))) => {
                    scan.responses += 1;
                    if scan.locations.record_response(&buf[..size]) {
                        log::debug!("SSDP location from {}", from);
                    }
                }
                Ok(Err(e)) => {
                    // ICMP errors surface here on some platforms; keep listening
                    log::debug!("SSDP receive error: {}", e);
                }
                Err(_) => break,
            }
        }

        if scan.responses > 0 {
            scan.status = SsdpStatus::Responded;
        }
        log::info!(
            "SSDP: {} responses, {} unique locations",
            scan.responses,
            scan.locations.len()
        );
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_format() {
        let request = search_request(crate::network::ssdp_multicast_target(), 1);
        assert_eq!(
            request,
            "M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nMAN: \"ssdp:discover\"\r\nMX: 1\r\nST: ssdp:all\r\n\r\n"
        );
    }

    #[test]
    fn test_extract_location_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\nLocation:http://192.168.1.1:5000/rootDesc.xml\r\nST: upnp:rootdevice\r\n\r\n";
        assert_eq!(
            extract_location(response),
            Some("http://192.168.1.1:5000/rootDesc.xml")
        );

        let lower = "HTTP/1.1 200 OK\r\nlocation: http://10.0.0.9/desc.xml\r\n\r\n";
        assert_eq!(extract_location(lower), Some("http://10.0.0.9/desc.xml"));
    }

    #[test]
    fn test_extract_location_missing() {
        assert_eq!(extract_location("HTTP/1.1 200 OK\r\nST: ssdp:all\r\n\r\n"), None);
        assert_eq!(extract_location("HTTP/1.1 200 OK\r\nLOCATION:   \r\n\r\n"), None);
    }

    #[test]
    fn test_duplicate_locations_collapse() {
        let packet = b"HTTP/1.1 200 OK\r\nLOCATION: http://10.0.0.9:80/desc.xml\r\n\r\n";
        let mut set = SsdpLocationSet::new();
        assert!(set.record_response(packet));
        assert!(!set.record_response(packet));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dedup_is_by_exact_string() {
        let mut set = SsdpLocationSet::new();
        set.insert("http://10.0.0.9:80/a.xml");
        set.insert("http://10.0.0.9:80/b.xml");
        set.insert("http://10.0.0.9:80/a.xml");
        let all: Vec<_> = set.iter().cloned().collect();
        assert_eq!(all, vec!["http://10.0.0.9:80/a.xml", "http://10.0.0.9:80/b.xml"]);
    }

    #[test]
    fn test_non_text_payload_ignored() {
        let mut set = SsdpLocationSet::new();
        assert!(!set.record_response(&[0xff, 0xfe, 0x00, 0x4c]));
        assert!(set.is_empty());
    }

    #[test]
    fn test_status_connectivity() {
        assert!(!SsdpStatus::Responded.no_connectivity());
        assert!(SsdpStatus::Silent.no_connectivity());
        assert!(SsdpStatus::SendFailed("unreachable".to_string()).no_connectivity());
        assert!(!SsdpStatus::Skipped.no_connectivity());
    }

    #[tokio::test]
    async fn test_unsendable_target_reports_send_failure() {
        // The search socket is IPv4 only
        let target: SocketAddr = "[::1]:1900".parse().unwrap();
        let window = Duration::from_secs(5);

        let start = std::time::Instant::now();
        let scan = SsdpDiscoverer::new(target, window, 1).discover().await;

        assert!(matches!(scan.status, SsdpStatus::SendFailed(_)));
        assert!(scan.status.no_connectivity());
        assert!(scan.locations.is_empty());
        assert_eq!(scan.responses, 0);
        assert!(start.elapsed() < window);
    }
}
