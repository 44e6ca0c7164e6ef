//! End-to-end discovery against local fixtures

mod common;

use common::{silent_responder, ssdp_reply, ssdp_responder, HttpFixture};
use lanscout::discovery::{SsdpDiscoverer, UpnpFetcher};
use lanscout::vendor::OfflineDatabase;
use lanscout::{DiscoveryConfig, DiscoveryEngine, OuiResolver, SsdpStatus};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DESCRIPTION_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
    <friendlyName>Living Room TV</friendlyName>
    <manufacturer>Acme</manufacturer>
    <manufacturerURL>http://acme.example</manufacturerURL>
    <modelName>Vision 55</modelName>
    <modelNumber>V55</modelNumber>
  </device>
</root>"#;

#[tokio::test]
async fn test_duplicate_ssdp_replies_collapse() {
    let location = "http://10.0.0.5:80/desc.xml";
    let target = ssdp_responder(vec![ssdp_reply(location), ssdp_reply(location)]).await;

    let discoverer = SsdpDiscoverer::new(target, Duration::from_millis(500), 1);
    let scan = discoverer.discover().await;

    assert_eq!(scan.status, SsdpStatus::Responded);
    assert_eq!(scan.responses, 2);
    assert_eq!(scan.locations.len(), 1);
    assert!(scan.locations.contains(location));
}

#[tokio::test]
async fn test_silent_network_respects_window() {
    let (_socket, target) = silent_responder().await;
    let window = Duration::from_millis(300);

    let start = Instant::now();
    let scan = SsdpDiscoverer::new(target, window, 1).discover().await;

    assert_eq!(scan.status, SsdpStatus::Silent);
    assert!(scan.locations.is_empty());
    assert!(start.elapsed() >= window);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_describe_keeps_server_header() {
    let server = HttpFixture::serve(
        "200 OK",
        &[("Content-Type", "text/xml"), ("Server", "Linux/4.9 UPnP/1.0 Acme/2.1")],
        DESCRIPTION_XML,
    )
    .await;
    let fetcher = UpnpFetcher::new(Duration::from_secs(2)).unwrap();

    let description = fetcher.describe(&server.url("/desc.xml")).await;
    assert_eq!(description.server.as_deref(), Some("Linux/4.9 UPnP/1.0 Acme/2.1"));
    assert_eq!(description.friendly_name, "Living Room TV");
    assert_eq!(description.manufacturer_url, "http://acme.example");
    assert_eq!(description.model_number, "V55");
    assert!(description.model_description.is_empty());
}

#[tokio::test]
async fn test_describe_invalid_xml_keeps_server_only() {
    let server = HttpFixture::serve("200 OK", &[("Server", "TinyHttpd/1.0")], "<root><device></root>").await;
    let fetcher = UpnpFetcher::new(Duration::from_secs(2)).unwrap();

    let description = fetcher.describe(&server.url("/desc.xml")).await;
    assert_eq!(description.server.as_deref(), Some("TinyHttpd/1.0"));
    assert!(description.friendly_name.is_empty());
    assert!(description.device_type.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_correlates_arp_and_ssdp() {
    let location = "http://10.0.0.5:80/desc.xml";
    let target = ssdp_responder(vec![
        ssdp_reply(location),
        ssdp_reply("http://10.0.0.99:49152/rootDesc.xml"),
    ])
    .await;

    let config = DiscoveryConfig::default()
        .with_offline(true)
        .with_ssdp_target(target)
        .with_ssdp_window(Duration::from_millis(500))
        .with_arp_command([
            "printf",
            "%s\\n",
            "? (10.0.0.1) at 11:22:33:44:55:66 [ether] on eth0",
            "? (10.0.0.5) at aa:bb:cc:dd:ee:ff [ether] on eth0",
            "? (10.0.0.7) at <incomplete> on eth0",
        ]);
    let resolver = OuiResolver::with_database(OfflineDatabase::parse("AA:BB:CC\tAcme\tAcme Networks\n"));
    let engine = DiscoveryEngine::with_resolver(config, Arc::new(resolver)).unwrap();

    let report = engine.scan().await;
    assert_eq!(report.ssdp_status, SsdpStatus::Responded);
    assert_eq!(report.ssdp_locations, 2);
    assert_eq!(report.devices.len(), 2);

    let ips: Vec<Ipv4Addr> = report.devices.iter().map(|d| d.ip).collect();
    assert_eq!(ips, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 5)]);

    let gateway = report.devices.get(&Ipv4Addr::new(10, 0, 0, 1)).unwrap();
    assert!(gateway.upnp_locations.is_empty());
    assert!(!gateway.vendor.is_known());

    let tv = report.devices.get(&Ipv4Addr::new(10, 0, 0, 5)).unwrap();
    assert_eq!(tv.sequence, 2);
    assert_eq!(tv.interface, "eth0");
    assert_eq!(tv.mac.to_string(), "AA:BB:CC:DD:EE:FF");
    assert_eq!(tv.vendor.name(), Some("Acme Networks"));
    assert_eq!(tv.upnp_locations, vec![location.to_string()]);

    // 10.0.0.99 only answered SSDP
    assert!(!report.devices.contains(&Ipv4Addr::new(10, 0, 0, 99)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_without_ssdp() {
    let config = DiscoveryConfig::default()
        .with_offline(true)
        .with_ssdp_enabled(false)
        .with_arp_command(["printf", "%s\\n", "? (192.168.1.1) at 0:1a:2b:3:4:5 on en0 ifscope [ethernet]"]);
    let resolver = OuiResolver::with_database(OfflineDatabase::parse(""));
    let engine = DiscoveryEngine::with_resolver(config, Arc::new(resolver)).unwrap();
    assert!(!engine.config().ssdp_enabled);

    let report = engine.scan().await;
    assert_eq!(report.ssdp_status, SsdpStatus::Skipped);
    assert_eq!(report.ssdp_locations, 0);

    let router = report.devices.get(&Ipv4Addr::new(192, 168, 1, 1)).unwrap();
    assert_eq!(router.mac.to_string(), "00:1A:2B:03:04:05");
    assert_eq!(router.interface, "en0");
}

#[tokio::test]
async fn test_engine_survives_missing_arp_utility() {
    let (_socket, target) = silent_responder().await;
    let config = DiscoveryConfig::default()
        .with_offline(true)
        .with_ssdp_target(target)
        .with_ssdp_window(Duration::from_millis(200))
        .with_arp_command(["lanscout-no-such-arp-binary"]);
    let engine = DiscoveryEngine::new(config).unwrap();

    let report = engine.scan().await;
    assert!(report.devices.is_empty());
    assert_eq!(report.ssdp_status, SsdpStatus::Silent);
}

#[test]
fn test_engine_rejects_invalid_config() {
    let config = DiscoveryConfig::default().with_vendor_api_url("http://example.invalid/lookup");
    assert!(DiscoveryEngine::new(config).is_err());
}
