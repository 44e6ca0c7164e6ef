//! Output formatting for scan reports

use crate::discovery::{ScanReport, SsdpStatus, UpnpDeviceDescription};
use colored::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Indentation of the UPNP block under a device row
const DETAIL_INDENT: usize = 63;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Descriptions fetched for a report, keyed by location URL
pub type Descriptions = HashMap<String, UpnpDeviceDescription>;

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a ScanReport,
    #[serde(skip_serializing_if = "no_descriptions")]
    descriptions: &'a Descriptions,
}

fn no_descriptions(descriptions: &&Descriptions) -> bool {
    descriptions.is_empty()
}

/// Renders reports for the terminal or as JSON
pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render(&self, report: &ScanReport, descriptions: &Descriptions) -> crate::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(render_text(report, descriptions)),
            OutputFormat::Json => render_json(report, descriptions),
        }
    }
}

pub fn render_json(report: &ScanReport, descriptions: &Descriptions) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        report,
        descriptions,
    })?)
}

/// Hint printed when the multicast pass got nothing back
pub fn ssdp_hint(status: &SsdpStatus) -> Option<String> {
    match status {
        SsdpStatus::Responded | SsdpStatus::Skipped => None,
        SsdpStatus::Silent => Some(
            "No SSDP responses received. If running in a VM, check the network adapter mode (bridged, not NAT)."
                .to_string(),
        ),
        SsdpStatus::SendFailed(e) => Some(format!(
            "SSDP request could not be sent ({}). Check the network adapter mode and multicast routing.",
            e
        )),
    }
}

pub fn render_text(report: &ScanReport, descriptions: &Descriptions) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n{:<6}{:<19}{:<18}{:<20}{:<30}",
        "ID", "Interface", "IPv4 address", "MAC address", "Vendor"
    );
    let _ = writeln!(
        out,
        "{:<6}{:<19}{:<18}{:<20}{:<30}",
        "---", "---------------", "---------------", "-----------------", "-----------------------"
    );

    for device in &report.devices {
        let vendor = if device.vendor.is_known() {
            device.vendor.to_string().green()
        } else {
            device.vendor.to_string().red()
        };
        let _ = writeln!(
            out,
            "{}{}{}{}{}",
            format!("{:<6}", device.sequence).cyan(),
            format!("{:<19}", device.interface).white(),
            format!("{:<18}", device.ip).cyan(),
            format!("{:<20}", device.mac).yellow(),
            vendor
        );

        if device.upnp_locations.is_empty() {
            continue;
        }

        let pad = " ".repeat(DETAIL_INDENT);
        let _ = writeln!(out, "{}{}", pad, "UPNP Locations".white());
        let _ = writeln!(out, "{}{}", pad, "------------------------".white());
        let _ = writeln!(out, "{}{}", pad, device.upnp_locations.join(", ").magenta());

        // One description per device is enough for the table
        let described = device
            .upnp_locations
            .iter()
            .filter_map(|location| descriptions.get(location))
            .find(|desc| !desc.is_empty());

        if let Some(desc) = described {
            if let Some(server) = &desc.server {
                let _ = writeln!(out, "{}: {}", format!("{:>61}", "Server String").magenta(), server.green());
            }
            for (label, value) in desc.labelled_fields() {
                let _ = writeln!(out, "{}: {}", format!("{:>61}", label).magenta(), value.green());
            }
        }
    }

    if let Some(hint) = ssdp_hint(&report.ssdp_status) {
        let _ = writeln!(out, "\n{} {}", "[!]".bright_yellow(), hint);
    }

    out
}
