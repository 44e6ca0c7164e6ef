//! UPNP device description retrieval

use crate::error::DiscoveryError;
use futures::future::join_all;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Namespace of UPNP device description documents
pub const UPNP_DEVICE_NS: &str = "urn:schemas-upnp-org:device-1-0";

/// Fields read from `<root>/device/<field>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpnpDeviceDescription {
    /// `Server` response header
    pub server: Option<String>,
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    #[serde(rename = "manufacturerURL")]
    pub manufacturer_url: String,
    pub model_description: String,
    pub model_name: String,
    pub model_number: String,
}

impl UpnpDeviceDescription {
    /// True when neither the header nor any XML field was captured
    pub fn is_empty(&self) -> bool {
        self.server.is_none() && self.labelled_fields().iter().all(|(_, v)| v.is_empty())
    }

    /// Display labels paired with field values, in document order
    pub fn labelled_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("Device Type", self.device_type.as_str()),
            ("Friendly Name", self.friendly_name.as_str()),
            ("Manufacturer", self.manufacturer.as_str()),
            ("Manufacturer URL", self.manufacturer_url.as_str()),
            ("Model Description", self.model_description.as_str()),
            ("Model Name", self.model_name.as_str()),
            ("Model Number", self.model_number.as_str()),
        ]
    }

    fn field_mut(&mut self, local_name: &[u8]) -> Option<&mut String> {
        match local_name {
            b"deviceType" => Some(&mut self.device_type),
            b"friendlyName" => Some(&mut self.friendly_name),
            b"manufacturer" => Some(&mut self.manufacturer),
            b"manufacturerURL" => Some(&mut self.manufacturer_url),
            b"modelDescription" => Some(&mut self.model_description),
            b"modelName" => Some(&mut self.model_name),
            b"modelNumber" => Some(&mut self.model_number),
            _ => None,
        }
    }

    /// Fill the XML fields from a description document.
    ///
    /// Only direct `device` children of the root element are read, so embedded
    /// devices under `deviceList` are ignored. The first occurrence of a field
    /// wins.
    pub fn parse_xml(&mut self, xml: &str) -> Result<(), DiscoveryError> {
        let mut reader = NsReader::from_str(xml);
        reader.trim_text(true);

        // Per open element: whether it is in the UPNP device namespace, and its local name
        let mut path: Vec<(bool, Vec<u8>)> = Vec::new();
        let mut captured: Option<String> = None;
        let mut filled: Vec<Vec<u8>> = Vec::new();

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(e) => {
                    let in_ns = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == UPNP_DEVICE_NS.as_bytes());
                    path.push((in_ns, e.local_name().as_ref().to_vec()));
                    if is_field_path(&path) {
                        captured = Some(String::new());
                    }
                }
                Event::Empty(_) => {}
                Event::Text(t) => {
                    if let Some(buf) = captured.as_mut() {
                        if path.len() == 3 {
                            buf.push_str(&t.unescape()?);
                        }
                    }
                }
                Event::CData(c) => {
                    if let Some(buf) = captured.as_mut() {
                        if path.len() == 3 {
                            buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                        }
                    }
                }
                Event::End(_) => {
                    if path.len() == 3 {
                        if let Some(value) = captured.take() {
                            let name = &path[2].1;
                            if !filled.contains(name) {
                                if let Some(slot) = self.field_mut(name) {
                                    *slot = value.trim().to_string();
                                    filled.push(name.clone());
                                }
                            }
                        }
                    }
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }
}

fn is_field_path(path: &[(bool, Vec<u8>)]) -> bool {
    path.len() == 3 && path[1].0 && path[1].1 == b"device" && path[2].0
}

/// Fetches description documents announced over SSDP
#[derive(Debug, Clone)]
pub struct UpnpFetcher {
    client: reqwest::Client,
}

impl UpnpFetcher {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch and parse `location`.
    ///
    /// A failed request yields an empty description; a body that is not valid
    /// XML keeps the `Server` header and leaves all fields empty.
    pub async fn describe(&self, location: &str) -> UpnpDeviceDescription {
        let mut description = UpnpDeviceDescription::default();

        let response = match self.client.get(location).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("UPNP fetch {} failed: {}", location, e);
                return description;
            }
        };

        description.server = response
            .headers()
            .get(reqwest::header::SERVER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::debug!("UPNP body {} unreadable: {}", location, e);
                return description;
            }
        };

        let mut parsed = description.clone();
        match parsed.parse_xml(&body) {
            Ok(()) => parsed,
            Err(e) => {
                log::debug!("UPNP description {} is not valid XML: {}", location, e);
                description
            }
        }
    }

    /// Describe several locations concurrently, preserving input order
    pub async fn describe_all<'a, I>(&self, locations: I) -> Vec<(String, UpnpDeviceDescription)>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let tasks = locations.into_iter().map(|location| async move {
            (location.clone(), self.describe(location).await)
        });
        join_all(tasks).await
    }
}
