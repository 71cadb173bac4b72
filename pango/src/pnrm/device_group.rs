//! Panorama device groups.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{decode_devices, encode_devices, entry_node, expect_tag, text, Emit, Targets};
use crate::xpath::{device_prefix, entry_xpath};

const KIND: &str = "device group";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceGroup {
    pub name: String,
    pub description: String,
    /// Member firewalls: serial → vsys names (empty for every vsys).
    pub devices: Targets,
}

impl Object for DeviceGroup {
    const KIND: &'static str = KIND;
    type Location = ();

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(_loc: &(), names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = device_prefix();
        path.push("device-group".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

struct EntryV1(DeviceGroup);

impl Wire for EntryV1 {
    type Entry = DeviceGroup;

    fn specify(e: &DeviceGroup) -> Result<Self, PangoError> {
        if e.name == "shared" {
            return Err(PangoError::validation("\"shared\" is not a device group name"));
        }
        Ok(Self(e.clone()))
    }

    fn normalize(self) -> DeviceGroup {
        self.0
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self(DeviceGroup {
            name: node.attribute("name").unwrap_or_default().to_string(),
            description: text(node, &["description"]),
            devices: decode_devices(node.get_child("devices")),
        }))
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.0.name);
        node.text_el("description", &self.0.description);
        node.node_el(encode_devices(&self.0.devices));
        node
    }
}
