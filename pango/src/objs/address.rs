//! Address objects.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V9_0};
use crate::wire::{entry_node, expect_tag, members, text, Emit};
use crate::xpath::{entry_xpath, ObjectScope};

const KIND: &str = "address object";

/// What an address object resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressValue {
    IpNetmask(String),
    IpRange(String),
    Fqdn(String),
    /// PAN-OS 9.0 and later.
    IpWildcard(String),
}

impl AddressValue {
    /// The PAN-OS element name of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IpNetmask(_) => "ip-netmask",
            Self::IpRange(_) => "ip-range",
            Self::Fqdn(_) => "fqdn",
            Self::IpWildcard(_) => "ip-wildcard",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::IpNetmask(v) | Self::IpRange(v) | Self::Fqdn(v) | Self::IpWildcard(v) => v,
        }
    }

    /// Build from an element name and value.
    pub fn from_kind(kind: &str, value: impl Into<String>) -> Result<Self, PangoError> {
        let value = value.into();
        Ok(match kind {
            "ip-netmask" => Self::IpNetmask(value),
            "ip-range" => Self::IpRange(value),
            "fqdn" => Self::Fqdn(value),
            "ip-wildcard" => Self::IpWildcard(value),
            other => {
                return Err(PangoError::validation(format!(
                    "unknown address type {other:?}"
                )))
            }
        })
    }
}

impl Default for AddressValue {
    fn default() -> Self {
        Self::IpNetmask(String::new())
    }
}

/// A normalized address object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub name: String,
    pub value: AddressValue,
    pub description: String,
    pub tags: Vec<String>,
}

impl Object for Address {
    const KIND: &'static str = KIND;
    type Location = ObjectScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &ObjectScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("address".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V9_0) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

/// Elements shared by every era.
#[derive(Debug, Default)]
struct Fields {
    name: String,
    value: AddressValue,
    description: String,
    tags: Vec<String>,
}

impl Fields {
    fn from_entry(e: &Address) -> Self {
        Self {
            name: e.name.clone(),
            value: e.value.clone(),
            description: e.description.clone(),
            tags: e.tags.clone(),
        }
    }

    fn into_entry(self) -> Address {
        Address {
            name: self.name,
            value: self.value,
            description: self.description,
            tags: self.tags,
        }
    }

    fn decode(node: &XmlNode, kinds: &[&str]) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let value = node
            .children
            .iter()
            .find(|c| kinds.contains(&c.tag.as_str()))
            .map(|c| AddressValue::from_kind(&c.tag, c.text.clone().unwrap_or_default()))
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            value,
            description: text(node, &["description"]),
            tags: members(node, &["tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.text_el(self.value.kind(), self.value.value());
        node.text_el("description", &self.description);
        node.members_el("tag", &self.tags);
        node
    }
}

/// PAN-OS before 9.0: no wildcard masks.
struct EntryV1(Fields);

impl Wire for EntryV1 {
    type Entry = Address;

    fn specify(e: &Address) -> Result<Self, PangoError> {
        if let AddressValue::IpWildcard(_) = e.value {
            return Err(PangoError::validation(format!(
                "address {:?}: ip-wildcard requires PAN-OS 9.0 or later",
                e.name
            )));
        }
        Ok(Self(Fields::from_entry(e)))
    }

    fn normalize(self) -> Address {
        self.0.into_entry()
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Fields::decode(node, &["ip-netmask", "ip-range", "fqdn"]).map(Self)
    }

    fn encode(&self) -> XmlNode {
        self.0.encode()
    }
}

/// PAN-OS 9.0 and later.
struct EntryV2(Fields);

impl Wire for EntryV2 {
    type Entry = Address;

    fn specify(e: &Address) -> Result<Self, PangoError> {
        Ok(Self(Fields::from_entry(e)))
    }

    fn normalize(self) -> Address {
        self.0.into_entry()
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Fields::decode(node, &["ip-netmask", "ip-range", "fqdn", "ip-wildcard"]).map(Self)
    }

    fn encode(&self) -> XmlNode {
        self.0.encode()
    }
}
