//! NAT policy rules.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Rule, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_1, V9_0};
use crate::wire::{
    decode_targets, encode_targets, entry_node, expect_tag, flag, members, number, raw, raw_slot,
    store_raw, text, Emit, RawXml, Targets,
};
use crate::xpath::{entry_xpath, RulebaseScope};

const KIND: &str = "nat rule";

/// Source translation flavours.
pub const SAT_DYNAMIC_IP_AND_PORT: &str = "dynamic-ip-and-port";
pub const SAT_DYNAMIC_IP: &str = "dynamic-ip";
pub const SAT_STATIC_IP: &str = "static-ip";

/// Address choice under `dynamic-ip-and-port`.
pub const SAT_TRANSLATED_ADDRESS: &str = "translated-address";
pub const SAT_INTERFACE_ADDRESS: &str = "interface-address";

/// Destination translation flavours.
pub const DAT_STATIC: &str = "static";
pub const DAT_DYNAMIC: &str = "dynamic";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatRule {
    pub name: String,
    pub description: String,
    /// `ipv4`, `nat64` or `nptv6`.
    pub nat_type: String,
    pub source_zones: Vec<String>,
    pub destination_zone: String,
    pub to_interface: String,
    pub service: String,
    pub source_addresses: Vec<String>,
    pub destination_addresses: Vec<String>,
    /// One of the `SAT_*` flavours, or empty for no source translation.
    pub sat_type: String,
    /// `translated-address` or `interface-address` (dynamic-ip-and-port).
    pub sat_address_type: String,
    pub sat_translated_addresses: Vec<String>,
    pub sat_interface: String,
    pub sat_ip_address: String,
    pub sat_static_translated_address: String,
    pub sat_static_bi_directional: bool,
    /// `static`, `dynamic` (PAN-OS 8.1 and later) or empty.
    pub dat_type: String,
    pub dat_address: String,
    pub dat_port: u32,
    /// PAN-OS 8.1 and later, dynamic only.
    pub dat_dynamic_distribution: String,
    pub disabled: bool,
    pub tags: Vec<String>,
    pub targets: Targets,
    pub negate_target: bool,
    /// PAN-OS 9.0 and later; assigned by the device.
    pub uuid: String,
    /// PAN-OS 9.0 and later.
    pub group_tag: String,
    /// Unmodeled subtrees (`fallback` of dynamic-ip).
    pub raw: BTreeMap<String, String>,
}

impl Object for NatRule {
    const KIND: &'static str = KIND;
    type Location = RulebaseScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &RulebaseScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("nat".to_string());
        path.push("rules".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V9_0) {
            era::<EntryV3>()
        } else if version.gte(&V8_1) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

impl Rule for NatRule {
    const RULE_TYPE: &'static str = "nat";
}

#[derive(Debug, Default)]
struct SourceTranslation {
    kind: String,
    address_type: String,
    translated: Vec<String>,
    interface: String,
    ip: String,
    static_address: String,
    bi_directional: bool,
    fallback: Option<RawXml>,
}

impl SourceTranslation {
    fn specify(e: &NatRule) -> Result<Self, PangoError> {
        let mut sat = Self {
            kind: e.sat_type.clone(),
            fallback: raw_slot(&e.raw, "fallback")?,
            ..Self::default()
        };
        match e.sat_type.as_str() {
            "" => sat.fallback = None,
            SAT_DYNAMIC_IP_AND_PORT => {
                sat.fallback = None;
                match e.sat_address_type.as_str() {
                    SAT_TRANSLATED_ADDRESS | "" => {
                        sat.address_type = SAT_TRANSLATED_ADDRESS.to_string();
                        sat.translated = e.sat_translated_addresses.clone();
                    }
                    SAT_INTERFACE_ADDRESS => {
                        sat.address_type = SAT_INTERFACE_ADDRESS.to_string();
                        sat.interface = e.sat_interface.clone();
                        sat.ip = e.sat_ip_address.clone();
                    }
                    other => {
                        return Err(PangoError::validation(format!(
                            "nat rule {:?}: unknown source address type {other:?}",
                            e.name
                        )))
                    }
                }
            }
            SAT_DYNAMIC_IP => sat.translated = e.sat_translated_addresses.clone(),
            SAT_STATIC_IP => {
                sat.fallback = None;
                sat.static_address = e.sat_static_translated_address.clone();
                sat.bi_directional = e.sat_static_bi_directional;
            }
            other => {
                return Err(PangoError::validation(format!(
                    "nat rule {:?}: unknown source translation {other:?}",
                    e.name
                )))
            }
        }
        Ok(sat)
    }

    fn apply(self, e: &mut NatRule) {
        store_raw(&mut e.raw, "fallback", &self.fallback);
        e.sat_type = self.kind;
        e.sat_address_type = self.address_type;
        e.sat_translated_addresses = self.translated;
        e.sat_interface = self.interface;
        e.sat_ip_address = self.ip;
        e.sat_static_translated_address = self.static_address;
        e.sat_static_bi_directional = self.bi_directional;
    }

    fn decode(node: &XmlNode) -> Self {
        let Some(choice) = node.get_child("source-translation").and_then(|s| s.children.first())
        else {
            return Self::default();
        };
        let mut sat = Self {
            kind: choice.tag.clone(),
            ..Self::default()
        };
        match choice.tag.as_str() {
            SAT_DYNAMIC_IP_AND_PORT => {
                if let Some(iface) = choice.get_child(SAT_INTERFACE_ADDRESS) {
                    sat.address_type = SAT_INTERFACE_ADDRESS.to_string();
                    sat.interface = text(iface, &["interface"]);
                    sat.ip = text(iface, &["ip"]);
                } else {
                    sat.address_type = SAT_TRANSLATED_ADDRESS.to_string();
                    sat.translated = members(choice, &[SAT_TRANSLATED_ADDRESS]);
                }
            }
            SAT_DYNAMIC_IP => {
                sat.translated = members(choice, &[SAT_TRANSLATED_ADDRESS]);
                sat.fallback = raw(choice, &["fallback"]);
            }
            SAT_STATIC_IP => {
                sat.static_address = text(choice, &[SAT_TRANSLATED_ADDRESS]);
                sat.bi_directional = flag(choice, &["bi-directional"]);
            }
            _ => {}
        }
        sat
    }

    fn encode(&self) -> Option<XmlNode> {
        if self.kind.is_empty() {
            return None;
        }
        let mut choice = XmlNode::new(self.kind.as_str());
        match self.kind.as_str() {
            SAT_DYNAMIC_IP_AND_PORT if self.address_type == SAT_INTERFACE_ADDRESS => {
                let mut iface = XmlNode::new(SAT_INTERFACE_ADDRESS);
                iface.text_el("interface", &self.interface);
                iface.text_el("ip", &self.ip);
                choice.children.push(iface);
            }
            SAT_STATIC_IP => {
                choice.text_el(SAT_TRANSLATED_ADDRESS, &self.static_address);
                choice.flag_el("bi-directional", self.bi_directional);
            }
            _ => {
                choice.members_el(SAT_TRANSLATED_ADDRESS, &self.translated);
                choice.raw_el("fallback", &self.fallback);
            }
        }
        Some(XmlNode::new("source-translation").child(choice))
    }
}

/// PAN-OS before 8.1: static destination translation only.
struct EntryV1 {
    name: String,
    description: String,
    nat_type: String,
    from: Vec<String>,
    to: String,
    to_interface: String,
    service: String,
    source: Vec<String>,
    destination: Vec<String>,
    sat: SourceTranslation,
    dat_address: String,
    dat_port: u32,
    disabled: bool,
    tags: Vec<String>,
    targets: Targets,
    negate_target: bool,
}

impl EntryV1 {
    fn project(e: &NatRule) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            description: e.description.clone(),
            nat_type: e.nat_type.clone(),
            from: e.source_zones.clone(),
            to: e.destination_zone.clone(),
            to_interface: e.to_interface.clone(),
            service: e.service.clone(),
            source: e.source_addresses.clone(),
            destination: e.destination_addresses.clone(),
            sat: SourceTranslation::specify(e)?,
            dat_address: String::new(),
            dat_port: 0,
            disabled: e.disabled,
            tags: e.tags.clone(),
            targets: e.targets.clone(),
            negate_target: e.negate_target,
        })
    }

    fn dat_node(tag: &str, address: &str, port: u32) -> XmlNode {
        let mut dat = XmlNode::new(tag);
        dat.text_el("translated-address", address);
        dat.num_el("translated-port", port);
        dat
    }
}

impl Wire for EntryV1 {
    type Entry = NatRule;

    fn specify(e: &NatRule) -> Result<Self, PangoError> {
        let mut wire = Self::project(e)?;
        match e.dat_type.as_str() {
            "" => {}
            DAT_STATIC => {
                wire.dat_address = e.dat_address.clone();
                wire.dat_port = e.dat_port;
            }
            DAT_DYNAMIC => {
                return Err(PangoError::validation(format!(
                    "nat rule {:?}: dynamic destination translation requires PAN-OS 8.1",
                    e.name
                )))
            }
            other => {
                return Err(PangoError::validation(format!(
                    "nat rule {:?}: unknown destination translation {other:?}",
                    e.name
                )))
            }
        }
        Ok(wire)
    }

    fn normalize(self) -> NatRule {
        let mut e = NatRule {
            name: self.name,
            description: self.description,
            nat_type: self.nat_type,
            source_zones: self.from,
            destination_zone: self.to,
            to_interface: self.to_interface,
            service: self.service,
            source_addresses: self.source,
            destination_addresses: self.destination,
            disabled: self.disabled,
            tags: self.tags,
            targets: self.targets,
            negate_target: self.negate_target,
            ..NatRule::default()
        };
        if !self.dat_address.is_empty() || self.dat_port != 0 {
            e.dat_type = DAT_STATIC.to_string();
            e.dat_address = self.dat_address;
            e.dat_port = self.dat_port;
        }
        self.sat.apply(&mut e);
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let (targets, negate_target) = decode_targets(node.get_child("target"));
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            description: text(node, &["description"]),
            nat_type: text(node, &["nat-type"]),
            from: members(node, &["from"]),
            to: members(node, &["to"]).into_iter().next().unwrap_or_default(),
            to_interface: text(node, &["to-interface"]),
            service: text(node, &["service"]),
            source: members(node, &["source"]),
            destination: members(node, &["destination"]),
            sat: SourceTranslation::decode(node),
            dat_address: text(node, &["destination-translation", "translated-address"]),
            dat_port: number(
                node,
                &["destination-translation", "translated-port"],
                KIND,
            )?,
            disabled: flag(node, &["disabled"]),
            tags: members(node, &["tag"]),
            targets,
            negate_target,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.text_el("nat-type", &self.nat_type);
        node.members_el("from", &self.from);
        if !self.to.is_empty() {
            node.members_el("to", &[self.to.clone()]);
        }
        node.text_el("to-interface", &self.to_interface);
        node.text_el("service", &self.service);
        node.members_el("source", &self.source);
        node.members_el("destination", &self.destination);
        node.node_el(self.sat.encode());
        if !self.dat_address.is_empty() || self.dat_port != 0 {
            node.children.push(Self::dat_node(
                "destination-translation",
                &self.dat_address,
                self.dat_port,
            ));
        }
        node.flag_el("disabled", self.disabled);
        node.text_el("description", &self.description);
        node.members_el("tag", &self.tags);
        node.node_el(encode_targets(&self.targets, self.negate_target));
        node
    }
}

/// PAN-OS 8.1: dynamic destination translation.
struct EntryV2 {
    base: EntryV1,
    dynamic: Option<(String, u32, String)>,
}

impl Wire for EntryV2 {
    type Entry = NatRule;

    fn specify(e: &NatRule) -> Result<Self, PangoError> {
        if e.dat_type == DAT_DYNAMIC {
            return Ok(Self {
                base: EntryV1::project(e)?,
                dynamic: Some((
                    e.dat_address.clone(),
                    e.dat_port,
                    e.dat_dynamic_distribution.clone(),
                )),
            });
        }
        Ok(Self {
            base: EntryV1::specify(e)?,
            dynamic: None,
        })
    }

    fn normalize(self) -> NatRule {
        let mut e = self.base.normalize();
        if let Some((address, port, distribution)) = self.dynamic {
            e.dat_type = DAT_DYNAMIC.to_string();
            e.dat_address = address;
            e.dat_port = port;
            e.dat_dynamic_distribution = distribution;
        }
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        let dynamic = match node.get_child("dynamic-destination-translation") {
            Some(dat) => Some((
                text(dat, &["translated-address"]),
                number(dat, &["translated-port"], KIND)?,
                text(dat, &["distribution"]),
            )),
            None => None,
        };
        Ok(Self {
            base: EntryV1::decode(node)?,
            dynamic,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if let Some((address, port, distribution)) = &self.dynamic {
            let mut dat =
                EntryV1::dat_node("dynamic-destination-translation", address, *port);
            dat.text_el("distribution", distribution);
            node.children.push(dat);
        }
        node
    }
}

/// PAN-OS 9.0 and later: rule UUIDs and group tags.
struct EntryV3 {
    base: EntryV2,
    uuid: String,
    group_tag: String,
}

impl Wire for EntryV3 {
    type Entry = NatRule;

    fn specify(e: &NatRule) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2::specify(e)?,
            uuid: e.uuid.clone(),
            group_tag: e.group_tag.clone(),
        })
    }

    fn normalize(self) -> NatRule {
        NatRule {
            uuid: self.uuid,
            group_tag: self.group_tag,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2::decode(node)?,
            uuid: node.attribute("uuid").unwrap_or_default().to_string(),
            group_tag: text(node, &["group-tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if !self.uuid.is_empty() {
            node.attributes.insert("uuid".to_string(), self.uuid.clone());
        }
        node.text_el("group-tag", &self.group_tag);
        node
    }
}
