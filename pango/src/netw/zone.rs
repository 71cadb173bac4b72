//! Security zones.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_0};
use crate::wire::{entry_node, expect_tag, flag, members, text, Emit};
use crate::xpath::{entry_xpath, VsysScope};

const KIND: &str = "zone";

pub const MODES: [&str; 6] = ["layer3", "layer2", "virtual-wire", "tap", "external", "tunnel"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub name: String,
    /// One of [`MODES`]; empty leaves the zone without a network type.
    pub mode: String,
    /// Unordered.
    pub interfaces: Vec<String>,
    pub zone_profile: String,
    pub log_setting: String,
    pub enable_user_id: bool,
    pub include_acls: Vec<String>,
    pub exclude_acls: Vec<String>,
    /// PAN-OS 8.0 and later.
    pub enable_packet_buffer_protection: bool,
}

impl Object for Zone {
    const KIND: &'static str = KIND;
    type Location = VsysScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &VsysScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix()?;
        path.push("zone".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V8_0) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

/// PAN-OS before 8.0.
struct EntryV1 {
    name: String,
    mode: String,
    interfaces: Vec<String>,
    zone_profile: String,
    log_setting: String,
    enable_user_id: bool,
    include_acls: Vec<String>,
    exclude_acls: Vec<String>,
}

impl Wire for EntryV1 {
    type Entry = Zone;

    fn specify(e: &Zone) -> Result<Self, PangoError> {
        if !e.mode.is_empty() && !MODES.contains(&e.mode.as_str()) {
            return Err(PangoError::validation(format!(
                "zone {:?}: unknown mode {:?}",
                e.name, e.mode
            )));
        }
        if e.mode == "tunnel" && !e.interfaces.is_empty() {
            return Err(PangoError::validation(format!(
                "zone {:?}: tunnel zones take no interfaces",
                e.name
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            mode: e.mode.clone(),
            interfaces: e.interfaces.clone(),
            zone_profile: e.zone_profile.clone(),
            log_setting: e.log_setting.clone(),
            enable_user_id: e.enable_user_id,
            include_acls: e.include_acls.clone(),
            exclude_acls: e.exclude_acls.clone(),
        })
    }

    fn normalize(self) -> Zone {
        Zone {
            name: self.name,
            mode: self.mode,
            interfaces: self.interfaces,
            zone_profile: self.zone_profile,
            log_setting: self.log_setting,
            enable_user_id: self.enable_user_id,
            include_acls: self.include_acls,
            exclude_acls: self.exclude_acls,
            enable_packet_buffer_protection: false,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let network = node.get_child("network");
        let mode = network
            .and_then(|n| n.children.iter().find(|c| MODES.contains(&c.tag.as_str())))
            .map(|m| m.tag.clone())
            .unwrap_or_default();
        let interfaces = network
            .map(|n| members(n, &[mode.as_str()]))
            .unwrap_or_default();
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            mode,
            interfaces,
            zone_profile: text(node, &["network", "zone-protection-profile"]),
            log_setting: text(node, &["network", "log-setting"]),
            enable_user_id: flag(node, &["enable-user-identification"]),
            include_acls: members(node, &["user-acl", "include-list"]),
            exclude_acls: members(node, &["user-acl", "exclude-list"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        let mut network = XmlNode::new("network");
        if !self.mode.is_empty() {
            let mut mode = XmlNode::new(self.mode.as_str());
            mode.children = self
                .interfaces
                .iter()
                .map(|i| XmlNode::with_text("member", i.as_str()))
                .collect();
            network.children.push(mode);
        }
        network.text_el("zone-protection-profile", &self.zone_profile);
        network.text_el("log-setting", &self.log_setting);
        if !network.children.is_empty() {
            node.children.push(network);
        }
        node.flag_el("enable-user-identification", self.enable_user_id);
        if !self.include_acls.is_empty() || !self.exclude_acls.is_empty() {
            let mut acl = XmlNode::new("user-acl");
            acl.members_el("include-list", &self.include_acls);
            acl.members_el("exclude-list", &self.exclude_acls);
            node.children.push(acl);
        }
        node
    }
}

/// PAN-OS 8.0 and later: packet buffer protection.
struct EntryV2 {
    base: EntryV1,
    packet_buffer_protection: bool,
}

impl Wire for EntryV2 {
    type Entry = Zone;

    fn specify(e: &Zone) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            packet_buffer_protection: e.enable_packet_buffer_protection,
        })
    }

    fn normalize(self) -> Zone {
        Zone {
            enable_packet_buffer_protection: self.packet_buffer_protection,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            packet_buffer_protection: flag(node, &["network", "enable-packet-buffer-protection"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if self.packet_buffer_protection {
            node.ensure_child_mut("network")
                .flag_el("enable-packet-buffer-protection", true);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Zone;
    use crate::codec::Object;
    use crate::version::{V7_1, V8_0};
    use crate::xpath::{join, TemplateRef, VsysScope};

    fn trust() -> Zone {
        Zone {
            name: "trust".to_string(),
            mode: "layer3".to_string(),
            interfaces: vec!["ethernet1/2".to_string(), "ethernet1/3".to_string()],
            enable_user_id: true,
            include_acls: vec!["10.0.0.0/8".to_string()],
            enable_packet_buffer_protection: true,
            ..Zone::default()
        }
    }

    #[test]
    fn interfaces_nest_under_the_mode() {
        let node = trust().specify(&V8_0).expect("specify");
        assert_eq!(
            node.get_child("network").map(ToString::to_string).as_deref(),
            Some("<network><layer3><member>ethernet1/2</member><member>ethernet1/3</member></layer3><enable-packet-buffer-protection>yes</enable-packet-buffer-protection></network>")
        );
        assert_eq!(Zone::normalize(&node, &V8_0).expect("normalize"), trust());
    }

    #[test]
    fn packet_buffer_protection_is_dropped_before_eight() {
        let node = trust().specify(&V7_1).expect("specify");
        assert!(node
            .find(&["network", "enable-packet-buffer-protection"])
            .is_none());
        let back = Zone::normalize(&node, &V7_1).expect("normalize");
        assert!(!back.enable_packet_buffer_protection);
        assert_eq!(back.interfaces, trust().interfaces);
    }

    #[test]
    fn template_vsys_path() {
        let loc = VsysScope::Template {
            template: TemplateRef::template("t1"),
            vsys: "vsys2".to_string(),
        };
        let path = Zone::xpath(&loc, &["trust".to_string()]).expect("xpath");
        assert_eq!(
            join(&path),
            "/config/devices/entry[@name='localhost.localdomain']/template/entry[@name='t1']/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys2']/zone/entry[@name='trust']"
        );
    }
}
