//! Loopback interfaces.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::client::ImportKind;
use crate::codec::{era, ImportableObject, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{
    entry_names, entry_node, expect_tag, flag, number, raw, raw_slot, store_raw, text, Emit, EntryType,
    RawXml,
};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "loopback interface";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loopback {
    pub name: String,
    pub static_ips: Vec<String>,
    pub management_profile: String,
    pub mtu: u32,
    pub adjust_tcp_mss: bool,
    pub ipv4_mss_adjust: u32,
    pub ipv6_mss_adjust: u32,
    pub netflow_profile: String,
    pub comment: String,
    pub raw: BTreeMap<String, String>,
}

impl Object for Loopback {
    const KIND: &'static str = KIND;
    type Location = NetworkScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &NetworkScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.network_prefix()?;
        path.push("interface".to_string());
        path.push("loopback".to_string());
        path.push("units".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

impl ImportableObject for Loopback {
    const IMPORT_KIND: ImportKind = ImportKind::Interface;

    fn import_target(loc: &NetworkScope) -> (String, String) {
        loc.import_target()
    }
}

struct EntryV1 {
    name: String,
    ips: Vec<String>,
    ipv6: Option<RawXml>,
    management_profile: String,
    mtu: u32,
    adjust_tcp_mss: bool,
    ipv4_mss_adjust: u32,
    ipv6_mss_adjust: u32,
    netflow_profile: String,
    comment: String,
}

impl Wire for EntryV1 {
    type Entry = Loopback;

    fn specify(e: &Loopback) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            ips: e.static_ips.clone(),
            ipv6: raw_slot(&e.raw, "ipv6")?,
            management_profile: e.management_profile.clone(),
            mtu: e.mtu,
            adjust_tcp_mss: e.adjust_tcp_mss,
            ipv4_mss_adjust: e.ipv4_mss_adjust,
            ipv6_mss_adjust: e.ipv6_mss_adjust,
            netflow_profile: e.netflow_profile.clone(),
            comment: e.comment.clone(),
        })
    }

    fn normalize(self) -> Loopback {
        let mut raw = BTreeMap::new();
        store_raw(&mut raw, "ipv6", &self.ipv6);
        Loopback {
            name: self.name,
            static_ips: self.ips,
            management_profile: self.management_profile,
            mtu: self.mtu,
            adjust_tcp_mss: self.adjust_tcp_mss,
            ipv4_mss_adjust: self.ipv4_mss_adjust,
            ipv6_mss_adjust: self.ipv6_mss_adjust,
            netflow_profile: self.netflow_profile,
            comment: self.comment,
            raw,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            ips: entry_names(node, &["ip"]),
            ipv6: raw(node, &["ipv6"]),
            management_profile: text(node, &["interface-management-profile"]),
            mtu: number(node, &["mtu"], KIND)?,
            adjust_tcp_mss: flag(node, &["adjust-tcp-mss", "enable"]),
            ipv4_mss_adjust: number(node, &["adjust-tcp-mss", "ipv4-mss-adjustment"], KIND)?,
            ipv6_mss_adjust: number(node, &["adjust-tcp-mss", "ipv6-mss-adjustment"], KIND)?,
            netflow_profile: text(node, &["netflow-profile"]),
            comment: text(node, &["comment"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        if !self.ips.is_empty() {
            node.children.push(EntryType(self.ips.clone()).to_node("ip"));
        }
        node.raw_el("ipv6", &self.ipv6);
        node.text_el("interface-management-profile", &self.management_profile);
        node.num_el("mtu", self.mtu);
        if self.adjust_tcp_mss || self.ipv4_mss_adjust != 0 || self.ipv6_mss_adjust != 0 {
            let mut mss = XmlNode::new("adjust-tcp-mss");
            mss.flag_el("enable", self.adjust_tcp_mss);
            mss.num_el("ipv4-mss-adjustment", self.ipv4_mss_adjust);
            mss.num_el("ipv6-mss-adjustment", self.ipv6_mss_adjust);
            node.children.push(mss);
        }
        node.text_el("netflow-profile", &self.netflow_profile);
        node.text_el("comment", &self.comment);
        node
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::Loopback;
    use crate::codec::Object;
    use crate::version::{V7_0, V9_0};

    fn loopback() -> Loopback {
        let mut raw = BTreeMap::new();
        raw.insert(
            "ipv6".to_string(),
            "<enabled>yes</enabled><interface-id>EUI-64</interface-id>".to_string(),
        );
        Loopback {
            name: "loopback.7".to_string(),
            static_ips: vec!["10.255.0.7/32".to_string()],
            management_profile: "ping".to_string(),
            mtu: 1500,
            adjust_tcp_mss: true,
            ipv4_mss_adjust: 40,
            ipv6_mss_adjust: 60,
            comment: "router id".to_string(),
            raw,
            ..Loopback::default()
        }
    }

    #[test]
    fn round_trips_with_raw_ipv6() {
        for version in [V7_0, V9_0] {
            let node = loopback().specify(&version).expect("specify");
            assert_eq!(Loopback::normalize(&node, &version).expect("normalize"), loopback());
        }
        let node = loopback().specify(&V9_0).expect("specify");
        assert_eq!(node.get_text(&["ipv6", "interface-id"]), Some("EUI-64"));
        assert_eq!(node.get_text(&["adjust-tcp-mss", "enable"]), Some("yes"));
        assert_eq!(node.find(&["ip", "entry"]).and_then(|n| n.attribute("name")), Some("10.255.0.7/32"));
    }

    #[test]
    fn volatile_attributes_are_dropped_from_raw() {
        let node = panos_xml::parse(
            br#"<entry name="loopback.1"><ipv6 admin="alice" dirtyId="2"><enabled admin="alice" time="2024/01/01 10:00:00">no</enabled></ipv6></entry>"#,
        )
        .expect("parse");
        let e = Loopback::normalize(&node, &V9_0).expect("normalize");
        assert_eq!(e.raw.get("ipv6").map(String::as_str), Some("<enabled>no</enabled>"));
        assert!(e.static_ips.is_empty());
    }
}
