//! Tunnel interfaces.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::client::ImportKind;
use crate::codec::{era, ImportableObject, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{
    entry_names, entry_node, expect_tag, number, raw, raw_slot, store_raw, text, Emit, EntryType, RawXml,
};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "tunnel interface";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunnel {
    pub name: String,
    pub static_ips: Vec<String>,
    pub management_profile: String,
    pub mtu: u32,
    pub netflow_profile: String,
    pub comment: String,
    pub raw: BTreeMap<String, String>,
}

impl Object for Tunnel {
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
        path.push("tunnel".to_string());
        path.push("units".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<EntryV1>()
    }
}

impl ImportableObject for Tunnel {
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
    netflow_profile: String,
    comment: String,
}

impl Wire for EntryV1 {
    type Entry = Tunnel;

    fn specify(e: &Tunnel) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            ips: e.static_ips.clone(),
            ipv6: raw_slot(&e.raw, "ipv6")?,
            management_profile: e.management_profile.clone(),
            mtu: e.mtu,
            netflow_profile: e.netflow_profile.clone(),
            comment: e.comment.clone(),
        })
    }

    fn normalize(self) -> Tunnel {
        let mut raw = BTreeMap::new();
        store_raw(&mut raw, "ipv6", &self.ipv6);
        Tunnel {
            name: self.name,
            static_ips: self.ips,
            management_profile: self.management_profile,
            mtu: self.mtu,
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
        node.text_el("netflow-profile", &self.netflow_profile);
        node.text_el("comment", &self.comment);
        node
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::Tunnel;
    use crate::codec::Object;
    use crate::version::V9_0;

    #[test]
    fn ipv6_block_is_carried_raw() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "ipv6".to_string(),
            "<enabled>yes</enabled><interface-id>EUI-64</interface-id>".to_string(),
        );
        let e = Tunnel {
            name: "tunnel.7".to_string(),
            static_ips: vec!["169.254.0.1/30".to_string()],
            mtu: 1400,
            raw,
            ..Tunnel::default()
        };
        let node = e.specify(&V9_0).expect("specify");
        assert_eq!(node.get_text(&["ipv6", "interface-id"]), Some("EUI-64"));
        assert_eq!(Tunnel::normalize(&node, &V9_0).expect("normalize"), e);
    }
}
