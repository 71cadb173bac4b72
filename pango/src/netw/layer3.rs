//! Layer3 sub-interfaces of ethernet and aggregate-ethernet interfaces.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use super::l3::{Layer3, Layer3Fields, SendHostname};
use crate::client::ImportKind;
use crate::codec::{era, ImportableObject, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_1, V9_0};
use crate::wire::{entry_node, expect_tag, flag, number, text, Emit};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "layer3 subinterface";

/// Parent interface of a sub-interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubinterfaceScope {
    pub network: NetworkScope,
    /// `ethernet` or `aggregate-ethernet`.
    pub interface_type: String,
    pub parent: String,
}

impl SubinterfaceScope {
    pub fn ethernet(network: NetworkScope, parent: impl Into<String>) -> Self {
        Self {
            network,
            interface_type: "ethernet".to_string(),
            parent: parent.into(),
        }
    }

    pub fn aggregate(network: NetworkScope, parent: impl Into<String>) -> Self {
        Self {
            network,
            interface_type: "aggregate-ethernet".to_string(),
            parent: parent.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer3Subinterface {
    pub name: String,
    pub tag: u32,
    /// Ordered.
    pub static_ips: Vec<String>,
    pub enable_dhcp: bool,
    pub create_dhcp_default_route: bool,
    pub dhcp_default_route_metric: u32,
    pub management_profile: String,
    pub mtu: u32,
    pub adjust_tcp_mss: bool,
    pub ipv4_mss_adjust: u32,
    pub ipv6_mss_adjust: u32,
    pub netflow_profile: String,
    pub comment: String,
    /// PAN-OS 8.1 and later.
    pub decrypt_forward: bool,
    /// PAN-OS 9.0 and later.
    pub dhcp_send_hostname_enable: bool,
    pub dhcp_send_hostname_value: String,
    pub raw: BTreeMap<String, String>,
}

impl Object for Layer3Subinterface {
    const KIND: &'static str = KIND;
    type Location = SubinterfaceScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &SubinterfaceScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        match loc.interface_type.as_str() {
            "ethernet" | "aggregate-ethernet" => {}
            other => {
                return Err(PangoError::validation(format!(
                    "sub-interfaces cannot live under interface type {other:?}"
                )))
            }
        }
        if loc.parent.is_empty() {
            return Err(PangoError::validation("parent interface must be specified"));
        }
        let mut path = loc.network.network_prefix()?;
        path.push("interface".to_string());
        path.push(loc.interface_type.clone());
        path.push(entry_xpath(&[loc.parent.as_str()]));
        path.push("layer3".to_string());
        path.push("units".to_string());
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

impl ImportableObject for Layer3Subinterface {
    const IMPORT_KIND: ImportKind = ImportKind::Interface;

    fn import_target(loc: &SubinterfaceScope) -> (String, String) {
        loc.network.import_target()
    }
}

/// PAN-OS before 8.1.
struct EntryV1 {
    name: String,
    tag: u32,
    layer3: Layer3,
    comment: String,
}

impl Wire for EntryV1 {
    type Entry = Layer3Subinterface;

    fn specify(e: &Layer3Subinterface) -> Result<Self, PangoError> {
        Ok(Self {
            name: e.name.clone(),
            tag: e.tag,
            layer3: Layer3::specify(Layer3Fields {
                ips: &e.static_ips,
                dhcp_enable: e.enable_dhcp,
                dhcp_default_route: e.create_dhcp_default_route,
                dhcp_default_route_metric: e.dhcp_default_route_metric,
                management_profile: &e.management_profile,
                mtu: e.mtu,
                adjust_tcp_mss: e.adjust_tcp_mss,
                ipv4_mss_adjust: e.ipv4_mss_adjust,
                ipv6_mss_adjust: e.ipv6_mss_adjust,
                netflow_profile: &e.netflow_profile,
                raw: &e.raw,
            })?,
            comment: e.comment.clone(),
        })
    }

    fn normalize(self) -> Layer3Subinterface {
        let mut e = Layer3Subinterface {
            name: self.name,
            tag: self.tag,
            comment: self.comment,
            ..Layer3Subinterface::default()
        };
        let l3 = self.layer3;
        l3.store_raw(&mut e.raw);
        e.static_ips = l3.ips;
        e.enable_dhcp = l3.dhcp_enable;
        e.create_dhcp_default_route = l3.dhcp_default_route;
        e.dhcp_default_route_metric = l3.dhcp_default_route_metric;
        e.management_profile = l3.management_profile;
        e.mtu = l3.mtu;
        e.adjust_tcp_mss = l3.adjust_tcp_mss;
        e.ipv4_mss_adjust = l3.ipv4_mss_adjust;
        e.ipv6_mss_adjust = l3.ipv6_mss_adjust;
        e.netflow_profile = l3.netflow_profile;
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            tag: number(node, &["tag"], KIND)?,
            layer3: Layer3::decode(node, KIND)?,
            comment: text(node, &["comment"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.num_el("tag", self.tag);
        self.layer3.encode_into(&mut node);
        node.text_el("comment", &self.comment);
        node
    }
}

/// PAN-OS 8.1: decrypt forwarding.
struct EntryV2 {
    base: EntryV1,
    decrypt_forward: bool,
}

impl Wire for EntryV2 {
    type Entry = Layer3Subinterface;

    fn specify(e: &Layer3Subinterface) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            decrypt_forward: e.decrypt_forward,
        })
    }

    fn normalize(self) -> Layer3Subinterface {
        Layer3Subinterface {
            decrypt_forward: self.decrypt_forward,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            decrypt_forward: flag(node, &["decrypt-forward"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        node.flag_el("decrypt-forward", self.decrypt_forward);
        node
    }
}

/// PAN-OS 9.0 and later: DHCP send-hostname.
struct EntryV3 {
    base: EntryV2,
    send_hostname: SendHostname,
}

impl Wire for EntryV3 {
    type Entry = Layer3Subinterface;

    fn specify(e: &Layer3Subinterface) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2::specify(e)?,
            send_hostname: SendHostname {
                enable: e.dhcp_send_hostname_enable,
                hostname: e.dhcp_send_hostname_value.clone(),
            },
        })
    }

    fn normalize(self) -> Layer3Subinterface {
        Layer3Subinterface {
            dhcp_send_hostname_enable: self.send_hostname.enable,
            dhcp_send_hostname_value: self.send_hostname.hostname,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2::decode(node)?,
            send_hostname: SendHostname::decode(node),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        self.send_hostname.encode_into(&mut node);
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Layer3Subinterface, SubinterfaceScope};
    use crate::codec::Object;
    use crate::version::{V8_0, V9_0};
    use crate::xpath::{join, NetworkScope};

    fn dhcp_unit() -> Layer3Subinterface {
        Layer3Subinterface {
            name: "ethernet1/1.5".to_string(),
            tag: 5,
            enable_dhcp: true,
            dhcp_send_hostname_enable: true,
            dhcp_send_hostname_value: "fw1".to_string(),
            ..Layer3Subinterface::default()
        }
    }

    #[test]
    fn send_hostname_on_nine() {
        let node = dhcp_unit().specify(&V9_0).expect("specify");
        assert_eq!(
            node.get_child("dhcp-client").map(ToString::to_string).as_deref(),
            Some("<dhcp-client><enable>yes</enable><send-hostname><enable>yes</enable><hostname>fw1</hostname></send-hostname></dhcp-client>")
        );
        assert_eq!(
            Layer3Subinterface::normalize(&node, &V9_0).expect("normalize"),
            dhcp_unit()
        );
    }

    #[test]
    fn no_send_hostname_on_eight() {
        let node = dhcp_unit().specify(&V8_0).expect("specify");
        assert_eq!(
            node.get_child("dhcp-client").map(ToString::to_string).as_deref(),
            Some("<dhcp-client><enable>yes</enable></dhcp-client>")
        );
    }

    #[test]
    fn path_nests_under_the_parent() {
        let loc = SubinterfaceScope::ethernet(NetworkScope::template("t1"), "ethernet1/1");
        let path = Layer3Subinterface::xpath(&loc, &["ethernet1/1.5".to_string()]).expect("xpath");
        assert!(join(&path).ends_with(
            "/network/interface/ethernet/entry[@name='ethernet1/1']/layer3/units/entry[@name='ethernet1/1.5']"
        ));
        let bad = SubinterfaceScope {
            interface_type: "loopback".to_string(),
            ..loc
        };
        assert!(Layer3Subinterface::xpath(&bad, &[]).is_err());
    }
}
