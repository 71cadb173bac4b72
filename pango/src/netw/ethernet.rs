//! Physical ethernet interfaces.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use super::l3::{Layer3, Layer3Fields, SendHostname};
use crate::client::ImportKind;
use crate::codec::{era, ImportableObject, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_1, V9_0};
use crate::wire::{entry_node, expect_tag, flag, number, raw, raw_slot, store_raw, text, Emit, RawXml};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "ethernet interface";

const MODES: [&str; 7] = [
    "layer3",
    "layer2",
    "virtual-wire",
    "tap",
    "ha",
    "decrypt-mirror",
    "aggregate-group",
];

/// A normalized ethernet interface.
///
/// Sub-interfaces are managed through their own namespace; whatever exists
/// under `units` is carried through untouched in `raw`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ethernet {
    pub name: String,
    /// `layer3`, `layer2`, `virtual-wire`, `tap`, `ha`, `decrypt-mirror`
    /// or `aggregate-group`.
    pub mode: String,
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
    pub lldp_enabled: bool,
    pub lldp_profile: String,
    pub link_speed: String,
    pub link_duplex: String,
    pub link_state: String,
    pub aggregate_group: String,
    pub comment: String,
    /// PAN-OS 8.1 and later.
    pub decrypt_forward: bool,
    /// PAN-OS 9.0 and later.
    pub dhcp_send_hostname_enable: bool,
    pub dhcp_send_hostname_value: String,
    pub rx_policing_rate: u32,
    pub tx_policing_rate: u32,
    pub raw: BTreeMap<String, String>,
}

impl Object for Ethernet {
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
        path.push("ethernet".to_string());
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

impl ImportableObject for Ethernet {
    const IMPORT_KIND: ImportKind = ImportKind::Interface;

    fn import_target(loc: &NetworkScope) -> (String, String) {
        loc.import_target()
    }

    fn needs_import(&self) -> bool {
        !matches!(self.mode.as_str(), "ha" | "aggregate-group")
    }
}

/// PAN-OS before 8.1.
struct EntryV1 {
    name: String,
    mode: String,
    layer3: Option<Layer3>,
    lldp_enable: bool,
    lldp_profile: String,
    l2_netflow_profile: String,
    units: Option<RawXml>,
    aggregate_group: String,
    link_speed: String,
    link_duplex: String,
    link_state: String,
    comment: String,
}

impl EntryV1 {
    /// The `<layer3>`/`<layer2>`/`<virtual-wire>` element, if any.
    fn mode_node<'n>(&self, node: &'n mut XmlNode) -> Option<&'n mut XmlNode> {
        node.get_child_mut(&self.mode)
    }
}

impl Wire for EntryV1 {
    type Entry = Ethernet;

    fn specify(e: &Ethernet) -> Result<Self, PangoError> {
        if !MODES.contains(&e.mode.as_str()) {
            return Err(PangoError::validation(format!(
                "ethernet {:?}: unknown mode {:?}",
                e.name, e.mode
            )));
        }
        if e.mode == "aggregate-group" && e.aggregate_group.is_empty() {
            return Err(PangoError::validation(format!(
                "ethernet {:?}: aggregate-group mode requires the group name",
                e.name
            )));
        }
        let layer3 = if e.mode == "layer3" {
            Some(Layer3::specify(Layer3Fields {
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
            })?)
        } else {
            None
        };
        Ok(Self {
            name: e.name.clone(),
            mode: e.mode.clone(),
            layer3,
            lldp_enable: e.lldp_enabled,
            lldp_profile: e.lldp_profile.clone(),
            l2_netflow_profile: if e.mode == "layer3" {
                String::new()
            } else {
                e.netflow_profile.clone()
            },
            units: raw_slot(&e.raw, "units")?,
            aggregate_group: e.aggregate_group.clone(),
            link_speed: e.link_speed.clone(),
            link_duplex: e.link_duplex.clone(),
            link_state: e.link_state.clone(),
            comment: e.comment.clone(),
        })
    }

    fn normalize(self) -> Ethernet {
        let mut e = Ethernet {
            name: self.name,
            mode: self.mode,
            lldp_enabled: self.lldp_enable,
            lldp_profile: self.lldp_profile,
            netflow_profile: self.l2_netflow_profile,
            aggregate_group: self.aggregate_group,
            link_speed: self.link_speed,
            link_duplex: self.link_duplex,
            link_state: self.link_state,
            comment: self.comment,
            ..Ethernet::default()
        };
        if let Some(l3) = self.layer3 {
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
        }
        store_raw(&mut e.raw, "units", &self.units);
        e
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let mode = MODES
            .iter()
            .find(|m| node.get_child(m).is_some())
            .map(|m| m.to_string())
            .unwrap_or_default();
        let body = node.get_child(&mode);
        let layer3 = match (mode.as_str(), body) {
            ("layer3", Some(body)) => Some(Layer3::decode(body, KIND)?),
            _ => None,
        };
        let read = |path: &[&str]| body.map(|b| text(b, path)).unwrap_or_default();
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            lldp_enable: body.map(|b| flag(b, &["lldp", "enable"])).unwrap_or(false),
            lldp_profile: read(&["lldp", "profile"]),
            l2_netflow_profile: if mode == "layer3" {
                String::new()
            } else {
                read(&["netflow-profile"])
            },
            units: body.and_then(|b| raw(b, &["units"])),
            aggregate_group: text(node, &["aggregate-group"]),
            link_speed: text(node, &["link-speed"]),
            link_duplex: text(node, &["link-duplex"]),
            link_state: text(node, &["link-state"]),
            comment: text(node, &["comment"]),
            layer3,
            mode,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        if self.mode == "aggregate-group" {
            node.text_el("aggregate-group", &self.aggregate_group);
        } else {
            let mut body = XmlNode::new(self.mode.as_str());
            if let Some(l3) = &self.layer3 {
                l3.encode_into(&mut body);
            }
            body.text_el("netflow-profile", &self.l2_netflow_profile);
            if self.lldp_enable || !self.lldp_profile.is_empty() {
                let mut lldp = XmlNode::new("lldp");
                lldp.flag_el("enable", self.lldp_enable);
                lldp.text_el("profile", &self.lldp_profile);
                body.children.push(lldp);
            }
            body.raw_el("units", &self.units);
            node.children.push(body);
        }
        node.text_el("link-speed", &self.link_speed);
        node.text_el("link-duplex", &self.link_duplex);
        node.text_el("link-state", &self.link_state);
        node.text_el("comment", &self.comment);
        node
    }
}

/// PAN-OS 8.1: layer3 decrypt forwarding.
struct EntryV2 {
    base: EntryV1,
    decrypt_forward: bool,
}

impl Wire for EntryV2 {
    type Entry = Ethernet;

    fn specify(e: &Ethernet) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            decrypt_forward: e.mode == "layer3" && e.decrypt_forward,
        })
    }

    fn normalize(self) -> Ethernet {
        Ethernet {
            decrypt_forward: self.decrypt_forward,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            decrypt_forward: flag(node, &["layer3", "decrypt-forward"]),
            base: EntryV1::decode(node)?,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if let Some(body) = self.base.mode_node(&mut node) {
            body.flag_el("decrypt-forward", self.decrypt_forward);
        }
        node
    }
}

/// PAN-OS 9.0 and later: DHCP send-hostname and policing rates.
struct EntryV3 {
    base: EntryV2,
    send_hostname: SendHostname,
    rx_rate: u32,
    tx_rate: u32,
}

impl Wire for EntryV3 {
    type Entry = Ethernet;

    fn specify(e: &Ethernet) -> Result<Self, PangoError> {
        let layer3 = e.mode == "layer3";
        Ok(Self {
            base: EntryV2::specify(e)?,
            send_hostname: if layer3 {
                SendHostname {
                    enable: e.dhcp_send_hostname_enable,
                    hostname: e.dhcp_send_hostname_value.clone(),
                }
            } else {
                SendHostname::default()
            },
            rx_rate: if layer3 { e.rx_policing_rate } else { 0 },
            tx_rate: if layer3 { e.tx_policing_rate } else { 0 },
        })
    }

    fn normalize(self) -> Ethernet {
        Ethernet {
            dhcp_send_hostname_enable: self.send_hostname.enable,
            dhcp_send_hostname_value: self.send_hostname.hostname,
            rx_policing_rate: self.rx_rate,
            tx_policing_rate: self.tx_rate,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        let (send_hostname, rx_rate, tx_rate) = match node.get_child("layer3") {
            Some(l3) => (
                SendHostname::decode(l3),
                number(l3, &["policing", "rx-rate"], KIND)?,
                number(l3, &["policing", "tx-rate"], KIND)?,
            ),
            None => (SendHostname::default(), 0, 0),
        };
        Ok(Self {
            base: EntryV2::decode(node)?,
            send_hostname,
            rx_rate,
            tx_rate,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if let Some(l3) = node.get_child_mut("layer3") {
            self.send_hostname.encode_into(l3);
            if self.rx_rate != 0 || self.tx_rate != 0 {
                let mut policing = XmlNode::new("policing");
                policing.num_el("rx-rate", self.rx_rate);
                policing.num_el("tx-rate", self.tx_rate);
                l3.children.push(policing);
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::Ethernet;
    use crate::codec::{ImportableObject, Object};
    use crate::version::{V7_1, V8_1, V9_0};

    fn layer3() -> Ethernet {
        Ethernet {
            name: "ethernet1/1".to_string(),
            mode: "layer3".to_string(),
            static_ips: vec!["10.1.1.1/24".to_string(), "10.1.2.1/24".to_string()],
            management_profile: "allow-ping".to_string(),
            lldp_enabled: true,
            comment: "uplink".to_string(),
            decrypt_forward: true,
            enable_dhcp: false,
            rx_policing_rate: 100,
            ..Ethernet::default()
        }
    }

    #[test]
    fn round_trips_at_nine() {
        let e = layer3();
        let node = e.specify(&V9_0).expect("specify");
        assert_eq!(Ethernet::normalize(&node, &V9_0).expect("normalize"), e);
    }

    #[test]
    fn later_fields_are_zero_on_older_eras() {
        let node = layer3().specify(&V7_1).expect("specify");
        assert!(node.find(&["layer3", "decrypt-forward"]).is_none());
        assert!(node.find(&["layer3", "policing"]).is_none());
        let back = Ethernet::normalize(&node, &V7_1).expect("normalize");
        assert!(!back.decrypt_forward);
        assert_eq!(back.rx_policing_rate, 0);
        assert_eq!(back.static_ips, layer3().static_ips);

        let node = layer3().specify(&V8_1).expect("specify");
        assert_eq!(node.get_text(&["layer3", "decrypt-forward"]), Some("yes"));
        assert!(node.find(&["layer3", "policing"]).is_none());
    }

    #[test]
    fn arp_table_is_preserved_verbatim() {
        let mut e = layer3();
        let mut raw = BTreeMap::new();
        raw.insert(
            "arp".to_string(),
            r#"<entry name="10.1.1.5"><hw-address>00:11:22:33:44:55</hw-address></entry>"#
                .to_string(),
        );
        e.raw = raw;
        let node = e.specify(&V9_0).expect("specify");
        assert_eq!(
            node.find(&["layer3", "arp", "entry"])
                .and_then(|n| n.get_text(&["hw-address"])),
            Some("00:11:22:33:44:55")
        );
        assert_eq!(Ethernet::normalize(&node, &V9_0).expect("normalize").raw, e.raw);
    }

    #[test]
    fn ha_and_aggregate_members_skip_import() {
        let mut e = layer3();
        assert!(e.needs_import());
        e.mode = "ha".to_string();
        assert!(!e.needs_import());
        e.mode = "aggregate-group".to_string();
        e.aggregate_group = "ae1".to_string();
        assert!(!e.needs_import());
        let node = e.specify(&V9_0).expect("specify");
        assert_eq!(node.get_text(&["aggregate-group"]), Some("ae1"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut e = layer3();
        e.mode = "layer4".to_string();
        assert!(e.specify(&V9_0).is_err());
    }
}
