//! Layer3 settings shared by physical interfaces and their sub-interfaces.

use std::collections::BTreeMap;

use panos_xml::XmlNode;

use crate::error::PangoError;
use crate::wire::{entry_names, flag, number, raw, raw_slot, store_raw, text, Emit, EntryType, RawXml};

/// The `<layer3>` body (or a layer3 sub-interface `<entry>`) up to PAN-OS 8.0.
#[derive(Debug, Default)]
pub(crate) struct Layer3 {
    pub ips: Vec<String>,
    pub dhcp_enable: bool,
    pub dhcp_default_route: bool,
    pub dhcp_default_route_metric: u32,
    pub management_profile: String,
    pub mtu: u32,
    pub adjust_tcp_mss: bool,
    pub ipv4_mss_adjust: u32,
    pub ipv6_mss_adjust: u32,
    pub netflow_profile: String,
    pub arp: Option<RawXml>,
    pub ndp_proxy: Option<RawXml>,
    pub ipv6: Option<RawXml>,
}

/// Stable-side view of the layer3 fields, borrowed from an Entry.
pub(crate) struct Layer3Fields<'e> {
    pub ips: &'e [String],
    pub dhcp_enable: bool,
    pub dhcp_default_route: bool,
    pub dhcp_default_route_metric: u32,
    pub management_profile: &'e str,
    pub mtu: u32,
    pub adjust_tcp_mss: bool,
    pub ipv4_mss_adjust: u32,
    pub ipv6_mss_adjust: u32,
    pub netflow_profile: &'e str,
    pub raw: &'e BTreeMap<String, String>,
}

impl Layer3 {
    pub fn specify(f: Layer3Fields<'_>) -> Result<Self, PangoError> {
        Ok(Self {
            ips: f.ips.to_vec(),
            dhcp_enable: f.dhcp_enable,
            dhcp_default_route: f.dhcp_default_route,
            dhcp_default_route_metric: f.dhcp_default_route_metric,
            management_profile: f.management_profile.to_string(),
            mtu: f.mtu,
            adjust_tcp_mss: f.adjust_tcp_mss,
            ipv4_mss_adjust: f.ipv4_mss_adjust,
            ipv6_mss_adjust: f.ipv6_mss_adjust,
            netflow_profile: f.netflow_profile.to_string(),
            arp: raw_slot(f.raw, "arp")?,
            ndp_proxy: raw_slot(f.raw, "ndp")?,
            ipv6: raw_slot(f.raw, "ipv6")?,
        })
    }

    /// Move the raw subtrees into an Entry's raw map.
    pub fn store_raw(&self, raw: &mut BTreeMap<String, String>) {
        store_raw(raw, "arp", &self.arp);
        store_raw(raw, "ndp", &self.ndp_proxy);
        store_raw(raw, "ipv6", &self.ipv6);
    }

    pub fn decode(node: &XmlNode, kind: &'static str) -> Result<Self, PangoError> {
        Ok(Self {
            ips: entry_names(node, &["ip"]),
            dhcp_enable: flag(node, &["dhcp-client", "enable"]),
            dhcp_default_route: flag(node, &["dhcp-client", "create-default-route"]),
            dhcp_default_route_metric: number(node, &["dhcp-client", "default-route-metric"], kind)?,
            management_profile: text(node, &["interface-management-profile"]),
            mtu: number(node, &["mtu"], kind)?,
            adjust_tcp_mss: flag(node, &["adjust-tcp-mss", "enable"]),
            ipv4_mss_adjust: number(node, &["adjust-tcp-mss", "ipv4-mss-adjustment"], kind)?,
            ipv6_mss_adjust: number(node, &["adjust-tcp-mss", "ipv6-mss-adjustment"], kind)?,
            netflow_profile: text(node, &["netflow-profile"]),
            arp: raw(node, &["arp"]),
            ndp_proxy: raw(node, &["ndp-proxy"]),
            ipv6: raw(node, &["ipv6"]),
        })
    }

    pub fn encode_into(&self, node: &mut XmlNode) {
        if !self.ips.is_empty() {
            node.children.push(EntryType(self.ips.clone()).to_node("ip"));
        }
        if self.dhcp_enable || self.dhcp_default_route || self.dhcp_default_route_metric != 0 {
            let mut dhcp = XmlNode::new("dhcp-client");
            dhcp.flag_el("enable", self.dhcp_enable);
            dhcp.flag_el("create-default-route", self.dhcp_default_route);
            dhcp.num_el("default-route-metric", self.dhcp_default_route_metric);
            node.children.push(dhcp);
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
        node.raw_el("arp", &self.arp);
        node.raw_el("ndp-proxy", &self.ndp_proxy);
    }
}

/// DHCP client hostname option, PAN-OS 9.0 and later.
#[derive(Debug, Default)]
pub(crate) struct SendHostname {
    pub enable: bool,
    pub hostname: String,
}

impl SendHostname {
    pub fn decode(node: &XmlNode) -> Self {
        Self {
            enable: flag(node, &["dhcp-client", "send-hostname", "enable"]),
            hostname: text(node, &["dhcp-client", "send-hostname", "hostname"]),
        }
    }

    /// Append `<send-hostname>` to the node's `<dhcp-client>`, creating it
    /// when needed.
    pub fn encode_into(&self, node: &mut XmlNode) {
        if !self.enable && self.hostname.is_empty() {
            return;
        }
        let mut send = XmlNode::new("send-hostname");
        send.flag_el("enable", self.enable);
        send.text_el("hostname", &self.hostname);
        node.ensure_child_mut("dhcp-client").children.push(send);
    }
}
