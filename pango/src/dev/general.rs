//! Device general settings (`deviceconfig/system`).
//!
//! Only the commonly managed leaves are modeled. Every other child of
//! `<system>` is kept raw and written back untouched, so editing the
//! hostname does not wipe SNMP, syslog or service route settings.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, ConfigObject, Normalizer, Specifier, Wire};
use crate::error::PangoError;
use crate::version::Version;
use crate::wire::{expect_tag, flag, raw_slot, store_raw, text, Emit, RawXml};
use crate::xpath::NetworkScope;

const KIND: &str = "general settings";

/// `<system>` children this codec owns.
const MODELED: [&str; 14] = [
    "hostname",
    "ip-address",
    "netmask",
    "default-gateway",
    "ipv6-address",
    "ipv6-default-gateway",
    "dns-setting",
    "ntp-servers",
    "timezone",
    "domain",
    "update-server",
    "server-verification",
    "login-banner",
    "panorama-server",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub hostname: String,
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
    pub ipv6_address: String,
    pub ipv6_gateway: String,
    pub dns_primary: String,
    pub dns_secondary: String,
    pub ntp_primary: String,
    pub ntp_secondary: String,
    pub timezone: String,
    pub domain: String,
    pub update_server: String,
    pub verify_update_server: bool,
    pub login_banner: String,
    pub panorama_primary: String,
    pub panorama_secondary: String,
    /// Unmodeled subtrees: `misc` holds the other `<system>` children,
    /// `ntp1`/`ntp2` the NTP authentication settings.
    #[serde(skip)]
    pub raw: BTreeMap<String, String>,
}

impl ConfigObject for General {
    const KIND: &'static str = KIND;
    type Location = NetworkScope;

    fn xpath(loc: &NetworkScope) -> Result<Vec<String>, PangoError> {
        let mut path = loc.device_prefix()?;
        path.push("deviceconfig".to_string());
        path.push("system".to_string());
        Ok(path)
    }

    fn versioning(_version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        era::<System>()
    }
}

struct System {
    general: General,
    ntp1_auth: Option<RawXml>,
    ntp2_auth: Option<RawXml>,
    misc: Option<RawXml>,
}

impl Wire for System {
    type Entry = General;

    fn specify(e: &General) -> Result<Self, PangoError> {
        Ok(Self {
            ntp1_auth: raw_slot(&e.raw, "ntp1")?,
            ntp2_auth: raw_slot(&e.raw, "ntp2")?,
            misc: raw_slot(&e.raw, "misc")?,
            general: General {
                raw: BTreeMap::new(),
                ..e.clone()
            },
        })
    }

    fn normalize(self) -> General {
        let mut general = self.general;
        store_raw(&mut general.raw, "ntp1", &self.ntp1_auth);
        store_raw(&mut general.raw, "ntp2", &self.ntp2_auth);
        store_raw(&mut general.raw, "misc", &self.misc);
        general
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "system", KIND)?;
        let ntp = |slot: &str| {
            node.find(&["ntp-servers", slot, "authentication-type"])
                .map(|auth| RawXml(vec![auth.clone()]))
        };
        let mut rest = node.clone();
        rest.children.retain(|c| {
            !MODELED.contains(&c.tag.as_str()) && c.tag != "panorama-server-2"
        });
        let misc = (!rest.children.is_empty()).then(|| RawXml::capture(&rest));

        Ok(Self {
            general: General {
                hostname: text(node, &["hostname"]),
                ip_address: text(node, &["ip-address"]),
                netmask: text(node, &["netmask"]),
                gateway: text(node, &["default-gateway"]),
                ipv6_address: text(node, &["ipv6-address"]),
                ipv6_gateway: text(node, &["ipv6-default-gateway"]),
                dns_primary: text(node, &["dns-setting", "servers", "primary"]),
                dns_secondary: text(node, &["dns-setting", "servers", "secondary"]),
                ntp_primary: text(node, &["ntp-servers", "primary-ntp-server", "ntp-server-address"]),
                ntp_secondary: text(
                    node,
                    &["ntp-servers", "secondary-ntp-server", "ntp-server-address"],
                ),
                timezone: text(node, &["timezone"]),
                domain: text(node, &["domain"]),
                update_server: text(node, &["update-server"]),
                verify_update_server: flag(node, &["server-verification"]),
                login_banner: text(node, &["login-banner"]),
                panorama_primary: text(node, &["panorama-server"]),
                panorama_secondary: text(node, &["panorama-server-2"]),
                raw: BTreeMap::new(),
            },
            ntp1_auth: ntp("primary-ntp-server"),
            ntp2_auth: ntp("secondary-ntp-server"),
            misc,
        })
    }

    fn encode(&self) -> XmlNode {
        let g = &self.general;
        let mut node = XmlNode::new("system");
        node.text_el("hostname", &g.hostname);
        node.text_el("ip-address", &g.ip_address);
        node.text_el("netmask", &g.netmask);
        node.text_el("default-gateway", &g.gateway);
        node.text_el("ipv6-address", &g.ipv6_address);
        node.text_el("ipv6-default-gateway", &g.ipv6_gateway);
        if !g.dns_primary.is_empty() || !g.dns_secondary.is_empty() {
            let mut servers = XmlNode::new("servers");
            servers.text_el("primary", &g.dns_primary);
            servers.text_el("secondary", &g.dns_secondary);
            node.children
                .push(XmlNode::new("dns-setting").child(servers));
        }
        let mut ntp = XmlNode::new("ntp-servers");
        for (slot, address, auth) in [
            ("primary-ntp-server", &g.ntp_primary, &self.ntp1_auth),
            ("secondary-ntp-server", &g.ntp_secondary, &self.ntp2_auth),
        ] {
            if address.is_empty() {
                continue;
            }
            let mut server = XmlNode::new(slot);
            server.text_el("ntp-server-address", address);
            if let Some(auth) = auth {
                server.children.extend(auth.0.iter().cloned());
            }
            ntp.children.push(server);
        }
        if !ntp.children.is_empty() {
            node.children.push(ntp);
        }
        node.text_el("timezone", &g.timezone);
        node.text_el("domain", &g.domain);
        node.text_el("update-server", &g.update_server);
        node.flag_el("server-verification", g.verify_update_server);
        node.text_el("login-banner", &g.login_banner);
        node.text_el("panorama-server", &g.panorama_primary);
        node.text_el("panorama-server-2", &g.panorama_secondary);
        if let Some(misc) = &self.misc {
            node.children.extend(misc.0.iter().cloned());
        }
        node
    }
}
