//! IPv4 static routes inside a virtual router.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V7_1, V9_0};
use crate::wire::{entry_node, expect_tag, number, text, Emit};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "ipv4 static route";

const ROUTE_TABLES: [&str; 4] = ["unicast", "multicast", "both", "no-install"];

/// A virtual router on a firewall or inside a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterScope {
    pub network: NetworkScope,
    pub virtual_router: String,
}

impl RouterScope {
    pub fn new(network: NetworkScope, virtual_router: impl Into<String>) -> Self {
        Self {
            network,
            virtual_router: virtual_router.into(),
        }
    }
}

/// Where matching traffic is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "value")]
pub enum NextHop {
    /// No `<nexthop>` element; the route egresses `interface` directly.
    #[default]
    None,
    Discard,
    IpAddress(String),
    NextVr(String),
    /// PAN-OS 9.0 and later.
    Fqdn(String),
}

impl NextHop {
    fn encode(&self) -> Option<XmlNode> {
        let child = match self {
            Self::None => return None,
            Self::Discard => XmlNode::new("discard"),
            Self::IpAddress(ip) => XmlNode::with_text("ip-address", ip.as_str()),
            Self::NextVr(vr) => XmlNode::with_text("next-vr", vr.as_str()),
            Self::Fqdn(fqdn) => XmlNode::with_text("fqdn", fqdn.as_str()),
        };
        Some(XmlNode::new("nexthop").child(child))
    }

    fn decode(node: &XmlNode) -> Self {
        let Some(choice) = node.get_child("nexthop").and_then(|n| n.children.first()) else {
            return Self::None;
        };
        let value = choice.text.as_deref().unwrap_or_default().trim().to_string();
        match choice.tag.as_str() {
            "discard" => Self::Discard,
            "ip-address" => Self::IpAddress(value),
            "next-vr" => Self::NextVr(value),
            "fqdn" => Self::Fqdn(value),
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRoute {
    pub name: String,
    pub destination: String,
    pub interface: String,
    pub next_hop: NextHop,
    pub admin_distance: u32,
    pub metric: u32,
    /// `unicast`, `multicast`, `both`, `no-install` or empty.
    pub route_table: String,
    /// PAN-OS 7.1 and later.
    pub bfd_profile: String,
}

impl Object for StaticRoute {
    const KIND: &'static str = KIND;
    type Location = RouterScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &RouterScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        if loc.virtual_router.is_empty() {
            return Err(PangoError::validation("virtual router must be specified"));
        }
        let mut path = loc.network.network_prefix()?;
        path.push("virtual-router".to_string());
        path.push(entry_xpath(&[loc.virtual_router.as_str()]));
        for segment in ["routing-table", "ip", "static-route"] {
            path.push(segment.to_string());
        }
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V9_0) {
            era::<EntryV3>()
        } else if version.gte(&V7_1) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

/// PAN-OS before 7.1.
struct EntryV1 {
    name: String,
    destination: String,
    interface: String,
    next_hop: NextHop,
    admin_distance: u32,
    metric: u32,
    route_table: String,
}

impl EntryV1 {
    fn project(e: &StaticRoute) -> Result<Self, PangoError> {
        if !e.route_table.is_empty() && !ROUTE_TABLES.contains(&e.route_table.as_str()) {
            return Err(PangoError::validation(format!(
                "static route {:?}: unknown route table {:?}",
                e.name, e.route_table
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            destination: e.destination.clone(),
            interface: e.interface.clone(),
            next_hop: e.next_hop.clone(),
            admin_distance: e.admin_distance,
            metric: e.metric,
            route_table: e.route_table.clone(),
        })
    }
}

fn reject_fqdn(e: &StaticRoute) -> Result<(), PangoError> {
    if matches!(e.next_hop, NextHop::Fqdn(_)) {
        return Err(PangoError::validation(format!(
            "static route {:?}: fqdn next hops require PAN-OS 9.0",
            e.name
        )));
    }
    Ok(())
}

impl Wire for EntryV1 {
    type Entry = StaticRoute;

    fn specify(e: &StaticRoute) -> Result<Self, PangoError> {
        reject_fqdn(e)?;
        Self::project(e)
    }

    fn normalize(self) -> StaticRoute {
        StaticRoute {
            name: self.name,
            destination: self.destination,
            interface: self.interface,
            next_hop: self.next_hop,
            admin_distance: self.admin_distance,
            metric: self.metric,
            route_table: self.route_table,
            bfd_profile: String::new(),
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            destination: text(node, &["destination"]),
            interface: text(node, &["interface"]),
            next_hop: NextHop::decode(node),
            admin_distance: number(node, &["admin-dist"], KIND)?,
            metric: number(node, &["metric"], KIND)?,
            route_table: node
                .get_child("route-table")
                .and_then(|rt| rt.children.first())
                .map(|choice| choice.tag.clone())
                .unwrap_or_default(),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.text_el("destination", &self.destination);
        node.text_el("interface", &self.interface);
        node.node_el(self.next_hop.encode());
        node.num_el("admin-dist", self.admin_distance);
        node.num_el("metric", self.metric);
        if !self.route_table.is_empty() {
            node.children
                .push(XmlNode::new("route-table").child(XmlNode::new(self.route_table.as_str())));
        }
        node
    }
}

/// PAN-OS 7.1: BFD profile.
struct EntryV2 {
    base: EntryV1,
    bfd_profile: String,
}

impl Wire for EntryV2 {
    type Entry = StaticRoute;

    fn specify(e: &StaticRoute) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            bfd_profile: e.bfd_profile.clone(),
        })
    }

    fn normalize(self) -> StaticRoute {
        StaticRoute {
            bfd_profile: self.bfd_profile,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            bfd_profile: text(node, &["bfd", "profile"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if !self.bfd_profile.is_empty() {
            node.children
                .push(XmlNode::new("bfd").child(XmlNode::with_text("profile", self.bfd_profile.as_str())));
        }
        node
    }
}

/// PAN-OS 9.0 and later: FQDN next hops.
struct EntryV3 {
    base: EntryV2,
}

impl Wire for EntryV3 {
    type Entry = StaticRoute;

    fn specify(e: &StaticRoute) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2 {
                base: EntryV1::project(e)?,
                bfd_profile: e.bfd_profile.clone(),
            },
        })
    }

    fn normalize(self) -> StaticRoute {
        self.base.normalize()
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV2::decode(node)?,
        })
    }

    fn encode(&self) -> XmlNode {
        self.base.encode()
    }
}
