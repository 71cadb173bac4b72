//! Virtual routers.
//!
//! Routing protocols and the static routing table are managed through their
//! own namespaces; the codec carries them through untouched as raw XML so an
//! `edit` of the router never drops them.

use std::collections::BTreeMap;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::client::ImportKind;
use crate::codec::{era, ImportableObject, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_0};
use crate::wire::{
    entry_node, expect_tag, flag, members, number, raw, raw_slot, store_raw, Emit, RawXml,
};
use crate::xpath::{entry_xpath, NetworkScope};

const KIND: &str = "virtual router";

const LOAD_BALANCE_METHODS: [&str; 4] = [
    "ip-modulo",
    "ip-hash",
    "weighted-round-robin",
    "balanced-round-robin",
];

/// Administrative distances; zero leaves the PAN-OS default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminDistances {
    pub static_dist: u32,
    pub static_ipv6_dist: u32,
    pub ospf_int_dist: u32,
    pub ospf_ext_dist: u32,
    pub ospfv3_int_dist: u32,
    pub ospfv3_ext_dist: u32,
    pub ibgp_dist: u32,
    pub ebgp_dist: u32,
    pub rip_dist: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualRouter {
    pub name: String,
    /// Unordered.
    pub interfaces: Vec<String>,
    pub distances: AdminDistances,
    pub enable_ecmp: bool,
    pub ecmp_symmetric_return: bool,
    /// PAN-OS 8.0 and later.
    pub ecmp_strict_source_path: bool,
    pub ecmp_max_path: u32,
    /// One of `ip-modulo`, `ip-hash`, `weighted-round-robin`,
    /// `balanced-round-robin`, or empty.
    pub ecmp_load_balance_method: String,
    pub ecmp_hash_source_only: bool,
    pub ecmp_hash_use_port: bool,
    pub ecmp_hash_seed: u32,
    /// Interface → weight, for `weighted-round-robin`.
    pub ecmp_weighted_round_robin_interfaces: BTreeMap<String, u32>,
    pub raw: BTreeMap<String, String>,
}

impl Object for VirtualRouter {
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
        path.push("virtual-router".to_string());
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

impl ImportableObject for VirtualRouter {
    const IMPORT_KIND: ImportKind = ImportKind::VirtualRouter;

    fn import_target(loc: &NetworkScope) -> (String, String) {
        loc.import_target()
    }
}

const DISTANCE_TAGS: [&str; 9] = [
    "static",
    "static-ipv6",
    "ospf-int",
    "ospf-ext",
    "ospfv3-int",
    "ospfv3-ext",
    "ibgp",
    "ebgp",
    "rip",
];

impl AdminDistances {
    fn as_array(&self) -> [u32; 9] {
        [
            self.static_dist,
            self.static_ipv6_dist,
            self.ospf_int_dist,
            self.ospf_ext_dist,
            self.ospfv3_int_dist,
            self.ospfv3_ext_dist,
            self.ibgp_dist,
            self.ebgp_dist,
            self.rip_dist,
        ]
    }

    fn from_array(d: [u32; 9]) -> Self {
        Self {
            static_dist: d[0],
            static_ipv6_dist: d[1],
            ospf_int_dist: d[2],
            ospf_ext_dist: d[3],
            ospfv3_int_dist: d[4],
            ospfv3_ext_dist: d[5],
            ibgp_dist: d[6],
            ebgp_dist: d[7],
            rip_dist: d[8],
        }
    }
}

#[derive(Debug, Default)]
struct Ecmp {
    enable: bool,
    symmetric_return: bool,
    max_path: u32,
    method: String,
    hash_source_only: bool,
    hash_use_port: bool,
    hash_seed: u32,
    weights: BTreeMap<String, u32>,
}

impl Ecmp {
    fn is_empty(&self) -> bool {
        !self.enable && !self.symmetric_return && self.max_path == 0 && self.method.is_empty()
    }
}

/// PAN-OS before 8.0.
struct EntryV1 {
    name: String,
    interfaces: Vec<String>,
    distances: [u32; 9],
    ecmp: Ecmp,
    routing_table: Option<RawXml>,
    protocol: Option<RawXml>,
    multicast: Option<RawXml>,
}

impl Wire for EntryV1 {
    type Entry = VirtualRouter;

    fn specify(e: &VirtualRouter) -> Result<Self, PangoError> {
        let method = e.ecmp_load_balance_method.as_str();
        if !method.is_empty() && !LOAD_BALANCE_METHODS.contains(&method) {
            return Err(PangoError::validation(format!(
                "virtual router {:?}: unknown ecmp load balance method {method:?}",
                e.name
            )));
        }
        Ok(Self {
            name: e.name.clone(),
            interfaces: e.interfaces.clone(),
            distances: e.distances.as_array(),
            ecmp: Ecmp {
                enable: e.enable_ecmp,
                symmetric_return: e.ecmp_symmetric_return,
                max_path: e.ecmp_max_path,
                method: method.to_string(),
                hash_source_only: method == "ip-hash" && e.ecmp_hash_source_only,
                hash_use_port: method == "ip-hash" && e.ecmp_hash_use_port,
                hash_seed: if method == "ip-hash" { e.ecmp_hash_seed } else { 0 },
                weights: if method == "weighted-round-robin" {
                    e.ecmp_weighted_round_robin_interfaces.clone()
                } else {
                    BTreeMap::new()
                },
            },
            routing_table: raw_slot(&e.raw, "rt")?,
            protocol: raw_slot(&e.raw, "protocol")?,
            multicast: raw_slot(&e.raw, "multicast")?,
        })
    }

    fn normalize(self) -> VirtualRouter {
        let mut raw = BTreeMap::new();
        store_raw(&mut raw, "rt", &self.routing_table);
        store_raw(&mut raw, "protocol", &self.protocol);
        store_raw(&mut raw, "multicast", &self.multicast);
        VirtualRouter {
            name: self.name,
            interfaces: self.interfaces,
            distances: AdminDistances::from_array(self.distances),
            enable_ecmp: self.ecmp.enable,
            ecmp_symmetric_return: self.ecmp.symmetric_return,
            ecmp_strict_source_path: false,
            ecmp_max_path: self.ecmp.max_path,
            ecmp_load_balance_method: self.ecmp.method,
            ecmp_hash_source_only: self.ecmp.hash_source_only,
            ecmp_hash_use_port: self.ecmp.hash_use_port,
            ecmp_hash_seed: self.ecmp.hash_seed,
            ecmp_weighted_round_robin_interfaces: self.ecmp.weights,
            raw,
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let mut distances = [0u32; 9];
        for (slot, tag) in distances.iter_mut().zip(DISTANCE_TAGS) {
            *slot = number(node, &["admin-dists", tag], KIND)?;
        }
        let mut ecmp = Ecmp::default();
        if let Some(e) = node.get_child("ecmp") {
            ecmp.enable = flag(e, &["enable"]);
            ecmp.symmetric_return = flag(e, &["symmetric-return"]);
            ecmp.max_path = number(e, &["max-path"], KIND)?;
            if let Some(algorithm) = e
                .get_child("algorithm")
                .and_then(|a| a.children.first())
            {
                ecmp.method = algorithm.tag.clone();
                ecmp.hash_source_only = flag(algorithm, &["src-only"]);
                ecmp.hash_use_port = flag(algorithm, &["use-port"]);
                ecmp.hash_seed = number(algorithm, &["hash-seed"], KIND)?;
                if let Some(ifaces) = algorithm.get_child("interface") {
                    for entry in ifaces.get_children("entry") {
                        let name = entry.attribute("name").unwrap_or_default().to_string();
                        ecmp.weights.insert(name, number(entry, &["weight"], KIND)?);
                    }
                }
            }
        }
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            interfaces: members(node, &["interface"]),
            distances,
            ecmp,
            routing_table: raw(node, &["routing-table"]),
            protocol: raw(node, &["protocol"]),
            multicast: raw(node, &["multicast"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.members_el("interface", &self.interfaces);
        if self.distances.iter().any(|d| *d != 0) {
            let mut dists = XmlNode::new("admin-dists");
            for (value, tag) in self.distances.iter().zip(DISTANCE_TAGS) {
                dists.num_el(tag, *value);
            }
            node.children.push(dists);
        }
        if !self.ecmp.is_empty() {
            node.children.push(self.ecmp_node());
        }
        node.raw_el("routing-table", &self.routing_table);
        node.raw_el("protocol", &self.protocol);
        node.raw_el("multicast", &self.multicast);
        node
    }
}

impl EntryV1 {
    fn ecmp_node(&self) -> XmlNode {
        let ecmp = &self.ecmp;
        let mut node = XmlNode::new("ecmp");
        node.flag_el("enable", ecmp.enable);
        node.flag_el("symmetric-return", ecmp.symmetric_return);
        node.num_el("max-path", ecmp.max_path);
        if !ecmp.method.is_empty() {
            let mut algorithm = XmlNode::new(ecmp.method.as_str());
            algorithm.flag_el("src-only", ecmp.hash_source_only);
            algorithm.flag_el("use-port", ecmp.hash_use_port);
            algorithm.num_el("hash-seed", ecmp.hash_seed);
            if !ecmp.weights.is_empty() {
                let mut ifaces = XmlNode::new("interface");
                for (name, weight) in &ecmp.weights {
                    let mut entry = entry_node(name);
                    entry.num_el("weight", *weight);
                    ifaces.children.push(entry);
                }
                algorithm.children.push(ifaces);
            }
            node.children.push(XmlNode::new("algorithm").child(algorithm));
        }
        node
    }
}

/// PAN-OS 8.0 and later: ECMP strict source path.
struct EntryV2 {
    base: EntryV1,
    strict_source_path: bool,
}

impl Wire for EntryV2 {
    type Entry = VirtualRouter;

    fn specify(e: &VirtualRouter) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            strict_source_path: e.ecmp_strict_source_path,
        })
    }

    fn normalize(self) -> VirtualRouter {
        VirtualRouter {
            ecmp_strict_source_path: self.strict_source_path,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            strict_source_path: flag(node, &["ecmp", "strict-source-path"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if self.strict_source_path {
            node.ensure_child_mut("ecmp")
                .flag_el("strict-source-path", true);
        }
        node
    }
}
