//! Service objects.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V8_1};
use crate::wire::{entry_node, expect_tag, members, number, text, Emit};
use crate::xpath::{entry_xpath, ObjectScope};

const KIND: &str = "service object";

/// A normalized service object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub name: String,
    pub description: String,
    /// `tcp` or `udp`.
    pub protocol: String,
    pub source_port: String,
    pub destination_port: String,
    pub tags: Vec<String>,
    /// PAN-OS 8.1 and later.
    pub override_session_timeout: bool,
    pub override_timeout: u32,
    /// TCP only.
    pub override_half_closed_timeout: u32,
    /// TCP only.
    pub override_time_wait_timeout: u32,
}

impl Object for Service {
    const KIND: &'static str = KIND;
    type Location = ObjectScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &ObjectScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("service".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V8_1) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

fn check_protocol(e: &Service) -> Result<(), PangoError> {
    match e.protocol.as_str() {
        "tcp" | "udp" => Ok(()),
        other => Err(PangoError::validation(format!(
            "service {:?}: protocol must be tcp or udp, not {other:?}",
            e.name
        ))),
    }
}

/// Reads `<protocol><tcp|udp>`.
fn decode_protocol(node: &XmlNode) -> Option<&XmlNode> {
    let protocol = node.get_child("protocol")?;
    protocol
        .get_child("tcp")
        .or_else(|| protocol.get_child("udp"))
}

/// PAN-OS before 8.1.
struct EntryV1 {
    name: String,
    protocol: String,
    port: String,
    source_port: String,
    description: String,
    tags: Vec<String>,
}

impl EntryV1 {
    fn project(e: &Service) -> Self {
        Self {
            name: e.name.clone(),
            protocol: e.protocol.clone(),
            port: e.destination_port.clone(),
            source_port: e.source_port.clone(),
            description: e.description.clone(),
            tags: e.tags.clone(),
        }
    }

    fn protocol_node(&self) -> XmlNode {
        let mut proto = XmlNode::new(self.protocol.as_str());
        proto.text_el("port", &self.port);
        proto.text_el("source-port", &self.source_port);
        proto
    }

    fn finish(&self, proto: XmlNode) -> XmlNode {
        let mut node = entry_node(&self.name);
        node.children.push(XmlNode::new("protocol").child(proto));
        node.text_el("description", &self.description);
        node.members_el("tag", &self.tags);
        node
    }
}

impl Wire for EntryV1 {
    type Entry = Service;

    fn specify(e: &Service) -> Result<Self, PangoError> {
        check_protocol(e)?;
        Ok(Self::project(e))
    }

    fn normalize(self) -> Service {
        Service {
            name: self.name,
            description: self.description,
            protocol: self.protocol,
            source_port: self.source_port,
            destination_port: self.port,
            tags: self.tags,
            ..Service::default()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let proto = decode_protocol(node);
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            protocol: proto.map(|p| p.tag.clone()).unwrap_or_default(),
            port: proto.map(|p| text(p, &["port"])).unwrap_or_default(),
            source_port: proto.map(|p| text(p, &["source-port"])).unwrap_or_default(),
            description: text(node, &["description"]),
            tags: members(node, &["tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        self.finish(self.protocol_node())
    }
}

/// PAN-OS 8.1 and later: per-service session timeout override.
struct EntryV2 {
    base: EntryV1,
    override_enabled: bool,
    timeout: u32,
    halfclose_timeout: u32,
    timewait_timeout: u32,
}

impl Wire for EntryV2 {
    type Entry = Service;

    fn specify(e: &Service) -> Result<Self, PangoError> {
        check_protocol(e)?;
        let tcp = e.protocol == "tcp";
        Ok(Self {
            base: EntryV1::project(e),
            override_enabled: e.override_session_timeout,
            timeout: e.override_timeout,
            halfclose_timeout: if tcp { e.override_half_closed_timeout } else { 0 },
            timewait_timeout: if tcp { e.override_time_wait_timeout } else { 0 },
        })
    }

    fn normalize(self) -> Service {
        Service {
            override_session_timeout: self.override_enabled,
            override_timeout: self.timeout,
            override_half_closed_timeout: self.halfclose_timeout,
            override_time_wait_timeout: self.timewait_timeout,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        let base = EntryV1::decode(node)?;
        let yes = decode_protocol(node).and_then(|p| p.find(&["override", "yes"]));
        let read = |tag: &str| -> Result<u32, PangoError> {
            match yes {
                Some(yes) => number(yes, &[tag], KIND),
                None => Ok(0),
            }
        };
        Ok(Self {
            override_enabled: yes.is_some(),
            timeout: read("timeout")?,
            halfclose_timeout: read("halfclose-timeout")?,
            timewait_timeout: read("timewait-timeout")?,
            base,
        })
    }

    fn encode(&self) -> XmlNode {
        let mut proto = self.base.protocol_node();
        let choice = if self.override_enabled {
            let mut yes = XmlNode::new("yes");
            yes.num_el("timeout", self.timeout);
            yes.num_el("halfclose-timeout", self.halfclose_timeout);
            yes.num_el("timewait-timeout", self.timewait_timeout);
            yes
        } else {
            XmlNode::new("no")
        };
        proto.children.push(XmlNode::new("override").child(choice));
        self.base.finish(proto)
    }
}
