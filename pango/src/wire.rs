//! Shared wire primitives: XML envelopes, yes/no coercion, raw passthrough,
//! response unwrapping and the small decode/encode helpers every codec uses.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use panos_xml::{parse, parse_fragment, XmlNode};

use crate::error::PangoError;
use crate::xpath::segment_tag;

/// Attributes PAN-OS stamps on candidate config nodes that must never be
/// written back or compared.
pub const VOLATILE_ATTRIBUTES: [&str; 3] = ["admin", "dirtyId", "time"];

/// `true` → `"yes"`, `false` → `"no"`.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Case-sensitive `"yes"` test.
pub fn as_bool(value: &str) -> bool {
    value == "yes"
}

/// A `<member>` list envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberType(pub Vec<String>);

impl MemberType {
    pub fn from_node(node: &XmlNode) -> Self {
        Self(
            node.get_children("member")
                .into_iter()
                .filter_map(|m| m.text.clone())
                .collect(),
        )
    }

    pub fn to_node(&self, tag: &str) -> XmlNode {
        let mut node = XmlNode::new(tag);
        node.children = self
            .0
            .iter()
            .map(|value| XmlNode::with_text("member", value.as_str()))
            .collect();
        node
    }
}

/// An `<entry name="..."/>` list envelope carrying names only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryType(pub Vec<String>);

impl EntryType {
    pub fn from_node(node: &XmlNode) -> Self {
        Self(
            node.get_children("entry")
                .into_iter()
                .filter_map(|e| e.attribute("name").map(ToString::to_string))
                .collect(),
        )
    }

    pub fn to_node(&self, tag: &str) -> XmlNode {
        let mut node = XmlNode::new(tag);
        node.children = self.0.iter().map(|name| entry_node(name)).collect();
        node
    }
}

/// `<entry name="..."/>`.
pub fn entry_node(name: &str) -> XmlNode {
    XmlNode::new("entry").attr("name", name)
}

/// Several specified entries wrapped in their list container for one bulk
/// `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkElement {
    pub tag: String,
    pub data: Vec<XmlNode>,
}

impl BulkElement {
    /// Build the bulk body for `path`, the full path including the
    /// `entry[...]` predicate.
    pub fn new(path: &[String], data: Vec<XmlNode>) -> Self {
        let tag = path
            .len()
            .checked_sub(2)
            .map(|idx| segment_tag(&path[idx]).to_string())
            .unwrap_or_default();
        Self { tag, data }
    }

    /// The `(xpath, element)` pair to send.
    ///
    /// A single element is set directly under its list container; several
    /// are wrapped in the container and set one level higher.
    pub fn into_request(self, path: &[String]) -> (Vec<String>, XmlNode) {
        let mut data = self.data;
        if data.len() == 1 {
            let trimmed = path[..path.len().saturating_sub(1)].to_vec();
            return (trimmed, data.remove(0));
        }
        let trimmed = path[..path.len().saturating_sub(2)].to_vec();
        let mut node = XmlNode::new(self.tag);
        node.children = data;
        (trimmed, node)
    }
}

/// An unmodeled subtree carried through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawXml(pub Vec<XmlNode>);

impl RawXml {
    /// Capture the children of `node` with volatile attributes stripped.
    pub fn capture(node: &XmlNode) -> Self {
        let mut copy = node.clone();
        copy.strip_attributes(&VOLATILE_ATTRIBUTES);
        Self(copy.children)
    }

    /// Parse previously captured text.
    pub fn parse(text: &str) -> Result<Self, PangoError> {
        Ok(Self(parse_fragment(text)?))
    }

    /// The stored inner XML text.
    pub fn text(&self) -> String {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Wrap the captured children back into `tag`.
    pub fn wrap(&self, tag: &str) -> XmlNode {
        let mut node = XmlNode::new(tag);
        node.children = self.0.clone();
        node
    }
}

/// Read the raw slot `key` out of an Entry's raw map.
pub(crate) fn raw_slot(
    raw: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<RawXml>, PangoError> {
    raw.get(key).map(|text| RawXml::parse(text)).transpose()
}

/// Store a captured subtree into an Entry's raw map under `key`.
pub(crate) fn store_raw(raw: &mut BTreeMap<String, String>, key: &str, value: &Option<RawXml>) {
    if let Some(value) = value {
        raw.insert(key.to_string(), value.text());
    }
}

/// Panorama push targets: device serial → vsys names (empty for all vsys).
pub type Targets = BTreeMap<String, Vec<String>>;

/// `<devices><entry name=SERIAL><vsys>...</vsys></entry></devices>`.
pub fn encode_devices(targets: &Targets) -> Option<XmlNode> {
    if targets.is_empty() {
        return None;
    }
    let mut devices = XmlNode::new("devices");
    for (serial, vsys) in targets {
        let mut device = entry_node(serial);
        if !vsys.is_empty() {
            device.children.push(EntryType(vsys.clone()).to_node("vsys"));
        }
        devices.children.push(device);
    }
    Some(devices)
}

pub fn decode_devices(devices: Option<&XmlNode>) -> Targets {
    devices
        .map(|devices| {
            devices
                .get_children("entry")
                .into_iter()
                .filter_map(|d| {
                    let serial = d.attribute("name")?.to_string();
                    let vsys = d
                        .get_child("vsys")
                        .map(|v| EntryType::from_node(v).0)
                        .unwrap_or_default();
                    Some((serial, vsys))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `<target><devices>...</devices><negate>yes</negate></target>`.
pub fn encode_targets(targets: &Targets, negate: bool) -> Option<XmlNode> {
    if targets.is_empty() && !negate {
        return None;
    }
    let mut node = XmlNode::new("target");
    node.node_el(encode_devices(targets));
    node.flag_el("negate", negate);
    Some(node)
}

pub fn decode_targets(node: Option<&XmlNode>) -> (Targets, bool) {
    let Some(node) = node else {
        return (Targets::new(), false);
    };
    (decode_devices(node.get_child("devices")), flag(node, &["negate"]))
}

/// Parse a `<response>` document, turning `status="error"` into an error.
pub fn parse_response(bytes: &[u8]) -> Result<XmlNode, PangoError> {
    let root = parse(bytes)?;
    if root.tag != "response" {
        return Err(PangoError::Transport(format!(
            "expected <response>, got <{}>",
            root.tag
        )));
    }
    if root.attribute("status") == Some("error") {
        return Err(PangoError::Panos {
            code: root.attribute("code").and_then(|c| c.parse().ok()),
            message: error_message(&root),
        });
    }
    Ok(root)
}

/// Flatten the `<msg>` / `<line>` text of an error response.
pub fn error_message(root: &XmlNode) -> String {
    let lines: Vec<String> = root
        .descendants("line")
        .into_iter()
        .filter_map(|l| l.text.as_deref().map(str::trim))
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect();
    if !lines.is_empty() {
        return lines.join(" | ");
    }
    root.descendants("msg")
        .into_iter()
        .find_map(|m| m.text.clone())
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Strip the `<response><result>` envelope, and a third wrapper named after
/// the last path segment when present, leaving the node whose children are
/// the requested payload.
pub fn payload(response: &XmlNode, path: &[String]) -> XmlNode {
    let Some(result) = response.get_child("result") else {
        return XmlNode::new("result");
    };
    let last = path.last().map(|s| segment_tag(s)).unwrap_or_default();
    if last != "entry" && result.children.len() == 1 && result.children[0].tag == last {
        return result.children[0].clone();
    }
    result.clone()
}

/// Fail with a decode error unless `node` is a `<tag>`.
pub(crate) fn expect_tag(node: &XmlNode, tag: &str, kind: &'static str) -> Result<(), PangoError> {
    if node.tag != tag {
        return Err(PangoError::decode(
            kind,
            format!("expected <{tag}>, found <{}>", node.tag),
        ));
    }
    Ok(())
}

pub(crate) fn text(node: &XmlNode, path: &[&str]) -> String {
    node.get_text(path).unwrap_or_default().trim().to_string()
}

pub(crate) fn flag(node: &XmlNode, path: &[&str]) -> bool {
    as_bool(node.get_text(path).unwrap_or_default().trim())
}

/// Parse a numeric leaf; absent means zero.
pub(crate) fn number<T>(node: &XmlNode, path: &[&str], kind: &'static str) -> Result<T, PangoError>
where
    T: FromStr + Default,
{
    let Some(raw) = node.get_text(path) else {
        return Ok(T::default());
    };
    raw.trim().parse().map_err(|_| {
        PangoError::decode(
            kind,
            format!("<{}> is not a number: {raw:?}", path.join("/")),
        )
    })
}

pub(crate) fn members(node: &XmlNode, path: &[&str]) -> Vec<String> {
    node.find(path)
        .map(|n| MemberType::from_node(n).0)
        .unwrap_or_default()
}

pub(crate) fn entry_names(node: &XmlNode, path: &[&str]) -> Vec<String> {
    node.find(path)
        .map(|n| EntryType::from_node(n).0)
        .unwrap_or_default()
}

pub(crate) fn raw(node: &XmlNode, path: &[&str]) -> Option<RawXml> {
    node.find(path).map(RawXml::capture)
}

/// Element-emitting helpers for codec `encode` functions.
///
/// Every helper omits the element when the value is the zero value.
pub(crate) trait Emit {
    fn text_el(&mut self, tag: &str, value: &str);
    fn num_el<T: Display + Default + PartialEq>(&mut self, tag: &str, value: T);
    /// `<tag>yes</tag>` when true, nothing otherwise.
    fn flag_el(&mut self, tag: &str, value: bool);
    /// Always emits `<tag>yes|no</tag>`.
    fn yes_no_el(&mut self, tag: &str, value: bool);
    fn members_el(&mut self, tag: &str, values: &[String]);
    fn node_el(&mut self, node: Option<XmlNode>);
    fn raw_el(&mut self, tag: &str, raw: &Option<RawXml>);
}

impl Emit for XmlNode {
    fn text_el(&mut self, tag: &str, value: &str) {
        if !value.is_empty() {
            self.children.push(XmlNode::with_text(tag, value));
        }
    }

    fn num_el<T: Display + Default + PartialEq>(&mut self, tag: &str, value: T) {
        if value != T::default() {
            self.children.push(XmlNode::with_text(tag, value.to_string()));
        }
    }

    fn flag_el(&mut self, tag: &str, value: bool) {
        if value {
            self.children.push(XmlNode::with_text(tag, "yes"));
        }
    }

    fn yes_no_el(&mut self, tag: &str, value: bool) {
        self.children.push(XmlNode::with_text(tag, yes_no(value)));
    }

    fn members_el(&mut self, tag: &str, values: &[String]) {
        if !values.is_empty() {
            self.children.push(MemberType(values.to_vec()).to_node(tag));
        }
    }

    fn node_el(&mut self, node: Option<XmlNode>) {
        if let Some(node) = node {
            self.children.push(node);
        }
    }

    fn raw_el(&mut self, tag: &str, raw: &Option<RawXml>) {
        if let Some(raw) = raw {
            self.children.push(raw.wrap(tag));
        }
    }
}

/// Set equality for semantically unordered string lists.
pub fn same_set(a: &[String], b: &[String]) -> bool {
    let mut left: Vec<&String> = a.iter().collect();
    let mut right: Vec<&String> = b.iter().collect();
    left.sort();
    left.dedup();
    right.sort();
    right.dedup();
    left == right
}

#[cfg(test)]
mod tests {
    use panos_xml::parse;

    use super::*;
    use crate::xpath::split;

    #[test]
    fn bulk_single_collapses_and_trims_one() {
        let path = split("/config/shared/address/entry[@name='a']");
        let bulk = BulkElement::new(&path, vec![entry_node("a")]);
        let (trimmed, element) = bulk.into_request(&path);
        assert_eq!(trimmed, split("/config/shared/address"));
        assert_eq!(element.to_string(), r#"<entry name="a"/>"#);
    }

    #[test]
    fn bulk_many_wraps_and_trims_two() {
        let path = split("/config/shared/address/entry[@name='a' or @name='b']");
        let bulk = BulkElement::new(&path, vec![entry_node("a"), entry_node("b")]);
        assert_eq!(bulk.tag, "address");
        let (trimmed, element) = bulk.into_request(&path);
        assert_eq!(trimmed, split("/config/shared"));
        assert_eq!(
            element.to_string(),
            r#"<address><entry name="a"/><entry name="b"/></address>"#
        );
    }

    #[test]
    fn raw_capture_strips_volatile_attributes() {
        let node = parse(
            br#"<arp admin="x" dirtyId="1"><entry name="10.0.0.1" time="2020"><hw-address>aa</hw-address></entry></arp>"#,
        )
        .expect("parse");
        let raw = RawXml::capture(&node);
        assert_eq!(
            raw.text(),
            r#"<entry name="10.0.0.1"><hw-address>aa</hw-address></entry>"#
        );
        let back = RawXml::parse(&raw.text()).expect("reparse");
        assert_eq!(back.wrap("arp").to_string(), format!("<arp>{}</arp>", raw.text()));
    }

    #[test]
    fn error_response_is_surfaced() {
        let err = parse_response(
            br#"<response status="error" code="7"><msg><line>No such node</line></msg></response>"#,
        )
        .expect_err("error status");
        assert!(err.is_not_found());
        match err {
            PangoError::Panos { code, .. } => assert_eq!(code, Some(7)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn payload_descends_into_named_wrapper() {
        let resp = parse(
            br#"<response status="success"><result><address><entry name="a"/><entry name="b"/></address></result></response>"#,
        )
        .expect("parse");
        let path = split("/config/shared/address");
        let container = payload(&resp, &path);
        assert_eq!(container.tag, "address");
        assert_eq!(container.children.len(), 2);

        let entry_path = split("/config/shared/address/entry[@name='a']");
        let direct = parse(
            br#"<response status="success"><result total-count="1" count="1"><entry name="a"/></result></response>"#,
        )
        .expect("parse");
        assert_eq!(payload(&direct, &entry_path).tag, "result");
    }

    #[test]
    fn targets_round_trip() {
        let mut targets = Targets::new();
        targets.insert("0011".to_string(), vec!["vsys1".to_string()]);
        targets.insert("0022".to_string(), Vec::new());
        let node = encode_targets(&targets, true).expect("targets");
        assert_eq!(decode_targets(Some(&node)), (targets, true));
        assert!(encode_targets(&Targets::new(), false).is_none());
    }

    #[test]
    fn number_reports_kind() {
        let node = parse(b"<entry><mtu>big</mtu></entry>").expect("parse");
        let err = number::<u32>(&node, &["mtu"], "ethernet interface").expect_err("bad number");
        assert!(err.to_string().contains("ethernet interface"));
        assert_eq!(number::<u32>(&node, &["missing"], "x").expect("absent"), 0);
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = vec!["group2".to_string(), "group5".to_string()];
        let b = vec!["group5".to_string(), "group2".to_string()];
        assert!(same_set(&a, &b));
        assert!(!same_set(&a, &b[..1]));
    }
}
