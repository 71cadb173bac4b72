//! XPath construction and evaluation.
//!
//! Paths are kept as ordered segment lists until the moment a request is
//! sent: bulk `set`, `move` and vsys import all need a trimmed prefix of the
//! same path, and trimming a `Vec` is safe where slicing a string is not
//! (interface names such as `ethernet1/1` contain slashes).

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::error::PangoError;

/// Name of the single device entry in every PAN-OS configuration.
pub const LOCALHOST: &str = "localhost.localdomain";

/// `entry[@name='a' or @name='b']`, or plain `entry` when `names` is empty.
pub fn entry_xpath<S: AsRef<str>>(names: &[S]) -> String {
    predicate_xpath("entry", "@name", names)
}

/// `member[text()='a' or text()='b']`, or plain `member` when `names` is empty.
pub fn member_xpath<S: AsRef<str>>(names: &[S]) -> String {
    predicate_xpath("member", "text()", names)
}

fn predicate_xpath<S: AsRef<str>>(tag: &str, selector: &str, names: &[S]) -> String {
    if names.is_empty() {
        return tag.to_string();
    }
    let clauses = names
        .iter()
        .map(|name| format!("{selector}='{}'", name.as_ref()))
        .collect::<Vec<_>>()
        .join(" or ");
    format!("{tag}[{clauses}]")
}

/// Join segments into the absolute form sent as `xpath=`.
pub fn join(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

/// Split an absolute XPath back into segments, keeping predicates intact.
pub fn split(xpath: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    for ch in xpath.chars() {
        match ch {
            '\'' => {
                quoted = !quoted;
                current.push(ch);
            }
            '[' if !quoted => {
                depth += 1;
                current.push(ch);
            }
            ']' if !quoted => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '/' if !quoted && depth == 0 => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn owned(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| (*s).to_string()).collect()
}

/// `config/devices/entry[@name='localhost.localdomain']`.
pub fn device_prefix() -> Vec<String> {
    vec![
        "config".to_string(),
        "devices".to_string(),
        entry_xpath(&[LOCALHOST]),
    ]
}

/// Firewall vsys prefix; empty selects `vsys1`, `shared` the shared root.
pub fn vsys_prefix(vsys: &str) -> Vec<String> {
    let vsys = if vsys.is_empty() { "vsys1" } else { vsys };
    if vsys == "shared" {
        return owned(&["config", "shared"]);
    }
    let mut out = device_prefix();
    out.push("vsys".to_string());
    out.push(entry_xpath(&[vsys]));
    out
}

/// Panorama device-group prefix; empty or `shared` selects Panorama shared.
pub fn device_group_prefix(device_group: &str) -> Vec<String> {
    if device_group.is_empty() || device_group == "shared" {
        return owned(&["config", "shared"]);
    }
    let mut out = device_prefix();
    out.push("device-group".to_string());
    out.push(entry_xpath(&[device_group]));
    out
}

/// A Panorama template or template stack reference.
///
/// Exactly one of the two names must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRef {
    pub template: String,
    pub template_stack: String,
}

impl TemplateRef {
    pub fn template(name: impl Into<String>) -> Self {
        Self {
            template: name.into(),
            template_stack: String::new(),
        }
    }

    pub fn stack(name: impl Into<String>) -> Self {
        Self {
            template: String::new(),
            template_stack: name.into(),
        }
    }

    /// `config/devices/.../template/entry[@name=T]` or the stack equivalent.
    pub fn prefix(&self) -> Result<Vec<String>, PangoError> {
        let (container, name) = match (self.template.is_empty(), self.template_stack.is_empty()) {
            (false, true) => ("template", &self.template),
            (true, false) => ("template-stack", &self.template_stack),
            (true, true) => {
                return Err(PangoError::validation(
                    "template or template stack must be specified",
                ))
            }
            (false, false) => {
                return Err(PangoError::validation(
                    "template and template stack are mutually exclusive",
                ))
            }
        };
        let mut out = device_prefix();
        out.push(container.to_string());
        out.push(entry_xpath(&[name]));
        Ok(out)
    }

    /// Device prefix inside the template's own configuration tree.
    pub fn device_prefix(&self) -> Result<Vec<String>, PangoError> {
        let mut out = self.prefix()?;
        out.extend(device_prefix());
        Ok(out)
    }
}

/// Location of a policy object (address, service, tag, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectScope {
    /// Firewall vsys; `""` is `vsys1`, `shared` the firewall shared root.
    Vsys(String),
    /// Panorama device group; `""` or `shared` is Panorama shared.
    DeviceGroup(String),
}

impl ObjectScope {
    pub fn vsys(name: impl Into<String>) -> Self {
        Self::Vsys(name.into())
    }

    pub fn device_group(name: impl Into<String>) -> Self {
        Self::DeviceGroup(name.into())
    }

    pub fn prefix(&self) -> Vec<String> {
        match self {
            Self::Vsys(vsys) => vsys_prefix(vsys),
            Self::DeviceGroup(dg) => device_group_prefix(dg),
        }
    }
}

impl Default for ObjectScope {
    fn default() -> Self {
        Self::Vsys(String::new())
    }
}

/// Location of device-level network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkScope {
    /// The firewall's own configuration.
    #[default]
    Firewall,
    /// A Panorama template or template stack.
    Template(TemplateRef),
}

impl NetworkScope {
    pub fn template(name: impl Into<String>) -> Self {
        Self::Template(TemplateRef::template(name))
    }

    pub fn template_stack(name: impl Into<String>) -> Self {
        Self::Template(TemplateRef::stack(name))
    }

    /// `.../config/devices/entry[@name='localhost.localdomain']`.
    pub fn device_prefix(&self) -> Result<Vec<String>, PangoError> {
        match self {
            Self::Firewall => Ok(device_prefix()),
            Self::Template(tmpl) => tmpl.device_prefix(),
        }
    }

    /// `.../config/devices/entry[@name='localhost.localdomain']/network`.
    pub fn network_prefix(&self) -> Result<Vec<String>, PangoError> {
        let mut out = self.device_prefix()?;
        out.push("network".to_string());
        Ok(out)
    }

    /// `(template, template_stack)` as passed to vsys import/unimport.
    pub fn import_target(&self) -> (String, String) {
        match self {
            Self::Firewall => (String::new(), String::new()),
            Self::Template(tmpl) => (tmpl.template.clone(), tmpl.template_stack.clone()),
        }
    }
}

/// A vsys on a firewall or inside a Panorama template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VsysScope {
    Firewall(String),
    Template { template: TemplateRef, vsys: String },
}

impl VsysScope {
    pub fn firewall(vsys: impl Into<String>) -> Self {
        Self::Firewall(vsys.into())
    }

    pub fn prefix(&self) -> Result<Vec<String>, PangoError> {
        match self {
            Self::Firewall(vsys) => Ok(vsys_prefix(vsys)),
            Self::Template { template, vsys } => {
                let mut out = template.prefix()?;
                out.extend(vsys_prefix(vsys));
                Ok(out)
            }
        }
    }
}

impl Default for VsysScope {
    fn default() -> Self {
        Self::Firewall(String::new())
    }
}

/// Panorama pre/post rulebase selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rulebase {
    #[default]
    Pre,
    Post,
}

impl Rulebase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre-rulebase",
            Self::Post => "post-rulebase",
        }
    }
}

/// Location of a policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RulebaseScope {
    /// Firewall vsys `rulebase`.
    Vsys(String),
    /// Panorama device group (or shared) pre/post rulebase.
    DeviceGroup {
        device_group: String,
        rulebase: Rulebase,
    },
}

impl RulebaseScope {
    pub fn vsys(name: impl Into<String>) -> Self {
        Self::Vsys(name.into())
    }

    pub fn device_group(name: impl Into<String>, rulebase: Rulebase) -> Self {
        Self::DeviceGroup {
            device_group: name.into(),
            rulebase,
        }
    }

    /// Path up to and including the rulebase segment.
    pub fn prefix(&self) -> Vec<String> {
        let (mut out, rulebase) = match self {
            Self::Vsys(vsys) => (vsys_prefix(vsys), "rulebase"),
            Self::DeviceGroup {
                device_group,
                rulebase,
            } => (device_group_prefix(device_group), rulebase.as_str()),
        };
        out.push(rulebase.to_string());
        out
    }

    pub fn rulebase_token(&self) -> &'static str {
        match self {
            Self::Vsys(_) => "rulebase",
            Self::DeviceGroup { rulebase, .. } => rulebase.as_str(),
        }
    }
}

impl Default for RulebaseScope {
    fn default() -> Self {
        Self::Vsys(String::new())
    }
}

/// Trim the last `n` segments of a path.
pub fn trim(path: &[String], n: usize) -> &[String] {
    &path[..path.len().saturating_sub(n)]
}

/// The local element name of a segment, without its predicate.
pub fn segment_tag(segment: &str) -> &str {
    segment.split('[').next().unwrap_or(segment)
}

/// Extract the quoted values out of a segment predicate.
pub fn segment_names(segment: &str) -> Vec<String> {
    let Some(start) = segment.find('[') else {
        return Vec::new();
    };
    let predicate = &segment[start..];
    let mut names = Vec::new();
    let mut rest = predicate;
    while let Some(open) = rest.find('\'') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('\'') else {
            break;
        };
        names.push(after[..close].to_string());
        rest = &after[close + 1..];
    }
    names
}

/// A parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    tag: String,
    names: Vec<String>,
    by_text: bool,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        Self {
            tag: segment_tag(raw).to_string(),
            names: segment_names(raw),
            by_text: raw.contains("text()"),
        }
    }

    fn matches(&self, node: &XmlNode) -> bool {
        if node.tag != self.tag {
            return false;
        }
        if self.names.is_empty() {
            return true;
        }
        let key = if self.by_text {
            node.text.as_deref()
        } else {
            node.attribute("name")
        };
        key.map(|k| self.names.iter().any(|n| n == k)).unwrap_or(false)
    }
}

/// Select every node addressed by `path`, whose first segment must name the
/// root element.
pub fn select<'a>(root: &'a XmlNode, path: &[String]) -> Vec<&'a XmlNode> {
    let Some((first, rest)) = path.split_first() else {
        return vec![root];
    };
    if !Segment::parse(first).matches(root) {
        return Vec::new();
    }
    let mut current = vec![root];
    for raw in rest {
        let segment = Segment::parse(raw);
        let seg = &segment;
        current = current
            .into_iter()
            .flat_map(|node| node.children.iter().filter(move |c| seg.matches(c)))
            .collect();
        if current.is_empty() {
            break;
        }
    }
    current
}

/// Walk `path` below `root`, creating missing nodes, and return the last one.
///
/// Segments with a single name predicate create `entry name="x"` (or
/// `member` text) nodes; multi-name predicates cannot be created.
pub fn ensure<'a>(root: &'a mut XmlNode, path: &[String]) -> Result<&'a mut XmlNode, PangoError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(root);
    };
    if !Segment::parse(first).matches(root) {
        return Err(PangoError::validation(format!(
            "path root {first:?} does not match <{}>",
            root.tag
        )));
    }
    let mut current = root;
    for raw in rest {
        let segment = Segment::parse(raw);
        if segment.names.len() > 1 {
            return Err(PangoError::validation(format!(
                "cannot create multi-name segment {raw:?}"
            )));
        }
        let idx = match current.children.iter().position(|c| segment.matches(c)) {
            Some(idx) => idx,
            None => {
                let mut node = XmlNode::new(segment.tag.clone());
                if let Some(name) = segment.names.first() {
                    if segment.by_text {
                        node.text = Some(name.clone());
                    } else {
                        node.attributes.insert("name".to_string(), name.clone());
                    }
                }
                current.children.push(node);
                current.children.len() - 1
            }
        };
        current = &mut current.children[idx];
    }
    Ok(current)
}

/// Remove every node addressed by `path`; returns how many were removed.
pub fn remove(root: &mut XmlNode, path: &[String]) -> usize {
    let Some((last, parent)) = path.split_last() else {
        return 0;
    };
    let segment = Segment::parse(last);
    let parents = select_mut(root, parent);
    let mut removed = 0;
    for node in parents {
        let before = node.children.len();
        node.children.retain(|c| !segment.matches(c));
        removed += before - node.children.len();
    }
    removed
}

/// Mutable variant of [`select`] for single-valued paths.
pub fn select_mut<'a>(root: &'a mut XmlNode, path: &[String]) -> Vec<&'a mut XmlNode> {
    let Some((first, rest)) = path.split_first() else {
        return vec![root];
    };
    if !Segment::parse(first).matches(root) {
        return Vec::new();
    }
    let mut current = vec![root];
    for raw in rest {
        let segment = Segment::parse(raw);
        let seg = &segment;
        current = current
            .into_iter()
            .flat_map(|node| node.children.iter_mut().filter(move |c| seg.matches(c)))
            .collect();
        if current.is_empty() {
            break;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use panos_xml::parse;

    use super::*;

    #[test]
    fn entry_xpath_forms() {
        let none: [&str; 0] = [];
        assert_eq!(entry_xpath(&none), "entry");
        assert_eq!(entry_xpath(&["a"]), "entry[@name='a']");
        assert_eq!(entry_xpath(&["a", "b"]), "entry[@name='a' or @name='b']");
        assert_eq!(member_xpath(&["x", "y"]), "member[text()='x' or text()='y']");
    }

    #[test]
    fn vsys_prefix_defaults_and_shared() {
        assert_eq!(
            join(&vsys_prefix("")),
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']"
        );
        assert_eq!(join(&vsys_prefix("shared")), "/config/shared");
    }

    #[test]
    fn device_group_prefix_shared() {
        assert_eq!(join(&device_group_prefix("")), "/config/shared");
        assert_eq!(
            join(&device_group_prefix("DG1")),
            "/config/devices/entry[@name='localhost.localdomain']/device-group/entry[@name='DG1']"
        );
    }

    #[test]
    fn template_requires_exactly_one_name() {
        assert!(TemplateRef::default().prefix().is_err());
        let both = TemplateRef {
            template: "t".to_string(),
            template_stack: "ts".to_string(),
        };
        assert!(both.prefix().is_err());
        assert_eq!(
            join(&TemplateRef::stack("ts").prefix().expect("prefix")),
            "/config/devices/entry[@name='localhost.localdomain']/template-stack/entry[@name='ts']"
        );
    }

    #[test]
    fn template_vsys_nests_device_prefix() {
        let scope = VsysScope::Template {
            template: TemplateRef::template("t1"),
            vsys: "vsys2".to_string(),
        };
        assert_eq!(
            join(&scope.prefix().expect("prefix")),
            "/config/devices/entry[@name='localhost.localdomain']/template/entry[@name='t1']/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys2']"
        );
    }

    #[test]
    fn split_keeps_slashes_inside_predicates() {
        let path = split("/config/devices/entry[@name='localhost.localdomain']/network/interface/ethernet/entry[@name='ethernet1/1' or @name='ethernet1/2']");
        assert_eq!(path.len(), 7);
        assert_eq!(path[6], "entry[@name='ethernet1/1' or @name='ethernet1/2']");
        assert_eq!(segment_names(&path[6]), vec!["ethernet1/1", "ethernet1/2"]);
        assert_eq!(segment_tag(&path[6]), "entry");
    }

    #[test]
    fn select_honours_name_and_text_predicates() {
        let root = parse(
            br#"<config><shared><address><entry name="a"/><entry name="b"/><entry name="c"/></address><tag><member>x</member><member>y</member></tag></shared></config>"#,
        )
        .expect("parse");
        let hits = select(&root, &split("/config/shared/address/entry[@name='a' or @name='c']"));
        assert_eq!(hits.len(), 2);
        let members = select(&root, &split("/config/shared/tag/member[text()='y']"));
        assert_eq!(members.len(), 1);
        assert!(select(&root, &split("/other/shared")).is_empty());
    }

    #[test]
    fn ensure_creates_named_entries() {
        let mut root = parse(b"<config/>").expect("parse");
        let node = ensure(&mut root, &vsys_prefix("vsys2")).expect("ensure");
        node.children.push(panos_xml::XmlNode::new("address"));
        let hits = select(&root, &vsys_prefix("vsys2"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].attribute("name"), Some("vsys2"));
    }

    #[test]
    fn remove_drops_all_matches() {
        let mut root = parse(
            br#"<config><shared><address><entry name="a"/><entry name="b"/><entry name="c"/></address></shared></config>"#,
        )
        .expect("parse");
        let removed = remove(&mut root, &split("/config/shared/address/entry[@name='a' or @name='b']"));
        assert_eq!(removed, 2);
        assert_eq!(select(&root, &split("/config/shared/address/entry")).len(), 1);
    }

    #[test]
    fn rulebase_prefixes() {
        assert_eq!(
            join(&RulebaseScope::device_group("DG1", Rulebase::Post).prefix()),
            "/config/devices/entry[@name='localhost.localdomain']/device-group/entry[@name='DG1']/post-rulebase"
        );
        assert_eq!(
            RulebaseScope::vsys("vsys1").prefix().last().map(String::as_str),
            Some("rulebase")
        );
    }
}
