//! An in-memory PAN-OS device.
//!
//! [`OfflineDevice`] answers the configuration verbs against a saved
//! configuration tree, with the same merge/replace/remove/reorder semantics
//! the XML API applies. Every request is kept in a journal so callers can
//! assert on the exact sequence that was sent. Commits copy the candidate
//! tree over the running one and are reported as already-finished jobs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use panos_xml::{parse, parse_file, write_file, XmlNode};
use tracing::debug;

use crate::client::{Client, Export, ExportRequest, ImportKind, ImportRequest, LogQuery, MovePosition};
use crate::error::PangoError;
use crate::version::{PluginInfo, Version};
use crate::xpath::{
    device_prefix, ensure, entry_xpath, remove, segment_names, segment_tag, select, select_mut,
    split, TemplateRef,
};

/// One journaled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: &'static str,
    pub xpath: String,
    pub element: String,
}

struct State {
    candidate: XmlNode,
    running: XmlNode,
    journal: Vec<Request>,
    jobs: BTreeMap<u64, String>,
}

/// A [`Client`] backed by a configuration tree instead of a device.
pub struct OfflineDevice {
    version: Version,
    plugins: Vec<PluginInfo>,
    clock: Option<DateTime<FixedOffset>>,
    state: Mutex<State>,
}

impl OfflineDevice {
    /// An empty `<config>` tree with the device entry present.
    pub fn new(version: Version) -> Self {
        let config = XmlNode::new("config")
            .attr("version", version.to_string())
            .child(
                XmlNode::new("devices")
                    .child(XmlNode::new("entry").attr("name", crate::xpath::LOCALHOST)),
            )
            .child(XmlNode::new("shared"));
        Self::with_config(version, config)
    }

    /// Serve `config`, which must be rooted at `<config>`.
    pub fn with_config(version: Version, config: XmlNode) -> Self {
        Self {
            version,
            plugins: Vec::new(),
            clock: None,
            state: Mutex::new(State {
                running: config.clone(),
                candidate: config,
                journal: Vec::new(),
                jobs: BTreeMap::new(),
            }),
        }
    }

    pub fn from_xml(version: Version, xml: &[u8]) -> Result<Self, PangoError> {
        let config = parse(xml)?;
        Self::checked(version, config)
    }

    /// Load a saved configuration file.
    pub fn load(version: Version, path: &Path) -> Result<Self, PangoError> {
        let config = parse_file(path)?;
        Self::checked(version, config)
    }

    fn checked(version: Version, config: XmlNode) -> Result<Self, PangoError> {
        if config.tag != "config" {
            return Err(PangoError::decode(
                "configuration",
                format!("expected <config> root, found <{}>", config.tag),
            ));
        }
        Ok(Self::with_config(version, config))
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginInfo>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Pin the device clock; otherwise the local clock is reported.
    pub fn with_clock(mut self, clock: DateTime<FixedOffset>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Snapshot of the candidate configuration.
    pub fn candidate(&self) -> XmlNode {
        self.lock().candidate.clone()
    }

    /// Snapshot of the running configuration.
    pub fn running(&self) -> XmlNode {
        self.lock().running.clone()
    }

    /// Every request received so far, oldest first.
    pub fn history(&self) -> Vec<Request> {
        self.lock().journal.clone()
    }

    /// Write the candidate configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PangoError> {
        let candidate = self.candidate();
        write_file(&candidate, path)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Journal a request and hand back the locked state.
    fn begin(&self, verb: &'static str, xpath: &str, element: &str) -> MutexGuard<'_, State> {
        debug!(target: "pango::offline", verb, xpath, "offline request");
        let mut state = self.lock();
        state.journal.push(Request {
            verb,
            xpath: xpath.to_string(),
            element: element.to_string(),
        });
        state
    }

    fn retrieve(&self, verb: &'static str, xpath: &str) -> Result<Vec<u8>, PangoError> {
        let state = self.begin(verb, xpath, "");
        let tree = if verb == "show" {
            &state.running
        } else {
            &state.candidate
        };
        let found = select(tree, &split(xpath));
        if found.is_empty() && verb == "show" {
            return Err(peer_error("No such node"));
        }
        let mut result = XmlNode::new("result")
            .attr("total-count", found.len().to_string())
            .attr("count", found.len().to_string());
        result.children = found.into_iter().cloned().collect();
        Ok(success(result))
    }
}

fn peer_error(message: impl Into<String>) -> PangoError {
    PangoError::Panos {
        code: None,
        message: message.into(),
    }
}

fn success(result: XmlNode) -> Vec<u8> {
    XmlNode::new("response")
        .attr("status", "success")
        .child(result)
        .to_string()
        .into_bytes()
}

fn ok_message(message: &str) -> Vec<u8> {
    XmlNode::new("response")
        .attr("status", "success")
        .child(XmlNode::with_text("msg", message))
        .to_string()
        .into_bytes()
}

/// Key a child is matched on when merging: member text, entry name, or
/// just the tag for singleton elements.
fn same_slot(a: &XmlNode, b: &XmlNode) -> bool {
    if a.tag != b.tag {
        return false;
    }
    if a.tag == "member" {
        return a.text == b.text;
    }
    a.attribute("name") == b.attribute("name")
}

/// PAN-OS `set` semantics: recurse into matching children, append new ones,
/// replace leaf text.
fn merge(target: &mut XmlNode, incoming: XmlNode) {
    target.attributes.extend(incoming.attributes);
    if incoming.children.is_empty() {
        if incoming.text.is_some() {
            target.text = incoming.text;
        }
        return;
    }
    target.text = None;
    for child in incoming.children {
        match target.children.iter_mut().find(|c| same_slot(c, &child)) {
            Some(existing) if child.tag != "member" => merge(existing, child),
            Some(_) => {}
            None => target.children.push(child),
        }
    }
}

fn parse_element(element: &str) -> Result<XmlNode, PangoError> {
    parse(element.as_bytes()).map_err(PangoError::from)
}

/// `.../config/devices/entry` for the firewall or a template (stack).
fn import_prefix(template: &str, template_stack: &str) -> Result<Vec<String>, PangoError> {
    if template.is_empty() && template_stack.is_empty() {
        return Ok(device_prefix());
    }
    let tmpl = TemplateRef {
        template: template.to_string(),
        template_stack: template_stack.to_string(),
    };
    tmpl.device_prefix()
}

impl Client for OfflineDevice {
    fn versioning(&self) -> Version {
        self.version.clone()
    }

    fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins.clone()
    }

    fn clock(&self) -> Result<DateTime<FixedOffset>, PangoError> {
        Ok(self.clock.unwrap_or_else(|| Local::now().fixed_offset()))
    }

    fn get(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        self.retrieve("get", xpath)
    }

    fn show(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        self.retrieve("show", xpath)
    }

    fn set(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError> {
        let incoming = parse_element(element)?;
        let mut state = self.begin("set", xpath, element);
        let parent = ensure(&mut state.candidate, &split(xpath))?;
        match parent.children.iter_mut().find(|c| same_slot(c, &incoming)) {
            Some(existing) if incoming.tag != "member" => merge(existing, incoming),
            Some(_) => {}
            None => parent.children.push(incoming),
        }
        Ok(ok_message("command succeeded"))
    }

    fn edit(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError> {
        let incoming = parse_element(element)?;
        let mut state = self.begin("edit", xpath, element);
        let path = split(xpath);
        let Some((last, parent_path)) = path.split_last() else {
            return Err(peer_error("edit needs a target path"));
        };
        if segment_tag(last) != incoming.tag {
            return Err(peer_error(format!(
                "edit breaks config validity: <{}> cannot replace {last}",
                incoming.tag
            )));
        }
        let names = segment_names(last);
        if names.len() > 1 {
            return Err(peer_error("edit addresses more than one node"));
        }
        if let Some(name) = names.first() {
            let key = if last.contains("text()") {
                incoming.text.as_deref()
            } else {
                incoming.attribute("name")
            };
            if key != Some(name.as_str()) {
                return Err(peer_error(format!(
                    "edit breaks config validity: element does not match {last}"
                )));
            }
        }
        let parent = ensure(&mut state.candidate, parent_path)?;
        match parent.children.iter_mut().find(|c| same_slot(c, &incoming)) {
            Some(existing) => *existing = incoming,
            None => parent.children.push(incoming),
        }
        Ok(ok_message("command succeeded"))
    }

    fn delete(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        let mut state = self.begin("delete", xpath, "");
        remove(&mut state.candidate, &split(xpath));
        Ok(ok_message("command succeeded"))
    }

    fn move_entry(&self, xpath: &str, position: &MovePosition) -> Result<Vec<u8>, PangoError> {
        let element = match position.anchor() {
            Some(dst) => format!("{} {dst}", position.where_param()),
            None => position.where_param().to_string(),
        };
        let mut state = self.begin("move", xpath, &element);
        let path = split(xpath);
        let Some((last, parent_path)) = path.split_last() else {
            return Err(peer_error("move needs a target path"));
        };
        let tag = segment_tag(last).to_string();
        let name = segment_names(last)
            .into_iter()
            .next()
            .ok_or_else(|| peer_error(format!("move target {last} has no name")))?;
        let mut parents = select_mut(&mut state.candidate, parent_path);
        let Some(parent) = parents.pop() else {
            return Err(peer_error("No such node"));
        };
        let siblings: Vec<usize> = parent
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.tag == tag)
            .map(|(i, _)| i)
            .collect();
        let find = |children: &[XmlNode], wanted: &str| {
            children
                .iter()
                .position(|c| c.tag == tag && c.attribute("name") == Some(wanted))
        };
        let from = find(&parent.children, &name).ok_or_else(|| peer_error("No such node"))?;

        match position {
            MovePosition::Top if siblings.first() == Some(&from) => {
                return Err(peer_error(format!("{name} is already at the top")));
            }
            MovePosition::Bottom if siblings.last() == Some(&from) => {
                return Err(peer_error(format!("{name} is already at the bottom")));
            }
            _ => {}
        }

        let node = parent.children.remove(from);
        let to = match position {
            MovePosition::Top => siblings.first().copied().unwrap_or(0),
            MovePosition::Bottom => {
                let last = siblings.last().copied().unwrap_or(from);
                last.min(parent.children.len())
            }
            MovePosition::Before(dst) | MovePosition::After(dst) => {
                let Some(at) = find(&parent.children, dst) else {
                    parent.children.insert(from, node);
                    return Err(peer_error(format!("{dst} does not exist")));
                };
                if matches!(position, MovePosition::After(_)) {
                    at + 1
                } else {
                    at
                }
            }
        };
        parent.children.insert(to, node);
        Ok(ok_message("command succeeded"))
    }

    fn op(&self, cmd: &str, vsys: &str) -> Result<Vec<u8>, PangoError> {
        let state = self.begin("op", vsys, cmd);
        let request = parse_element(cmd)?;
        let job_id = request
            .get_text(&["jobs", "id"])
            .filter(|_| request.tag == "show")
            .and_then(|id| id.trim().parse::<u64>().ok());
        let Some(id) = job_id else {
            return Err(peer_error(format!(
                "offline device cannot run op command {}",
                request.tag
            )));
        };
        let Some(job_type) = state.jobs.get(&id) else {
            return Err(peer_error(format!("job {id} not found")));
        };
        let job = XmlNode::new("job")
            .child(XmlNode::with_text("id", id.to_string()))
            .child(XmlNode::with_text("type", job_type.as_str()))
            .child(XmlNode::with_text("status", "FIN"))
            .child(XmlNode::with_text("result", "OK"))
            .child(XmlNode::with_text("progress", "100"));
        Ok(success(XmlNode::new("result").child(job)))
    }

    fn uid(&self, message: &str, vsys: &str) -> Result<Vec<u8>, PangoError> {
        drop(self.begin("uid", vsys, message));
        Err(peer_error("offline device does not accept user-id updates"))
    }

    fn commit(&self, cmd: &str) -> Result<Vec<u8>, PangoError> {
        let mut state = self.begin("commit", "", cmd);
        if state.candidate == state.running {
            return Ok(ok_message("There are no changes to commit."));
        }
        state.running = state.candidate.clone();
        let id = state.jobs.keys().next_back().copied().unwrap_or(0) + 1;
        state.jobs.insert(id, "Commit".to_string());
        let result = XmlNode::new("result")
            .child(XmlNode::new("msg").child(XmlNode::with_text(
                "line",
                format!("Commit job enqueued with jobid {id}"),
            )))
            .child(XmlNode::with_text("job", id.to_string()));
        Ok(success(result))
    }

    fn log(&self, query: &LogQuery) -> Result<Vec<u8>, PangoError> {
        drop(self.begin("log", &query.log_type, &query.query));
        Err(peer_error("offline device keeps no logs"))
    }

    fn log_result(&self, job_id: u64) -> Result<Vec<u8>, PangoError> {
        drop(self.begin("log-result", &job_id.to_string(), ""));
        Err(peer_error("offline device keeps no logs"))
    }

    fn import(&self, request: &ImportRequest) -> Result<Vec<u8>, PangoError> {
        drop(self.begin("import", &request.category, &request.filename));
        Err(peer_error("offline device does not accept file imports"))
    }

    fn export(&self, request: &ExportRequest) -> Result<Export, PangoError> {
        drop(self.begin("export", &request.category, ""));
        Err(peer_error("offline device does not export files"))
    }

    fn vsys_import(
        &self,
        kind: ImportKind,
        template: &str,
        template_stack: &str,
        vsys: &str,
        names: &[String],
    ) -> Result<(), PangoError> {
        let vsys = if vsys.is_empty() { "vsys1" } else { vsys };
        let element = format!("{kind}: {}", names.join(","));
        let mut state = self.begin("vsys-import", vsys, &element);
        let mut path = import_prefix(template, template_stack)?;
        path.extend([
            "vsys".to_string(),
            entry_xpath(&[vsys]),
            "import".to_string(),
            "network".to_string(),
            kind.as_str().to_string(),
        ]);
        let list = ensure(&mut state.candidate, &path)?;
        for name in names {
            if !list.children.iter().any(|m| m.text.as_deref() == Some(name.as_str())) {
                list.children.push(XmlNode::with_text("member", name.as_str()));
            }
        }
        Ok(())
    }

    fn vsys_unimport(
        &self,
        kind: ImportKind,
        template: &str,
        template_stack: &str,
        names: &[String],
    ) -> Result<(), PangoError> {
        let element = format!("{kind}: {}", names.join(","));
        let mut state = self.begin("vsys-unimport", "", &element);
        let mut path = import_prefix(template, template_stack)?;
        path.extend([
            "vsys".to_string(),
            "entry".to_string(),
            "import".to_string(),
            "network".to_string(),
            kind.as_str().to_string(),
        ]);
        for list in select_mut(&mut state.candidate, &path) {
            list.children
                .retain(|m| !names.iter().any(|n| m.text.as_deref() == Some(n.as_str())));
        }
        Ok(())
    }

    fn sleep(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::OfflineDevice;
    use crate::client::{Client, MovePosition};
    use crate::version::V9_0;
    use crate::wire::parse_response;
    use crate::xpath::{join, vsys_prefix};

    fn security_path() -> String {
        let mut path = vsys_prefix("vsys1");
        path.extend(["rulebase".to_string(), "security".to_string()]);
        join(&path)
    }

    fn rules_path() -> String {
        format!("{}/rules", security_path())
    }

    fn names(device: &OfflineDevice) -> Vec<String> {
        let body = device.get(&format!("{}/entry", rules_path())).expect("get");
        parse_response(&body)
            .expect("response")
            .get_child("result")
            .map(|r| {
                r.children
                    .iter()
                    .filter_map(|c| c.attribute("name").map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn seeded() -> OfflineDevice {
        let device = OfflineDevice::new(V9_0);
        device
            .set(
                &security_path(),
                r#"<rules><entry name="r1"/><entry name="r2"/><entry name="r3"/></rules>"#,
            )
            .expect("seed");
        device
    }

    #[test]
    fn set_merges_and_edit_replaces() {
        let device = OfflineDevice::new(V9_0);
        let container = format!("{}/address", join(&vsys_prefix("")));
        device
            .set(&container, r#"<entry name="a"><ip-netmask>10.0.0.1</ip-netmask><tag><member>x</member></tag></entry>"#)
            .expect("set");
        device
            .set(&container, r#"<entry name="a"><description>web</description><tag><member>y</member></tag></entry>"#)
            .expect("merge");
        let a = format!("{container}/entry[@name='a']");
        let body = device.get(&a).expect("get");
        assert_eq!(
            String::from_utf8(body).expect("utf8"),
            r#"<response status="success"><result count="1" total-count="1"><entry name="a"><ip-netmask>10.0.0.1</ip-netmask><tag><member>x</member><member>y</member></tag><description>web</description></entry></result></response>"#
        );

        device
            .edit(&a, r#"<entry name="a"><fqdn>www.example.com</fqdn></entry>"#)
            .expect("edit");
        let body = String::from_utf8(device.get(&a).expect("get")).expect("utf8");
        assert!(body.contains("<entry name=\"a\"><fqdn>www.example.com</fqdn></entry>"));
        assert!(device.edit(&a, r#"<entry name="b"/>"#).is_err());
    }

    #[test]
    fn get_is_empty_and_show_is_an_error_when_missing() {
        let device = OfflineDevice::new(V9_0);
        let path = format!("{}/address/entry[@name='nope']", join(&vsys_prefix("")));
        let body = device.get(&path).expect("get");
        let root = parse_response(&body).expect("response");
        assert!(root.get_child("result").map(|r| r.children.is_empty()).unwrap_or(false));
        let err = device.show(&path).expect_err("show");
        assert!(err.is_not_found());
    }

    #[test]
    fn moves_reorder_entries() {
        let device = seeded();
        let r3 = format!("{}/entry[@name='r3']", rules_path());
        device.move_entry(&r3, &MovePosition::Top).expect("top");
        assert_eq!(names(&device), vec!["r3", "r1", "r2"]);
        device
            .move_entry(&r3, &MovePosition::After("r1".to_string()))
            .expect("after");
        assert_eq!(names(&device), vec!["r1", "r3", "r2"]);
        device
            .move_entry(&r3, &MovePosition::Bottom)
            .expect("bottom");
        assert_eq!(names(&device), vec!["r1", "r2", "r3"]);
        let err = device
            .move_entry(&r3, &MovePosition::Bottom)
            .expect_err("already");
        assert!(err.is_already_positioned());
        let r1 = format!("{}/entry[@name='r1']", rules_path());
        device
            .move_entry(&r1, &MovePosition::Before("r3".to_string()))
            .expect("before");
        assert_eq!(names(&device), vec!["r2", "r1", "r3"]);
    }

    #[test]
    fn commit_promotes_the_candidate() {
        let device = seeded();
        assert_ne!(device.candidate(), device.running());
        let body = device.commit("<commit/>").expect("commit");
        assert!(String::from_utf8(body).expect("utf8").contains("<job>1</job>"));
        assert_eq!(device.candidate(), device.running());
        let body = device.commit("<commit/>").expect("commit");
        assert!(String::from_utf8(body).expect("utf8").contains("no changes"));
        assert!(device.uid("<uid-message/>", "").is_err());
    }

    #[test]
    fn delete_and_history() {
        let device = seeded();
        device
            .delete(&format!("{}/entry[@name='r1' or @name='r3']", rules_path()))
            .expect("delete");
        assert_eq!(names(&device), vec!["r2"]);
        let verbs: Vec<&str> = device.history().iter().map(|r| r.verb).collect();
        assert_eq!(verbs, vec!["set", "delete", "get"]);
    }
}
