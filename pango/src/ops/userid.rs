//! User-ID updates.
//!
//! A [`UserIdMessage`] batches logins, logouts, IP and user tag changes and
//! group membership into one `<uid-message>`. The device applies what it can
//! and marks each rejected entry with a `message` attribute; those come back
//! together as [`PangoError::UserId`].

use std::collections::BTreeMap;

use panos_xml::{parse, XmlNode};
use serde::Serialize;
use tracing::{info, warn};

use crate::client::Client;
use crate::codec::require;
use crate::error::{PangoError, UidFailure};
use crate::version::V9_1;
use crate::wire::error_message;

/// Payload sections, in the order they are emitted.
const SECTIONS: [&str; 7] = [
    "login",
    "logout",
    "register",
    "unregister",
    "groups",
    "register-user",
    "unregister-user",
];

/// A tag with an optional expiry in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimedTag {
    pub name: String,
    pub timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct UserMapping {
    user: String,
    ip: String,
    timeout: u32,
}

/// One pending User-ID update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserIdMessage {
    login: Vec<UserMapping>,
    logout: Vec<UserMapping>,
    register: BTreeMap<String, Vec<String>>,
    unregister: BTreeMap<String, Vec<String>>,
    groups: BTreeMap<String, Vec<String>>,
    register_user: BTreeMap<String, Vec<TimedTag>>,
    unregister_user: BTreeMap<String, Vec<String>>,
}

impl UserIdMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `user` to `ip`; a zero timeout keeps the device default.
    pub fn login(mut self, user: impl Into<String>, ip: impl Into<String>, timeout: u32) -> Self {
        self.login.push(UserMapping {
            user: user.into(),
            ip: ip.into(),
            timeout,
        });
        self
    }

    pub fn logout(mut self, user: impl Into<String>, ip: impl Into<String>) -> Self {
        self.logout.push(UserMapping {
            user: user.into(),
            ip: ip.into(),
            timeout: 0,
        });
        self
    }

    /// Add `tags` to `ip`.
    pub fn register<S: AsRef<str>>(mut self, ip: impl Into<String>, tags: &[S]) -> Self {
        self.register
            .entry(ip.into())
            .or_default()
            .extend(tags.iter().map(|t| t.as_ref().to_string()));
        self
    }

    /// Remove `tags` from `ip`; no tags removes every tag.
    pub fn unregister<S: AsRef<str>>(mut self, ip: impl Into<String>, tags: &[S]) -> Self {
        self.unregister
            .entry(ip.into())
            .or_default()
            .extend(tags.iter().map(|t| t.as_ref().to_string()));
        self
    }

    /// Replace the membership of group `name`.
    pub fn group<S: AsRef<str>>(mut self, name: impl Into<String>, users: &[S]) -> Self {
        self.groups.insert(
            name.into(),
            users.iter().map(|u| u.as_ref().to_string()).collect(),
        );
        self
    }

    /// Tag `user` (PAN-OS 9.1+).
    pub fn register_user(mut self, user: impl Into<String>, tags: &[TimedTag]) -> Self {
        self.register_user
            .entry(user.into())
            .or_default()
            .extend(tags.iter().cloned());
        self
    }

    /// Untag `user`; no tags removes every tag (PAN-OS 9.1+).
    pub fn unregister_user<S: AsRef<str>>(mut self, user: impl Into<String>, tags: &[S]) -> Self {
        self.unregister_user
            .entry(user.into())
            .or_default()
            .extend(tags.iter().map(|t| t.as_ref().to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.login.is_empty()
            && self.logout.is_empty()
            && self.register.is_empty()
            && self.unregister.is_empty()
            && self.groups.is_empty()
            && self.register_user.is_empty()
            && self.unregister_user.is_empty()
    }

    fn uses_user_tags(&self) -> bool {
        !self.register_user.is_empty() || !self.unregister_user.is_empty()
    }

    /// The `<uid-message>` document.
    pub fn element(&self) -> XmlNode {
        let mut payload = XmlNode::new("payload");
        let mut section = |tag: &str, entries: Vec<XmlNode>| {
            if !entries.is_empty() {
                let mut node = XmlNode::new(tag);
                node.children = entries;
                payload.children.push(node);
            }
        };

        section("login", self.login.iter().map(mapping_entry).collect());
        section("logout", self.logout.iter().map(mapping_entry).collect());
        section(
            "register",
            self.register.iter().map(|(ip, tags)| ip_entry(ip, tags)).collect(),
        );
        section(
            "unregister",
            self.unregister.iter().map(|(ip, tags)| ip_entry(ip, tags)).collect(),
        );
        section(
            "groups",
            self.groups
                .iter()
                .map(|(name, users)| {
                    let mut members = XmlNode::new("members");
                    members.children = users
                        .iter()
                        .map(|u| XmlNode::new("entry").attr("name", u.as_str()))
                        .collect();
                    XmlNode::new("entry").attr("name", name.as_str()).child(members)
                })
                .collect(),
        );
        section(
            "register-user",
            self.register_user
                .iter()
                .map(|(user, tags)| {
                    let mut tag = XmlNode::new("tag");
                    tag.children = tags
                        .iter()
                        .map(|t| {
                            let member = XmlNode::with_text("member", t.name.as_str());
                            if t.timeout > 0 {
                                member.attr("timeout", t.timeout.to_string())
                            } else {
                                member
                            }
                        })
                        .collect();
                    XmlNode::new("entry").attr("user", user.as_str()).child(tag)
                })
                .collect(),
        );
        section(
            "unregister-user",
            self.unregister_user
                .iter()
                .map(|(user, tags)| tagged_entry("user", user, tags))
                .collect(),
        );

        XmlNode::new("uid-message")
            .child(XmlNode::with_text("version", "1.0"))
            .child(XmlNode::with_text("type", "update"))
            .child(payload)
    }
}

fn mapping_entry(m: &UserMapping) -> XmlNode {
    let entry = XmlNode::new("entry")
        .attr("name", m.user.as_str())
        .attr("ip", m.ip.as_str());
    if m.timeout > 0 {
        entry.attr("timeout", m.timeout.to_string())
    } else {
        entry
    }
}

fn ip_entry(ip: &str, tags: &[String]) -> XmlNode {
    tagged_entry("ip", ip, tags)
}

fn tagged_entry(key: &str, value: &str, tags: &[String]) -> XmlNode {
    let entry = XmlNode::new("entry").attr(key, value);
    if tags.is_empty() {
        return entry;
    }
    let mut tag = XmlNode::new("tag");
    tag.children = tags
        .iter()
        .map(|t| XmlNode::with_text("member", t.as_str()))
        .collect();
    entry.child(tag)
}

/// Send `msg` to `vsys`.
///
/// Empty messages are not sent.
pub fn send(client: &dyn Client, msg: &UserIdMessage, vsys: &str) -> Result<(), PangoError> {
    if msg.is_empty() {
        return Ok(());
    }
    if msg.uses_user_tags() {
        require("user tagging", &V9_1, &client.versioning())?;
    }
    let element = msg.element().to_string();
    info!(target: "pango::uid", vsys, sections = %sections(msg), "(uid) update");
    let body = client.uid(&element, vsys)?;
    let root = parse(&body)?;

    let failures = failures(&root);
    if !failures.is_empty() {
        warn!(target: "pango::uid", vsys, failed = failures.len(), "(uid) rejected entries");
        return Err(PangoError::UserId(failures));
    }
    if root.attribute("status") == Some("error") {
        return Err(PangoError::Panos {
            code: root.attribute("code").and_then(|c| c.parse().ok()),
            message: error_message(&root),
        });
    }
    Ok(())
}

fn sections(msg: &UserIdMessage) -> String {
    msg.element()
        .find(&["payload"])
        .map(|p| {
            p.children
                .iter()
                .map(|c| c.tag.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

/// Collect every entry the device marked with a `message`.
fn failures(root: &XmlNode) -> Vec<UidFailure> {
    let mut out = Vec::new();
    for action in SECTIONS {
        for section in root.descendants(action) {
            for entry in section.get_children("entry") {
                let Some(message) = entry.attribute("message") else {
                    continue;
                };
                let target = ["user", "ip", "name"]
                    .iter()
                    .find_map(|k| entry.attribute(k))
                    .unwrap_or_default();
                out.push(UidFailure {
                    action: action.to_string(),
                    target: target.to_string(),
                    message: message.to_string(),
                });
            }
        }
    }
    out
}
