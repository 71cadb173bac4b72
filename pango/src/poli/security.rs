//! Security policy rules.

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};

use crate::codec::{era, Normalizer, Object, Rule, Specifier, Wire};
use crate::error::PangoError;
use crate::version::{Version, V9_0};
use crate::wire::{
    decode_targets, encode_targets, entry_node, expect_tag, flag, members, text, Emit, Targets,
};
use crate::xpath::{entry_xpath, RulebaseScope};

const KIND: &str = "security rule";

pub const RULE_TYPES: [&str; 3] = ["universal", "intrazone", "interzone"];

pub const ACTIONS: [&str; 6] = [
    "allow",
    "deny",
    "drop",
    "reset-client",
    "reset-server",
    "reset-both",
];

/// Per-category security profiles attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityProfiles {
    pub virus: Vec<String>,
    pub spyware: Vec<String>,
    pub vulnerability: Vec<String>,
    pub url_filtering: Vec<String>,
    pub file_blocking: Vec<String>,
    pub wildfire_analysis: Vec<String>,
    pub data_filtering: Vec<String>,
}

impl SecurityProfiles {
    const TAGS: [&'static str; 7] = [
        "virus",
        "spyware",
        "vulnerability",
        "url-filtering",
        "file-blocking",
        "wildfire-analysis",
        "data-filtering",
    ];

    fn slots(&self) -> [&Vec<String>; 7] {
        [
            &self.virus,
            &self.spyware,
            &self.vulnerability,
            &self.url_filtering,
            &self.file_blocking,
            &self.wildfire_analysis,
            &self.data_filtering,
        ]
    }

    fn is_empty(&self) -> bool {
        self.slots().iter().all(|s| s.is_empty())
    }

    fn encode(&self) -> XmlNode {
        let mut node = XmlNode::new("profiles");
        for (tag, values) in Self::TAGS.iter().zip(self.slots()) {
            node.members_el(tag, values);
        }
        node
    }

    fn decode(node: &XmlNode) -> Self {
        let get = |tag: &str| members(node, &[tag]);
        Self {
            virus: get("virus"),
            spyware: get("spyware"),
            vulnerability: get("vulnerability"),
            url_filtering: get("url-filtering"),
            file_blocking: get("file-blocking"),
            wildfire_analysis: get("wildfire-analysis"),
            data_filtering: get("data-filtering"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityRule {
    pub name: String,
    /// `universal`, `intrazone`, `interzone` or empty.
    pub rule_type: String,
    pub description: String,
    pub tags: Vec<String>,
    pub source_zones: Vec<String>,
    pub source_addresses: Vec<String>,
    pub negate_source: bool,
    pub source_users: Vec<String>,
    pub hip_profiles: Vec<String>,
    pub destination_zones: Vec<String>,
    pub destination_addresses: Vec<String>,
    pub negate_destination: bool,
    pub applications: Vec<String>,
    pub services: Vec<String>,
    pub categories: Vec<String>,
    pub action: String,
    pub log_setting: String,
    pub log_start: bool,
    /// Always sent; PAN-OS defaults it to `yes` when absent.
    pub log_end: bool,
    pub disabled: bool,
    pub schedule: String,
    pub icmp_unreachable: bool,
    pub disable_server_response_inspection: bool,
    /// Profile group; exclusive with `profiles`.
    pub group: String,
    pub profiles: SecurityProfiles,
    /// Panorama push targets.
    pub targets: Targets,
    pub negate_target: bool,
    /// PAN-OS 9.0 and later; assigned by the device.
    pub uuid: String,
    /// PAN-OS 9.0 and later.
    pub group_tag: String,
}

impl Object for SecurityRule {
    const KIND: &'static str = KIND;
    type Location = RulebaseScope;

    fn name(&self) -> &str {
        &self.name
    }

    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn xpath(loc: &RulebaseScope, names: &[String]) -> Result<Vec<String>, PangoError> {
        let mut path = loc.prefix();
        path.push("security".to_string());
        path.push("rules".to_string());
        path.push(entry_xpath(names));
        Ok(path)
    }

    fn versioning(version: &Version) -> (Normalizer<Self>, Specifier<Self>) {
        if version.gte(&V9_0) {
            era::<EntryV2>()
        } else {
            era::<EntryV1>()
        }
    }
}

impl Rule for SecurityRule {
    const RULE_TYPE: &'static str = "security";
}

/// PAN-OS before 9.0. Later eras wrap it.
struct EntryV1 {
    rule: SecurityRule,
}

impl Wire for EntryV1 {
    type Entry = SecurityRule;

    fn specify(e: &SecurityRule) -> Result<Self, PangoError> {
        if !e.rule_type.is_empty() && !RULE_TYPES.contains(&e.rule_type.as_str()) {
            return Err(PangoError::validation(format!(
                "security rule {:?}: unknown rule type {:?}",
                e.name, e.rule_type
            )));
        }
        if !e.action.is_empty() && !ACTIONS.contains(&e.action.as_str()) {
            return Err(PangoError::validation(format!(
                "security rule {:?}: unknown action {:?}",
                e.name, e.action
            )));
        }
        if !e.group.is_empty() && !e.profiles.is_empty() {
            return Err(PangoError::validation(format!(
                "security rule {:?}: a profile group and individual profiles are mutually exclusive",
                e.name
            )));
        }
        Ok(Self {
            rule: SecurityRule {
                uuid: String::new(),
                group_tag: String::new(),
                ..e.clone()
            },
        })
    }

    fn normalize(self) -> SecurityRule {
        self.rule
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        expect_tag(node, "entry", KIND)?;
        let (targets, negate_target) = decode_targets(node.get_child("target"));
        let profiles = node
            .find(&["profile-setting", "profiles"])
            .map(SecurityProfiles::decode)
            .unwrap_or_default();
        let group = members(node, &["profile-setting", "group"])
            .into_iter()
            .next()
            .unwrap_or_default();
        Ok(Self {
            rule: SecurityRule {
                name: node.attribute("name").unwrap_or_default().to_string(),
                rule_type: text(node, &["rule-type"]),
                description: text(node, &["description"]),
                tags: members(node, &["tag"]),
                source_zones: members(node, &["from"]),
                source_addresses: members(node, &["source"]),
                negate_source: flag(node, &["negate-source"]),
                source_users: members(node, &["source-user"]),
                hip_profiles: members(node, &["hip-profiles"]),
                destination_zones: members(node, &["to"]),
                destination_addresses: members(node, &["destination"]),
                negate_destination: flag(node, &["negate-destination"]),
                applications: members(node, &["application"]),
                services: members(node, &["service"]),
                categories: members(node, &["category"]),
                action: text(node, &["action"]),
                log_setting: text(node, &["log-setting"]),
                log_start: flag(node, &["log-start"]),
                log_end: flag(node, &["log-end"]),
                disabled: flag(node, &["disabled"]),
                schedule: text(node, &["schedule"]),
                icmp_unreachable: flag(node, &["icmp-unreachable"]),
                disable_server_response_inspection: flag(
                    node,
                    &["option", "disable-server-response-inspection"],
                ),
                group,
                profiles,
                targets,
                negate_target,
                uuid: String::new(),
                group_tag: String::new(),
            },
        })
    }

    fn encode(&self) -> XmlNode {
        let r = &self.rule;
        let mut node = entry_node(&r.name);
        node.text_el("rule-type", &r.rule_type);
        node.text_el("description", &r.description);
        node.members_el("tag", &r.tags);
        node.members_el("from", &r.source_zones);
        node.members_el("to", &r.destination_zones);
        node.members_el("source", &r.source_addresses);
        node.members_el("source-user", &r.source_users);
        node.members_el("hip-profiles", &r.hip_profiles);
        node.members_el("destination", &r.destination_addresses);
        node.flag_el("negate-source", r.negate_source);
        node.flag_el("negate-destination", r.negate_destination);
        node.members_el("application", &r.applications);
        node.members_el("service", &r.services);
        node.members_el("category", &r.categories);
        node.text_el("action", &r.action);
        node.text_el("log-setting", &r.log_setting);
        node.flag_el("log-start", r.log_start);
        node.yes_no_el("log-end", r.log_end);
        node.flag_el("disabled", r.disabled);
        node.text_el("schedule", &r.schedule);
        node.flag_el("icmp-unreachable", r.icmp_unreachable);
        if r.disable_server_response_inspection {
            node.children.push(
                XmlNode::new("option")
                    .child(XmlNode::with_text("disable-server-response-inspection", "yes")),
            );
        }
        if !r.group.is_empty() {
            let mut setting = XmlNode::new("profile-setting");
            setting.members_el("group", &[r.group.clone()]);
            node.children.push(setting);
        } else if !r.profiles.is_empty() {
            node.children
                .push(XmlNode::new("profile-setting").child(r.profiles.encode()));
        }
        node.node_el(encode_targets(&r.targets, r.negate_target));
        node
    }
}

/// PAN-OS 9.0 and later: rule UUIDs and group tags.
struct EntryV2 {
    base: EntryV1,
    uuid: String,
    group_tag: String,
}

impl Wire for EntryV2 {
    type Entry = SecurityRule;

    fn specify(e: &SecurityRule) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::specify(e)?,
            uuid: e.uuid.clone(),
            group_tag: e.group_tag.clone(),
        })
    }

    fn normalize(self) -> SecurityRule {
        SecurityRule {
            uuid: self.uuid,
            group_tag: self.group_tag,
            ..self.base.normalize()
        }
    }

    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            base: EntryV1::decode(node)?,
            uuid: node.attribute("uuid").unwrap_or_default().to_string(),
            group_tag: text(node, &["group-tag"]),
        })
    }

    fn encode(&self) -> XmlNode {
        let mut node = self.base.encode();
        if !self.uuid.is_empty() {
            node.attributes.insert("uuid".to_string(), self.uuid.clone());
        }
        node.text_el("group-tag", &self.group_tag);
        node
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{SecurityProfiles, SecurityRule};
    use crate::codec::Object;
    use crate::version::{V8_1, V9_0};
    use crate::wire::Targets;

    fn members(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn web() -> SecurityRule {
        let mut targets = Targets::new();
        targets.insert("007951000012345".to_string(), members(&["vsys2"]));
        SecurityRule {
            name: "web".to_string(),
            source_zones: members(&["trust"]),
            destination_zones: members(&["untrust"]),
            source_addresses: members(&["any"]),
            destination_addresses: members(&["web-servers"]),
            applications: members(&["web-browsing", "ssl"]),
            services: members(&["application-default"]),
            action: "allow".to_string(),
            log_end: true,
            profiles: SecurityProfiles {
                virus: members(&["default"]),
                ..SecurityProfiles::default()
            },
            targets,
            negate_target: true,
            uuid: "0d5c7a7e-44d5-4e7e-9d5f-2f3c3d2a1b0c".to_string(),
            group_tag: "web".to_string(),
            ..SecurityRule::default()
        }
    }

    #[test]
    fn round_trips_on_nine() {
        let node = web().specify(&V9_0).expect("specify");
        assert_eq!(node.attribute("uuid"), Some(web().uuid.as_str()));
        assert_eq!(node.get_text(&["group-tag"]), Some("web"));
        assert_eq!(node.get_text(&["target", "negate"]), Some("yes"));
        assert_eq!(SecurityRule::normalize(&node, &V9_0).expect("normalize"), web());
    }

    #[test]
    fn nine_only_fields_are_dropped_before_nine() {
        let node = web().specify(&V8_1).expect("specify");
        assert!(node.attribute("uuid").is_none());
        assert!(node.get_child("group-tag").is_none());
        let back = SecurityRule::normalize(&node, &V8_1).expect("normalize");
        assert_eq!(back.uuid, "");
        assert_eq!(back.group_tag, "");
        assert_eq!(back.applications, web().applications);
    }

    #[test]
    fn log_end_is_always_sent() {
        let rule = SecurityRule {
            name: "quiet".to_string(),
            ..SecurityRule::default()
        };
        let node = rule.specify(&V8_1).expect("specify");
        assert_eq!(node.get_text(&["log-end"]), Some("no"));
    }

    #[test]
    fn group_and_profiles_are_exclusive() {
        let mut rule = web();
        rule.group = "strict".to_string();
        assert!(rule.specify(&V9_0).is_err());
        rule.profiles = SecurityProfiles::default();
        let node = rule.specify(&V9_0).expect("specify");
        assert_eq!(
            node.find(&["profile-setting", "group", "member"])
                .and_then(|m| m.text.as_deref()),
            Some("strict")
        );
    }
}
