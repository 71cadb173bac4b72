//! Rule hit counters.

use panos_xml::XmlNode;
use serde::Serialize;

use crate::error::PangoError;
use crate::namespace::Common;
use crate::wire::{entry_node, flag, number};

const KIND: &str = "rule hit count";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HitCount {
    pub name: String,
    pub latest: bool,
    pub hit_count: u64,
    /// Unix seconds; zero when never hit.
    pub last_hit_timestamp: u64,
    pub last_reset_timestamp: u64,
    pub first_hit_timestamp: u64,
    pub rule_creation_timestamp: u64,
    pub rule_modification_timestamp: u64,
}

impl HitCount {
    fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            latest: flag(node, &["latest"]),
            hit_count: number(node, &["hit-count"], KIND)?,
            last_hit_timestamp: number(node, &["last-hit-timestamp"], KIND)?,
            last_reset_timestamp: number(node, &["last-reset-timestamp"], KIND)?,
            first_hit_timestamp: number(node, &["first-hit-timestamp"], KIND)?,
            rule_creation_timestamp: number(node, &["rule-creation-timestamp"], KIND)?,
            rule_modification_timestamp: number(node, &["rule-modification-timestamp"], KIND)?,
        })
    }
}

/// `show rule-hit-count` request body.
pub(crate) fn request(rule_type: &str, vsys: &str, names: &[String]) -> XmlNode {
    let rules = if names.is_empty() {
        XmlNode::new("rules").child(XmlNode::new("all"))
    } else {
        let mut list = XmlNode::new("list");
        list.children = names
            .iter()
            .map(|n| XmlNode::with_text("member", n.as_str()))
            .collect();
        XmlNode::new("rules").child(list)
    };
    let rule_base = XmlNode::new("rule-base").child(entry_node(rule_type).child(rules));
    let vsys_name = XmlNode::new("vsys-name").child(entry_node(vsys).child(rule_base));
    XmlNode::new("show").child(XmlNode::new("rule-hit-count").child(XmlNode::new("vsys").child(vsys_name)))
}

/// Query hit counters for `names` (all rules when empty) of `rule_type` in
/// `vsys`.
pub(crate) fn query(
    common: &Common<'_>,
    rule_type: &str,
    vsys: &str,
    names: &[String],
) -> Result<Vec<HitCount>, PangoError> {
    let cmd = request(rule_type, vsys, names);
    let result = common
        .op(&cmd, "")
        .map_err(|e| e.during("hit count", format!("{rule_type} rules in {vsys}")))?;
    let mut out = Vec::new();
    for rules in result.descendants("rules") {
        for entry in rules.get_children("entry") {
            out.push(HitCount::decode(entry)?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::namespace::Policy;
    use crate::poli::security::SecurityRule;
    use crate::testing::ScriptedClient;
    use crate::version::V8_1;
    use crate::xpath::{Rulebase, RulebaseScope};

    #[test]
    fn counters_are_decoded() {
        let client = ScriptedClient::new(V8_1);
        client.push_result(
            r#"<rule-hit-count><vsys><entry name="vsys1"><rule-base><entry name="security"><rules><entry name="r1"><latest>yes</latest><hit-count>42</hit-count><last-hit-timestamp>1709283600</last-hit-timestamp><last-reset-timestamp>0</last-reset-timestamp><first-hit-timestamp>1709200000</first-hit-timestamp></entry></rules></entry></rule-base></entry></vsys></rule-hit-count>"#,
        );
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let counts = ns
            .hit_count(&RulebaseScope::vsys(""), &["r1".to_string()])
            .expect("hit count");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].name, "r1");
        assert_eq!(counts[0].hit_count, 42);
        assert!(counts[0].latest);
        assert_eq!(
            client.calls()[0].element,
            r#"<show><rule-hit-count><vsys><vsys-name><entry name="vsys1"><rule-base><entry name="security"><rules><list><member>r1</member></list></rules></entry></rule-base></entry></vsys-name></vsys></rule-hit-count></show>"#
        );
    }

    #[test]
    fn panorama_rulebases_are_rejected() {
        let client = ScriptedClient::new(V8_1);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let loc = RulebaseScope::device_group("DG1", Rulebase::Pre);
        assert!(ns.hit_count(&loc, &[]).is_err());
    }
}
