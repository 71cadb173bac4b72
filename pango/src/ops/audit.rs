//! Rule audit comments.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use panos_xml::XmlNode;
use serde::Serialize;

use super::logs;
use crate::client::{Direction, LogQuery};
use crate::error::PangoError;
use crate::namespace::Common;
use crate::wire::text;
use crate::xpath::{segment_names, segment_tag, split};

const LOG_POLL: Duration = Duration::from_millis(500);

/// One committed audit comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditComment {
    pub admin: String,
    pub comment: String,
    pub config_version: String,
    pub time_generated: String,
    pub time: Option<DateTime<FixedOffset>>,
}

/// Stage `comment` against the rule at `xpath`.
pub(crate) fn set(common: &Common<'_>, xpath: &str, comment: &str) -> Result<(), PangoError> {
    let cmd = XmlNode::new("set").child(
        XmlNode::new("audit-comment")
            .child(XmlNode::with_text("xpath", xpath))
            .child(XmlNode::with_text("comment", comment)),
    );
    common
        .op(&cmd, "")
        .map(drop)
        .map_err(|e| e.during("set audit comment", xpath))
}

/// The staged audit comment on the rule at `xpath`, or empty.
pub(crate) fn current(common: &Common<'_>, xpath: &str) -> Result<String, PangoError> {
    let cmd = XmlNode::new("show").child(
        XmlNode::new("config").child(
            XmlNode::new("list")
                .child(XmlNode::new("audit-comments").child(XmlNode::with_text("xpath", xpath))),
        ),
    );
    let result = common
        .op(&cmd, "")
        .map_err(|e| e.during("show audit comment", xpath))?;
    Ok(result
        .descendants("entry")
        .into_iter()
        .next()
        .map(|e| text(e, &["comment"]))
        .unwrap_or_default())
}

/// Committed audit comments of the rule at `xpath`.
pub(crate) fn history(
    common: &Common<'_>,
    xpath: &str,
    direction: Direction,
    nlogs: u32,
    skip: u32,
) -> Result<Vec<AuditComment>, PangoError> {
    let query = LogQuery {
        log_type: "config".to_string(),
        query: history_query(xpath)?,
        direction,
        nlogs,
        skip,
        ..LogQuery::default()
    };
    let entries = logs::retrieve(common.client, &query, LOG_POLL, None)
        .map_err(|e| e.during("audit comment history", xpath))?;
    Ok(entries
        .into_iter()
        .map(|entry| AuditComment {
            admin: entry.field("admin").to_string(),
            comment: entry.field("comment").to_string(),
            config_version: entry.field("config_ver").to_string(),
            time_generated: entry.time_generated.clone(),
            time: entry.time,
        })
        .collect())
}

/// Build the config log filter for the rule at `xpath`.
///
/// The scope token is the vsys or device group name (`shared` otherwise)
/// and the rulebase token is whichever rulebase segment the path carries.
pub(crate) fn history_query(xpath: &str) -> Result<String, PangoError> {
    let segments = split(xpath);
    let mut scope = "shared".to_string();
    let mut rulebase = None;
    for (i, segment) in segments.iter().enumerate() {
        match segment_tag(segment) {
            "vsys" | "device-group" => {
                if let Some(name) = segments
                    .get(i + 1)
                    .and_then(|next| segment_names(next).into_iter().next())
                {
                    scope = name;
                }
            }
            tag @ ("rulebase" | "pre-rulebase" | "post-rulebase") => rulebase = Some(tag),
            _ => {}
        }
    }
    let rulebase = rulebase.ok_or_else(|| {
        PangoError::validation(format!("{xpath} is not inside a rulebase"))
    })?;
    let rule = segments
        .last()
        .and_then(|s| segment_names(s).into_iter().next())
        .ok_or_else(|| PangoError::validation(format!("{xpath} does not name a rule")))?;
    Ok(format!(
        "(subtype eq audit-comment) and (path contains '\\'{rule}\\'') and (path contains '{rulebase}') and (path contains '{scope}')"
    ))
}

#[cfg(test)]
mod tests {
    use super::history_query;

    #[test]
    fn query_derives_scope_and_rulebase() {
        let q = history_query(
            "/config/devices/entry[@name='localhost.localdomain']/device-group/entry[@name='DG1']/post-rulebase/security/rules/entry[@name='r1']",
        )
        .expect("query");
        assert_eq!(
            q,
            "(subtype eq audit-comment) and (path contains '\\'r1\\'') and (path contains 'post-rulebase') and (path contains 'DG1')"
        );
        let vsys = history_query(
            "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys2']/rulebase/security/rules/entry[@name='r1']",
        )
        .expect("query");
        assert_eq!(
            vsys,
            "(subtype eq audit-comment) and (path contains '\\'r1\\'') and (path contains 'rulebase') and (path contains 'vsys2')"
        );
        let shared = history_query("/config/shared/pre-rulebase/nat/rules/entry[@name='n']")
            .expect("query");
        assert!(shared.ends_with("(path contains 'shared')"));
        assert!(history_query("/config/shared/address/entry[@name='a']").is_err());
    }
}
