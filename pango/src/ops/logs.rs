//! Log queries.
//!
//! A query is submitted as a job and polled through
//! [`Client::wait_for_logs`]. Log timestamps are device-local wall time with
//! no zone, so each entry is also stamped with the zone the device clock
//! reports.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use panos_xml::XmlNode;
use serde::Serialize;
use tracing::debug;

use super::job::JobResponse;
use crate::client::{Client, LogQuery};
use crate::error::PangoError;
use crate::wire::parse_response;

const KIND: &str = "log query";

/// `time_generated` layout.
pub const LOG_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One retrieved log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub log_id: String,
    /// Every leaf field of the entry keyed by element name.
    pub fields: BTreeMap<String, String>,
    /// `time_generated` as the device printed it.
    pub time_generated: String,
    /// `time_generated` placed in the device's zone.
    pub time: Option<DateTime<FixedOffset>>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    fn decode(node: &XmlNode, offset: FixedOffset) -> Self {
        let fields: BTreeMap<String, String> = node
            .children
            .iter()
            .filter(|c| c.children.is_empty())
            .map(|c| {
                (
                    c.tag.clone(),
                    c.text.as_deref().unwrap_or_default().trim().to_string(),
                )
            })
            .collect();
        let time_generated = fields.get("time_generated").cloned().unwrap_or_default();
        Self {
            log_id: node.attribute("logid").unwrap_or_default().to_string(),
            time: device_time(&time_generated, offset),
            time_generated,
            fields,
        }
    }
}

/// Interpret a device-local `time_generated` in `offset`.
pub fn device_time(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), LOG_TIME_FORMAT).ok()?;
    offset.from_local_datetime(&naive).single()
}

/// Submit `query`, returning its job id.
pub fn submit(client: &dyn Client, query: &LogQuery) -> Result<u64, PangoError> {
    debug!(
        target: "pango::log",
        log_type = %query.log_type,
        query = %query.query,
        direction = query.direction.as_str(),
        nlogs = query.nlogs,
        skip = query.skip,
        "(log) submit"
    );
    let body = client.log(query)?;
    JobResponse::parse(&body)?
        .id()
        .ok_or_else(|| PangoError::decode(KIND, "log query did not return a job id"))
}

/// Submit `query`, wait for it and decode the entries.
pub fn retrieve(
    client: &dyn Client,
    query: &LogQuery,
    poll: Duration,
    max_wait: Option<Duration>,
) -> Result<Vec<LogEntry>, PangoError> {
    let job = submit(client, query)?;
    let body = client.wait_for_logs(job, poll, max_wait)?;
    let response = parse_response(&body)?;
    let offset = *client.clock()?.offset();
    let entries = response
        .find(&["result", "log", "logs"])
        .map(|logs| {
            logs.get_children("entry")
                .into_iter()
                .map(|e| LogEntry::decode(e, offset))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    debug!(target: "pango::log", job, count = entries.len(), "(log) retrieved");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{FixedOffset, TimeZone};

    use super::{device_time, retrieve};
    use crate::client::{Client, LogQuery};
    use crate::error::PangoError;
    use crate::testing::ScriptedClient;
    use crate::version::V9_0;

    #[test]
    fn device_time_uses_the_clock_offset() {
        let offset = FixedOffset::east_opt(3600).expect("offset");
        let t = device_time("2024/03/01 09:59:00", offset).expect("time");
        assert_eq!(
            t,
            offset
                .with_ymd_and_hms(2024, 3, 1, 9, 59, 0)
                .single()
                .expect("ymd")
        );
        assert!(device_time("yesterday", offset).is_none());
    }

    #[test]
    fn retrieve_polls_and_decodes() {
        let client = ScriptedClient::new(V9_0);
        client.push_result("<msg><line>query job enqueued with jobid 7</line></msg><job>7</job>");
        client.push_result("<job><id>7</id><status>ACT</status></job>");
        client.push_result(
            r#"<job><id>7</id><status>FIN</status></job><log><logs count="1" progress="100"><entry logid="100"><admin>admin</admin><cmd>set</cmd><time_generated>2024/03/01 09:59:00</time_generated></entry></logs></log>"#,
        );
        let query = LogQuery {
            log_type: "config".to_string(),
            query: "(cmd eq set)".to_string(),
            nlogs: 20,
            ..LogQuery::default()
        };
        let entries = retrieve(&client, &query, Duration::from_millis(10), None).expect("logs");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].log_id, "100");
        assert_eq!(entries[0].field("admin"), "admin");
        assert_eq!(
            entries[0].time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-01T09:59:00+01:00")
        );
        let verbs: Vec<&str> = client.calls().iter().map(|c| c.verb).collect();
        assert_eq!(verbs, vec!["log", "log-result", "log-result"]);
        assert_eq!(client.calls()[0].element, "config|(cmd eq set)|backward|20|0");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let client = ScriptedClient::new(V9_0);
        client.push_result("<job><id>7</id><status>ACT</status></job>");
        let err = client
            .wait_for_logs(7, Duration::ZERO, Some(Duration::from_secs(1)))
            .expect_err("zero poll");
        assert!(matches!(err, PangoError::Validation(_)));
        assert!(client.calls().is_empty());
    }
}
