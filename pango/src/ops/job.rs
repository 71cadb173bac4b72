//! Asynchronous device jobs.

use std::time::Duration;

use panos_xml::XmlNode;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::error::PangoError;
use crate::namespace::Common;
use crate::wire::{error_message, number, parse_response, text};

const KIND: &str = "job";

/// The job id a submission enqueued, if any.
///
/// Commits with nothing to do succeed without a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResponse(pub Option<u64>);

impl JobResponse {
    /// Parse a `<response>` body from `commit` or an async `op`.
    pub fn parse(body: &[u8]) -> Result<Self, PangoError> {
        let response = parse_response(body)?;
        Self::from_response(&response)
    }

    pub(crate) fn from_response(response: &XmlNode) -> Result<Self, PangoError> {
        match response.get_text(&["result", "job"]).map(str::trim) {
            Some(id) if !id.is_empty() => id.parse().map(|id| Self(Some(id))).map_err(|_| {
                PangoError::decode(KIND, format!("job id {id:?} is not a number"))
            }),
            _ => Ok(Self(None)),
        }
    }

    pub fn id(self) -> Option<u64> {
        self.0
    }
}

/// One `<job>` record from `show jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: u64,
    pub job_type: String,
    pub user: String,
    /// `ACT`, `PEND` or `FIN`.
    pub status: String,
    /// `OK`, `FAIL` or `PEND`.
    pub result: String,
    pub progress: u32,
    pub enqueued: String,
    pub finished: String,
    pub details: Vec<String>,
    pub warnings: Vec<String>,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        self.status == "FIN"
    }

    pub fn is_failed(&self) -> bool {
        self.result == "FAIL"
    }

    pub(crate) fn decode(node: &XmlNode) -> Result<Self, PangoError> {
        let lines = |tag: &str| -> Vec<String> {
            node.get_child(tag)
                .map(|n| {
                    let lines: Vec<String> = n
                        .get_children("line")
                        .into_iter()
                        .filter_map(|l| l.text.as_deref().map(str::trim))
                        .map(ToString::to_string)
                        .collect();
                    if lines.is_empty() {
                        n.text.iter().map(|t| t.trim().to_string()).collect()
                    } else {
                        lines
                    }
                })
                .unwrap_or_default()
        };
        Ok(Self {
            id: number(node, &["id"], KIND)?,
            job_type: text(node, &["type"]),
            user: text(node, &["user"]),
            status: text(node, &["status"]),
            result: text(node, &["result"]),
            progress: number(node, &["progress"], KIND).unwrap_or_default(),
            enqueued: text(node, &["tenq"]),
            finished: text(node, &["tfin"]),
            details: lines("details"),
            warnings: lines("warnings"),
        })
    }
}

/// Fetch the current state of job `id`.
pub fn show_job(client: &dyn Client, id: u64) -> Result<Job, PangoError> {
    let cmd = XmlNode::new("show")
        .child(XmlNode::new("jobs").child(XmlNode::with_text("id", id.to_string())));
    let result = Common::new(client, KIND).op(&cmd, "")?;
    let job = result.get_child("job").ok_or_else(|| PangoError::NotFound {
        kind: KIND,
        name: id.to_string(),
    })?;
    Job::decode(job)
}

/// Poll job `id` every `poll` until it finishes.
///
/// A finished job whose result is `FAIL` is returned as an error carrying its
/// detail lines. `max_wait` counts accumulated poll intervals, so `poll`
/// must be non-zero.
pub fn wait_for_job(
    client: &dyn Client,
    id: u64,
    poll: Duration,
    max_wait: Option<Duration>,
) -> Result<Job, PangoError> {
    if poll.is_zero() {
        return Err(PangoError::validation("job poll interval must be non-zero"));
    }
    let mut waited = Duration::ZERO;
    loop {
        let job = show_job(client, id)?;
        debug!(target: "pango::op", id, status = %job.status, progress = job.progress, "job poll");
        if job.is_finished() {
            if job.is_failed() {
                let message = if job.details.is_empty() {
                    format!("job {id} failed")
                } else {
                    job.details.join(" | ")
                };
                return Err(PangoError::Panos {
                    code: None,
                    message,
                });
            }
            return Ok(job);
        }
        if let Some(max) = max_wait {
            if waited >= max {
                return Err(PangoError::Timeout {
                    what: format!("job {id}"),
                    waited: max,
                });
            }
        }
        client.sleep(poll);
        waited += poll;
    }
}

/// Message text of a response that carries no job, such as
/// "There are no changes to commit."
pub fn response_message(body: &[u8]) -> Result<String, PangoError> {
    let response = parse_response(body)?;
    Ok(error_message(&response))
}
