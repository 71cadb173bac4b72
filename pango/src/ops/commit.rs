//! Commit requests.

use std::time::Duration;

use panos_xml::XmlNode;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::job::{wait_for_job, Job, JobResponse};
use crate::client::Client;
use crate::error::PangoError;
use crate::wire::{parse_response, Emit};

/// A firewall commit, optionally partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commit {
    pub description: String,
    /// Commit only these administrators' changes.
    pub admins: Vec<String>,
    pub exclude_device_and_network: bool,
    pub exclude_shared_objects: bool,
    pub exclude_policy_and_objects: bool,
    pub force: bool,
}

impl Commit {
    /// The `cmd=` body.
    pub fn element(&self) -> XmlNode {
        let mut body = Vec::new();
        body.extend(
            (!self.description.is_empty())
                .then(|| XmlNode::with_text("description", self.description.as_str())),
        );
        let mut partial = XmlNode::new("partial");
        partial.members_el("admin", &self.admins);
        for (excluded, tag) in [
            (self.exclude_device_and_network, "device-and-network"),
            (self.exclude_shared_objects, "shared-object"),
            (self.exclude_policy_and_objects, "policy-and-objects"),
        ] {
            if excluded {
                partial.children.push(XmlNode::with_text(tag, "excluded"));
            }
        }
        if !partial.children.is_empty() {
            body.push(partial);
        }

        let mut commit = XmlNode::new("commit");
        if self.force {
            let mut force = XmlNode::new("force");
            force.children = body;
            commit.children.push(force);
        } else {
            commit.children = body;
        }
        commit
    }
}

/// Submit `commit`, returning the enqueued job id, or `None` when there was
/// nothing to commit.
pub fn commit(client: &dyn Client, commit: &Commit) -> Result<Option<u64>, PangoError> {
    let cmd = commit.element().to_string();
    info!(target: "pango::action", %cmd, "(commit)");
    let body = client.commit(&cmd)?;
    let response = parse_response(&body)?;
    Ok(JobResponse::from_response(&response)?.id())
}

/// Submit `commit` and wait for its job.
pub fn commit_and_wait(
    client: &dyn Client,
    commit_request: &Commit,
    poll: Duration,
    max_wait: Option<Duration>,
) -> Result<Option<Job>, PangoError> {
    match commit(client, commit_request)? {
        Some(id) => wait_for_job(client, id, poll, max_wait).map(Some),
        None => Ok(None),
    }
}
