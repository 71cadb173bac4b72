//! Registered IP / tag queries.

use panos_xml::XmlNode;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::error::PangoError;
use crate::namespace::Common;
use crate::version::V8_0;
use crate::wire::{entry_node, members, Emit};

/// Entries per page on paginating devices.
pub const PAGE_SIZE: usize = 500;

/// One registered address and its tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisteredIp {
    pub ip: String,
    pub tags: Vec<String>,
}

/// Registered IPs in `vsys`, optionally narrowed to one `ip` or one `tag`.
///
/// PAN-OS 8.0 and later page the answer; pages are requested until one comes
/// back short.
pub fn get(client: &dyn Client, vsys: &str, ip: &str, tag: &str) -> Result<Vec<RegisteredIp>, PangoError> {
    let common = Common::new(client, "registered ip");
    if client.versioning() < V8_0 {
        let result = common.op(&request(ip, tag, None), vsys)?;
        return Ok(decode(&result));
    }

    let mut out = Vec::new();
    let mut start = 1;
    loop {
        let result = common.op(&request(ip, tag, Some(start)), vsys)?;
        let page = decode(&result);
        let len = page.len();
        debug!(target: "pango::op", start, len, "registered ip page");
        out.extend(page);
        if len < PAGE_SIZE {
            break;
        }
        start += PAGE_SIZE;
    }
    Ok(out)
}

/// `show object registered-ip` body; `start` adds the paging window.
pub(crate) fn request(ip: &str, tag: &str, start: Option<usize>) -> XmlNode {
    let mut query = XmlNode::new("registered-ip");
    if let Some(start) = start {
        query.text_el("limit", &PAGE_SIZE.to_string());
        query.text_el("start-point", &start.to_string());
    }
    if !ip.is_empty() {
        query.text_el("ip", ip);
    }
    if !tag.is_empty() {
        query.node_el(Some(XmlNode::new("tag").child(entry_node(tag))));
    }
    if ip.is_empty() && tag.is_empty() {
        query.children.push(XmlNode::new("all"));
    }
    XmlNode::new("show").child(XmlNode::new("object").child(query))
}

fn decode(result: &XmlNode) -> Vec<RegisteredIp> {
    result
        .descendants("entry")
        .into_iter()
        .filter_map(|entry| {
            Some(RegisteredIp {
                ip: entry.attribute("ip")?.to_string(),
                tags: members(entry, &["tag"]),
            })
        })
        .collect()
}
