//! Operation vocabularies shared by every configurable kind.
//!
//! A namespace is a thin value holding the transport; the kind's
//! [`Object`](crate::codec::Object) impl supplies the path builder and the
//! codec. [`Standard`] is the base, the others layer on top of it.

mod importable;
mod movement;
mod plugin;
mod policy;
mod singleton;
mod standard;

use panos_xml::XmlNode;
use tracing::{debug, info};

use crate::client::{Client, MovePosition};
use crate::error::PangoError;
use crate::wire::{parse_response, payload};
use crate::xpath::join;

pub use importable::Importable;
pub use movement::Movement;
pub use plugin::Plugin;
pub use policy::Policy;
pub use singleton::Singleton;
pub use standard::{Deletable, Standard};

/// Candidate (`get`) versus running (`show`) configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Query {
    Get,
    Show,
}

impl Query {
    fn verb(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Show => "show",
        }
    }
}

/// Transport calls with the logging and response handling every namespace
/// shares.
#[derive(Clone, Copy)]
pub(crate) struct Common<'a> {
    pub client: &'a dyn Client,
    pub kind: &'static str,
}

impl<'a> Common<'a> {
    pub fn new(client: &'a dyn Client, kind: &'static str) -> Self {
        Self { client, kind }
    }

    /// Retrieve `path` and unwrap the response down to its payload.
    pub fn retrieve(&self, query: Query, path: &[String]) -> Result<XmlNode, PangoError> {
        let xpath = join(path);
        debug!(target: "pango::query", kind = self.kind, %xpath, "({}) {}", query.verb(), self.kind);
        let body = match query {
            Query::Get => self.client.get(&xpath)?,
            Query::Show => self.client.show(&xpath)?,
        };
        let response = parse_response(&body)?;
        Ok(payload(&response, path))
    }

    pub fn set(&self, path: &[String], element: &XmlNode) -> Result<(), PangoError> {
        let xpath = join(path);
        info!(target: "pango::action", kind = self.kind, %xpath, "(set) {}", self.kind);
        let body = self.client.set(&xpath, &element.to_string())?;
        parse_response(&body).map(drop)
    }

    pub fn edit(&self, path: &[String], element: &XmlNode) -> Result<(), PangoError> {
        let xpath = join(path);
        info!(target: "pango::action", kind = self.kind, %xpath, "(edit) {}", self.kind);
        let body = self.client.edit(&xpath, &element.to_string())?;
        parse_response(&body).map(drop)
    }

    pub fn delete(&self, path: &[String]) -> Result<(), PangoError> {
        let xpath = join(path);
        info!(target: "pango::action", kind = self.kind, %xpath, "(delete) {}", self.kind);
        let body = self.client.delete(&xpath)?;
        parse_response(&body).map(drop)
    }

    pub fn move_entry(&self, path: &[String], position: &MovePosition) -> Result<(), PangoError> {
        let xpath = join(path);
        info!(
            target: "pango::action",
            kind = self.kind,
            %xpath,
            position = position.where_param(),
            dst = position.anchor().unwrap_or_default(),
            "(move) {}",
            self.kind
        );
        let body = self.client.move_entry(&xpath, position)?;
        parse_response(&body).map(drop)
    }

    /// Send a `type=op` command and return the unwrapped `<result>`.
    pub fn op(&self, cmd: &XmlNode, vsys: &str) -> Result<XmlNode, PangoError> {
        let cmd = cmd.to_string();
        debug!(target: "pango::op", kind = self.kind, vsys, %cmd, "(op) {}", self.kind);
        let body = self.client.op(&cmd, vsys)?;
        let response = parse_response(&body)?;
        Ok(response
            .get_child("result")
            .cloned()
            .unwrap_or_else(|| XmlNode::new("result")))
    }
}

/// Reject duplicate names in one batch.
pub(crate) fn check_unique<'n>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'n str>,
) -> Result<(), PangoError> {
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PangoError::validation(format!(
                "{kind} {name:?} is specified more than once"
            )));
        }
    }
    Ok(())
}
