//! The transport contract the namespaces are written against.
//!
//! A [`Client`] owns the session: authentication, the negotiated PAN-OS
//! version and the installed plugin list. Every namespace operation reaches
//! the device through exactly one of these methods, so implementations are
//! free to be blocking HTTP clients, recorders, or the in-memory
//! [`OfflineDevice`](crate::offline::OfflineDevice).

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::error::PangoError;
use crate::version::{PluginInfo, Version};
use crate::wire::parse_response;

/// Network object families that must be imported into a vsys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Interface,
    VirtualRouter,
    Vlan,
    VirtualWire,
}

impl ImportKind {
    /// Element name under `import/network`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::VirtualRouter => "virtual-router",
            Self::Vlan => "vlan",
            Self::VirtualWire => "virtual-wire",
        }
    }
}

impl Display for ImportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination of a single `move` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePosition {
    Top,
    Bottom,
    Before(String),
    After(String),
}

impl MovePosition {
    /// Value of the `where=` parameter.
    pub fn where_param(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Before(_) => "before",
            Self::After(_) => "after",
        }
    }

    /// Value of the `dst=` parameter, if any.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Self::Before(anchor) | Self::After(anchor) => Some(anchor),
            Self::Top | Self::Bottom => None,
        }
    }
}

/// Log retrieval order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Backward,
    Forward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backward => "backward",
            Self::Forward => "forward",
        }
    }
}

/// A `type=log` query submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Log category such as `config`, `traffic` or `system`.
    pub log_type: String,
    pub query: String,
    pub direction: Direction,
    /// Number of logs to return; zero leaves it to the device.
    pub nlogs: u32,
    pub skip: u32,
    pub extras: BTreeMap<String, String>,
}

/// A `type=import` upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    pub category: String,
    pub filename: String,
    pub content: Vec<u8>,
    pub timeout: Option<Duration>,
    pub extras: BTreeMap<String, String>,
}

/// A `type=export` download request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub category: String,
    pub timeout: Option<Duration>,
    pub extras: BTreeMap<String, String>,
}

/// Exported file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Export {
    pub filename: Option<String>,
    pub body: Vec<u8>,
}

/// Capability interface consumed by every namespace.
///
/// Methods returning bytes hand back the full `<response>` document; a
/// `status="error"` reply must be surfaced as [`PangoError::Panos`].
pub trait Client: Send + Sync {
    /// Version of the connected device.
    fn versioning(&self) -> Version;

    /// Plugins reported by the device.
    fn plugins(&self) -> Vec<PluginInfo>;

    /// Current wall-clock time on the device, with its UTC offset.
    fn clock(&self) -> Result<DateTime<FixedOffset>, PangoError>;

    /// `type=config&action=get` (candidate configuration).
    fn get(&self, xpath: &str) -> Result<Vec<u8>, PangoError>;

    /// `type=config&action=show` (running configuration).
    fn show(&self, xpath: &str) -> Result<Vec<u8>, PangoError>;

    fn set(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError>;

    fn edit(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError>;

    fn delete(&self, xpath: &str) -> Result<Vec<u8>, PangoError>;

    fn move_entry(&self, xpath: &str, position: &MovePosition) -> Result<Vec<u8>, PangoError>;

    /// `type=op`; an empty `vsys` targets the device.
    fn op(&self, cmd: &str, vsys: &str) -> Result<Vec<u8>, PangoError>;

    /// `type=user-id`.
    fn uid(&self, message: &str, vsys: &str) -> Result<Vec<u8>, PangoError>;

    /// `type=commit`.
    fn commit(&self, cmd: &str) -> Result<Vec<u8>, PangoError>;

    /// Submit a log query; the response carries the job id.
    fn log(&self, query: &LogQuery) -> Result<Vec<u8>, PangoError>;

    /// `type=log&action=get&job-id=N`.
    fn log_result(&self, job_id: u64) -> Result<Vec<u8>, PangoError>;

    fn import(&self, request: &ImportRequest) -> Result<Vec<u8>, PangoError>;

    fn export(&self, request: &ExportRequest) -> Result<Export, PangoError>;

    /// Attach `names` to `vsys`, inside `template`/`template_stack` when set.
    fn vsys_import(
        &self,
        kind: ImportKind,
        template: &str,
        template_stack: &str,
        vsys: &str,
        names: &[String],
    ) -> Result<(), PangoError>;

    /// Detach `names` from whichever vsys currently imports them.
    fn vsys_unimport(
        &self,
        kind: ImportKind,
        template: &str,
        template_stack: &str,
        names: &[String],
    ) -> Result<(), PangoError>;

    /// Suspend between polls.
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    /// Poll a log job every `poll` until the device reports `FIN`.
    ///
    /// `max_wait` is measured in accumulated poll intervals, so `poll` must be
    /// non-zero. Returns the final response document.
    fn wait_for_logs(
        &self,
        job_id: u64,
        poll: Duration,
        max_wait: Option<Duration>,
    ) -> Result<Vec<u8>, PangoError> {
        if poll.is_zero() {
            return Err(PangoError::validation("log poll interval must be non-zero"));
        }
        let mut waited = Duration::ZERO;
        loop {
            let body = self.log_result(job_id)?;
            let response = parse_response(&body)?;
            let status = response
                .get_text(&["result", "job", "status"])
                .unwrap_or_default();
            if status == "FIN" {
                return Ok(body);
            }
            if let Some(max) = max_wait {
                if waited >= max {
                    return Err(PangoError::Timeout {
                        what: format!("log job {job_id}"),
                        waited: max,
                    });
                }
            }
            self.sleep(poll);
            waited += poll;
        }
    }
}
