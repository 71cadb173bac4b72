//! A scripted, recording transport for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset};

use crate::client::{Client, Export, ExportRequest, ImportKind, ImportRequest, LogQuery, MovePosition};
use crate::error::PangoError;
use crate::version::{PluginInfo, Version};
use crate::xpath::{segment_names, split};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub verb: &'static str,
    pub xpath: String,
    pub element: String,
}

/// Replays queued responses in order and records every call.
///
/// With the queue empty every call succeeds with an empty `<result/>`.
pub(crate) struct ScriptedClient {
    version: Version,
    plugins: Vec<PluginInfo>,
    clock: String,
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    failures: Mutex<BTreeMap<&'static str, String>>,
}

impl ScriptedClient {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            plugins: Vec::new(),
            clock: "2024-03-01T10:00:00+01:00".to_string(),
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            failures: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginInfo>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Queue `<response status="success"><result>{inner}</result></response>`.
    pub fn push_result(&self, inner: &str) {
        self.push_response(&format!(
            r#"<response status="success"><result>{inner}</result></response>"#
        ));
    }

    /// Queue a verbatim response document.
    pub fn push_response(&self, body: &str) {
        lock(&self.responses).push_back(Ok(body.as_bytes().to_vec()));
    }

    /// Queue a peer error carrying `message`.
    pub fn push_error(&self, message: &str) {
        lock(&self.responses).push_back(Err(message.to_string()));
    }

    /// Make every call of `verb` fail with `message`.
    pub fn fail_on(&self, verb: &'static str, message: &str) {
        lock(&self.failures).insert(verb, message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Record a call and apply any `fail_on` for its verb.
    fn note(&self, verb: &'static str, xpath: &str, element: &str) -> Result<(), PangoError> {
        lock(&self.calls).push(Call {
            verb,
            xpath: xpath.to_string(),
            element: element.to_string(),
        });
        match lock(&self.failures).get(verb) {
            Some(message) => Err(peer_error(message)),
            None => Ok(()),
        }
    }

    /// Record a call and answer it from the queue.
    fn record(&self, verb: &'static str, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError> {
        self.note(verb, xpath, element)?;
        match lock(&self.responses).pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(peer_error(&message)),
            None => Ok(br#"<response status="success"><result/></response>"#.to_vec()),
        }
    }
}

fn peer_error(message: &str) -> PangoError {
    PangoError::Panos {
        code: None,
        message: message.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Client for ScriptedClient {
    fn versioning(&self) -> Version {
        self.version.clone()
    }

    fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins.clone()
    }

    fn clock(&self) -> Result<DateTime<FixedOffset>, PangoError> {
        DateTime::parse_from_rfc3339(&self.clock).map_err(|e| PangoError::Transport(e.to_string()))
    }

    fn get(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        self.record("get", xpath, "")
    }

    fn show(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        self.record("show", xpath, "")
    }

    fn set(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError> {
        self.record("set", xpath, element)
    }

    fn edit(&self, xpath: &str, element: &str) -> Result<Vec<u8>, PangoError> {
        self.record("edit", xpath, element)
    }

    fn delete(&self, xpath: &str) -> Result<Vec<u8>, PangoError> {
        self.record("delete", xpath, "")
    }

    fn move_entry(&self, xpath: &str, position: &MovePosition) -> Result<Vec<u8>, PangoError> {
        let name = split(xpath)
            .last()
            .and_then(|s| segment_names(s).into_iter().next())
            .unwrap_or_default();
        let summary = match position.anchor() {
            Some(anchor) => format!("{name} {} {anchor}", position.where_param()),
            None => format!("{name} {}", position.where_param()),
        };
        self.record("move", xpath, &summary)
    }

    fn op(&self, cmd: &str, vsys: &str) -> Result<Vec<u8>, PangoError> {
        self.record("op", vsys, cmd)
    }

    fn uid(&self, message: &str, vsys: &str) -> Result<Vec<u8>, PangoError> {
        self.record("uid", vsys, message)
    }

    fn commit(&self, cmd: &str) -> Result<Vec<u8>, PangoError> {
        self.record("commit", "", cmd)
    }

    fn log(&self, query: &LogQuery) -> Result<Vec<u8>, PangoError> {
        let summary = format!(
            "{}|{}|{}|{}|{}",
            query.log_type,
            query.query,
            query.direction.as_str(),
            query.nlogs,
            query.skip
        );
        self.record("log", "", &summary)
    }

    fn log_result(&self, job_id: u64) -> Result<Vec<u8>, PangoError> {
        self.record("log-result", &job_id.to_string(), "")
    }

    fn import(&self, request: &ImportRequest) -> Result<Vec<u8>, PangoError> {
        let extras = request
            .extras
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        self.record("import", &request.category, &extras)
    }

    fn export(&self, request: &ExportRequest) -> Result<Export, PangoError> {
        let extras = request
            .extras
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let body = self.record("export", &request.category, &extras)?;
        Ok(Export {
            filename: Some(format!("{}.pem", request.category)),
            body,
        })
    }

    fn vsys_import(
        &self,
        _kind: ImportKind,
        template: &str,
        template_stack: &str,
        vsys: &str,
        names: &[String],
    ) -> Result<(), PangoError> {
        let element = format!("{template}|{template_stack}|{}", names.join(","));
        self.note("vsys-import", vsys, &element)
    }

    fn vsys_unimport(
        &self,
        _kind: ImportKind,
        template: &str,
        template_stack: &str,
        names: &[String],
    ) -> Result<(), PangoError> {
        let element = format!("{template}|{template_stack}|{}", names.join(","));
        self.note("vsys-unimport", "", &element)
    }

    fn sleep(&self, _duration: std::time::Duration) {}
}
