use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::version::Version;

/// Peer messages that mean "nothing there" on list retrieval.
const NOT_FOUND_MESSAGES: [&str; 2] = ["No such node", "Object not found"];

/// Peer messages that make an absolute move a no-op.
const ALREADY_POSITIONED_MESSAGES: [&str; 2] = ["already at the top", "already at the bottom"];

/// Errors returned by the PAN-OS client.
#[derive(Debug, Error)]
pub enum PangoError {
    /// Caller input rejected before any request was sent.
    #[error("invalid argument: {0}")]
    Validation(String),
    /// The connected device is too old for the requested feature.
    #[error("{feature} requires PAN-OS {required} or later (device runs {actual})")]
    Unsupported {
        feature: String,
        required: Version,
        actual: Version,
    },
    /// A response (or configuration blob) did not have the expected shape.
    #[error("failed to decode {kind}: {message}")]
    Decode { kind: &'static str, message: String },
    /// A single object was requested but the peer returned none.
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },
    /// The peer answered with `status="error"`.
    #[error("{message}")]
    Panos { code: Option<u32>, message: String },
    /// A required plugin is missing or at the wrong version.
    #[error("plugin requirement not met: {0}")]
    Plugin(String),
    /// User-ID accepted the message but rejected some of its entries.
    #[error("user-id update failed: {}", join_failures(.0))]
    UserId(Vec<UidFailure>),
    /// A polled job or log query did not finish in time.
    #[error("{what} did not finish within {waited:?}")]
    Timeout { what: String, waited: Duration },
    /// The transport itself failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// Malformed XML.
    #[error(transparent)]
    Xml(#[from] panos_xml::ParseError),
    /// XML could not be written.
    #[error(transparent)]
    Write(#[from] panos_xml::WriteError),
    /// Another error annotated with the verb and object it happened on.
    #[error("{verb} {target}: {source}")]
    Context {
        verb: &'static str,
        target: String,
        #[source]
        source: Box<PangoError>,
    },
}

impl PangoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn decode(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            kind,
            message: message.into(),
        }
    }

    /// Build a version-gate error.
    pub fn unsupported(feature: impl Into<String>, required: &Version, actual: &Version) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            required: required.clone(),
            actual: actual.clone(),
        }
    }

    /// Annotate this error with the acting verb and target object.
    pub fn during(self, verb: &'static str, target: impl Into<String>) -> Self {
        Self::Context {
            verb,
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`PangoError::Context`].
    pub fn root(&self) -> &PangoError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// PAN-OS message text, when this is a peer error.
    pub fn panos_message(&self) -> Option<&str> {
        match self.root() {
            Self::Panos { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether this is the "no such node" / "object not found" class.
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Self::NotFound { .. } => true,
            Self::Panos { message, .. } => NOT_FOUND_MESSAGES.iter().any(|m| message.contains(m)),
            _ => false,
        }
    }

    /// Whether an absolute move failed only because the rule was already there.
    pub fn is_already_positioned(&self) -> bool {
        self.panos_message()
            .map(|m| ALREADY_POSITIONED_MESSAGES.iter().any(|known| m.contains(known)))
            .unwrap_or(false)
    }
}

/// One rejected entry inside a user-ID update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidFailure {
    /// Payload section the entry was in (`login`, `register-user`, ...).
    pub action: String,
    /// The user or IP the entry addressed.
    pub target: String,
    pub message: String,
}

impl fmt::Display for UidFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.action, self.target, self.message)
    }
}

fn join_failures(failures: &[UidFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::{PangoError, UidFailure};

    #[test]
    fn not_found_looks_through_context() {
        let err = PangoError::Panos {
            code: Some(7),
            message: "No such node".to_string(),
        }
        .during("show", "address");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "show address: No such node");
    }

    #[test]
    fn already_positioned_matches_top_and_bottom() {
        let top = PangoError::Panos {
            code: None,
            message: "r1 is already at the top".to_string(),
        };
        let other = PangoError::Panos {
            code: None,
            message: "r9 does not exist".to_string(),
        };
        assert!(top.is_already_positioned());
        assert!(!other.is_already_positioned());
    }

    #[test]
    fn uid_failures_are_joined() {
        let err = PangoError::UserId(vec![
            UidFailure {
                action: "register-user".to_string(),
                target: "u2".to_string(),
                message: "user not found".to_string(),
            },
            UidFailure {
                action: "login".to_string(),
                target: "10.0.0.9".to_string(),
                message: "bad ip".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "user-id update failed: register-user u2: user not found; login 10.0.0.9: bad ip"
        );
    }
}
