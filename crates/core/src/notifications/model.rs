//! Normalized error and notification types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::CONTACT_ADMIN_MESSAGE;

/// Classification of a normalized failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Application-level failure with a single structured message.
    Application,
    /// Per-field validation failure.
    Validation,
    /// Record-level batch failure; the first entry is representative.
    PartialFailure,
    /// Push-channel subscribe or delivery fault.
    Transport,
    /// Anything the classifier could not identify.
    Unknown,
}

/// A failure reduced to a user-presentable form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Structured remainder of the source payload (offending field, status
    /// code, raw batch entry), when the source carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl NormalizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(kind: ErrorKind, message: impl Into<String>, details: Value) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Some(details),
        }
    }

    /// A channel-level fault from the push transport. These bypass shape
    /// classification entirely.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}

/// How prominently the surface should render a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A user-facing notification, ready for a toast/banner widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// Sticky notifications stay until dismissed.
    pub sticky: bool,
}

impl Notification {
    /// Builds the standard failure notification: reduced messages joined,
    /// followed by the fixed administrator-contact suffix.
    pub fn from_errors(title: impl Into<String>, errors: &[NormalizedError]) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            title: title.into(),
            message: format!("{joined}. {CONTACT_ADMIN_MESSAGE}"),
            severity: Severity::Error,
            sticky: true,
        }
    }
}
