//! Error types and backend violation mapping.
//!
//! Failures split into two families. Programmer- and transport-class
//! conditions (`Error`) propagate as `Result::Err`. Domain validation
//! failures reported by the backend with a 400 status never raise: they are
//! translated through a fixed code table into field-scoped [`Violation`]s
//! accumulated on the record (or file attachment) that attempted the save.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during mapper operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `find` was called with a missing or empty identifier.
    #[error("record identifier is missing or empty")]
    RecordNotFound,

    /// A relationship referenced a backend class no local model type
    /// resolves to.
    #[error("no model type registered for backend class '{0}'")]
    UnknownClass(String),

    /// Connectivity or request-construction failure in the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend returned a body that does not match its contract.
    #[error("unexpected backend response: {0}")]
    InvalidResponse(String),

    /// A Bytes-tagged attribute carried an undecodable payload.
    #[error("invalid base64 payload: {0}")]
    InvalidBytes(#[from] base64::DecodeError),
}

/// A single field-scoped validation failure.
///
/// `field` is `"base"` when the failure is not attributable to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulated violations for one record or attachment.
///
/// Cleared at the start of every save attempt, inspected by callers after a
/// save returns `Ok(false)`.
#[derive(Debug, Clone, Default)]
pub struct Violations {
    entries: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: Violation) {
        self.entries.push(violation);
    }

    pub fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.entries.extend(violations);
    }

    /// All messages recorded against one field.
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|v| v.field == field)
            .map(|v| v.message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.entries.iter()
    }
}

/// Translate a backend domain error code into a field-scoped violation.
///
/// Unknown codes fall back to the `base` field with the backend's raw
/// message so nothing is swallowed.
pub(crate) fn violation_for_code(code: i64, error: &str) -> Violation {
    match code {
        101 => Violation::new("base", "object not found"),
        111 => Violation::new("base", "field set to an incorrect type"),
        122 => Violation::new("file_name", "contains restricted characters"),
        125 => Violation::new("email", "is not a valid address"),
        137 => Violation::new("base", "value already taken for a unique field"),
        200 => Violation::new("username", "is missing or empty"),
        201 => Violation::new("password", "is missing or empty"),
        202 => Violation::new("username", "has already been taken"),
        203 => Violation::new("email", "has already been taken"),
        204 => Violation::new("email", "is missing or empty"),
        205 => Violation::new("email", "no account found for this address"),
        _ => Violation::new("base", error),
    }
}

/// Parse a 400 response body of the shape `{code, error}` into a violation.
///
/// A body that does not match the contract still yields a `base` violation
/// carrying the raw text.
pub(crate) fn violation_from_body(body: &[u8]) -> Violation {
    match serde_json::from_slice::<Value>(body) {
        Ok(parsed) => {
            let code = parsed.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            violation_for_code(code, message)
        }
        Err(_) => Violation::new("base", String::from_utf8_lossy(body).to_string()),
    }
}
