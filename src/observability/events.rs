//! Observable events for docdb-utils
//!
//! Events are explicit and typed. Each one renders as a stable
//! SCREAMING_SNAKE_CASE name in the JSON log line.

use std::fmt;

use super::logger::Severity;

/// Observable events emitted by the helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Connection lifecycle
    /// Connection opened successfully
    ConnectionOpen,
    /// Connection attempt failed
    ConnectionError,

    // Schema hooks
    /// Interceptor registered on a schema
    HookInstalled,
    /// Pre-update interceptor rejected an update
    UpdateRejected,

    // Validation
    /// Field validator refused a document
    ValidationFailed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConnectionOpen => "CONNECTION_OPEN",
            Event::ConnectionError => "CONNECTION_ERROR",
            Event::HookInstalled => "HOOK_INSTALLED",
            Event::UpdateRejected => "UPDATE_REJECTED",
            Event::ValidationFailed => "VALIDATION_FAILED",
        }
    }

    /// Severity used when the event is logged without an override
    pub fn default_severity(&self) -> Severity {
        match self {
            Event::ConnectionError => Severity::Error,
            Event::UpdateRejected | Event::ValidationFailed => Severity::Warn,
            Event::HookInstalled => Severity::Trace,
            Event::ConnectionOpen => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
