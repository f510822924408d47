//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` and `severity` come first, remaining keys sorted
//! - Writes go to a pluggable sink so tests can capture them

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Refused requests
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination for rendered log lines
pub trait LogSink: Send + Sync {
    fn write_line(&self, severity: Severity, line: &str);
}

/// Errors to stderr, everything else to stdout
pub struct StdSink;

impl LogSink for StdSink {
    fn write_line(&self, severity: Severity, line: &str) {
        // Logging must never fail the caller
        if severity >= Severity::Error {
            let _ = io::stderr().write_all(line.as_bytes());
        } else {
            let _ = io::stdout().write_all(line.as_bytes());
        }
    }
}

/// In-memory sink for tests and embedding
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Captured lines parsed back into JSON
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Captured records for one event
    pub fn records_for(&self, event: Event) -> Vec<serde_json::Value> {
        self.records()
            .into_iter()
            .filter(|r| r["event"] == event.as_str())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, _severity: Severity, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.trim_end().to_string());
        }
    }
}

/// Structured logger handle
///
/// Cheap to clone; all clones share the same sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_severity: Severity,
}

impl Logger {
    /// Logger writing to a custom sink
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_severity: Severity::Info,
        }
    }

    /// Logger writing to stdout/stderr
    pub fn stdout() -> Self {
        Self::new(Arc::new(StdSink))
    }

    /// Logger that captures lines, returning the sink for inspection
    pub fn capture() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Self::new(sink.clone()).with_min_severity(Severity::Trace), sink)
    }

    /// Drop events below `severity`
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Log an event at its default severity
    pub fn event(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(event.default_severity(), event, fields);
    }

    /// Log an event with explicit severity
    pub fn log(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = render(severity, event, &ts, fields);
        self.sink.write_line(severity, &line);
    }

    pub fn trace(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    pub fn info(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    pub fn warn(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    pub fn error(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

/// Render one JSON line: event, severity, then sorted fields
fn render(severity: Severity, event: Event, ts: &str, fields: &[(&str, &str)]) -> String {
    let mut sorted: Vec<(&str, &str)> = fields.to_vec();
    sorted.push(("ts", ts));
    sorted.sort_by_key(|(k, _)| *k);

    let mut output = String::with_capacity(128);
    output.push_str("{\"event\":");
    output.push_str(&quote(event.as_str()));
    output.push_str(",\"severity\":");
    output.push_str(&quote(severity.as_str()));
    for (key, value) in sorted {
        output.push(',');
        output.push_str(&quote(key));
        output.push(':');
        output.push_str(&quote(value));
    }
    output.push_str("}\n");
    output
}

fn quote(s: &str) -> String {
    // Serializing a &str cannot fail
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
