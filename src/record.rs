//! Log record data model shared across pipeline stages.

use serde::{Deserialize, Serialize};

/// A single record read from a newline-delimited JSON log source.
///
/// Records are immutable once produced: the ingestor creates them and the
/// processor consumes them during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A well-formed record carrying the recognized log fields.
    Structured(StructuredRecord),
    /// An unparseable line preserved verbatim.
    Raw(String),
}

impl LogRecord {
    /// Wraps a raw line that could not be parsed as JSON.
    pub fn raw<S: Into<String>>(line: S) -> Self {
        Self::Raw(line.into())
    }
}

impl From<StructuredRecord> for LogRecord {
    fn from(record: StructuredRecord) -> Self {
        Self::Structured(record)
    }
}

/// Recognized fields of a structured log line.
///
/// Every field except `message` is optional; unrecognized fields (correlation
/// ids, trace ids, and the like) are tolerated and dropped on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// ISO-8601 timestamp, when the emitter provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Emitting service identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Severity label (INFO, WARN, ERROR, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Human-readable log message. Defaults to empty when absent.
    #[serde(default)]
    pub message: String,
    /// Optional multi-line stack trace attached to error records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}
