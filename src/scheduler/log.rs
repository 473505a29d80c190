//! User-facing evaluation log.
//!
//! The planner accumulates human-readable explanations here for the
//! caller's log window: why a job cannot run, what the plan for the next
//! 48 hours looks like. Developer diagnostics go through the `log` crate
//! facade instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// In-memory log collected over one or more planning passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationLog {
    entries: Vec<LogEntry>,
}

impl EvaluationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push(LogEntry { timestamp: Utc::now(), level, message: message.into() });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Warning, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Messages only, for assertions and plain-text rendering.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }
}
