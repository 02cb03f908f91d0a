//! Logging collaborator injected into every [`Module`](crate::Module).
//!
//! The host decides where messages go. [`TracingLog`] forwards to `tracing`,
//! [`MemoryLog`] keeps them in memory for inspection.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Sink for debug, warning and error text.
pub trait BuildLog: fmt::Debug + Send + Sync {
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to `tracing` events under the `modgen` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "modgen", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "modgen", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "modgen", "{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

/// A single recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Records every message in order.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
            });
    }
}

impl BuildLog for MemoryLog {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
