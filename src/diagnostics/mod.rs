//! Diagnostic event log.
//!
//! Every notable step of the dashboard and the restriction widget (refresh
//! failures, logout errors, swallowed widget errors) is recorded as one JSON
//! line in `~/.collections-console/events.jsonl`. Writes are best-effort:
//! a failing sink never changes the outcome of the operation being logged.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, ConsoleConfig};

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

/// One line of the diagnostic log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: String,
    pub level: Level,
    /// Component that emitted the event: `"dashboard"`, `"widget"`, `"server"`.
    pub source: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Sink {
    File(PathBuf),
    Memory(Arc<Mutex<Vec<DiagnosticEvent>>>),
    Off,
}

/// Cloneable handle to the diagnostic log.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    sink: Sink,
    echo_stderr: bool,
}

impl Diagnostics {
    /// Build the handle described by the `[logging]` config section.
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let sink = match config::state_dir() {
            Some(dir) if config.logging.enabled => Sink::File(dir.join("events.jsonl")),
            _ => Sink::Off,
        };
        Self {
            sink,
            echo_stderr: config.logging.echo_stderr,
        }
    }

    /// Log to an explicit JSONL file.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: Sink::File(path.into()),
            echo_stderr: false,
        }
    }

    /// Keep events in memory; read them back with [`events`](Self::events).
    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory(Arc::new(Mutex::new(Vec::new()))),
            echo_stderr: false,
        }
    }

    /// Drop every event.
    pub fn disabled() -> Self {
        Self {
            sink: Sink::Off,
            echo_stderr: false,
        }
    }

    pub fn info(&self, source: &str, message: impl Into<String>) {
        self.record(Level::Info, source, message.into());
    }

    pub fn error(&self, source: &str, message: impl Into<String>) {
        self.record(Level::Error, source, message.into());
    }

    /// Events captured by an in-memory sink (empty for other sinks).
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        match &self.sink {
            Sink::Memory(events) => events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            _ => Vec::new(),
        }
    }

    fn record(&self, level: Level, source: &str, message: String) {
        let event = DiagnosticEvent {
            timestamp: Utc::now().to_rfc3339(),
            level,
            source: source.to_string(),
            message,
        };

        if self.echo_stderr {
            eprintln!("[{}] {}: {}", source, level_name(level), event.message);
        }

        match &self.sink {
            Sink::File(path) => {
                let _ = append_event(path, &event);
            }
            Sink::Memory(events) => events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event),
            Sink::Off => {}
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Info => "info",
        Level::Error => "error",
    }
}

fn append_event(path: &PathBuf, event: &DiagnosticEvent) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
