//! Log Sinks
//!
//! The [`Sink`] port is the leveled logger messages end up in. Two adapters
//! ship with the crate:
//!
//! - [`TracingSink`] forwards to `tracing` events under the `loggable`
//!   target, carrying the logger identity as the `logger` field
//! - [`MemorySink`] keeps records in memory for inspection and tests

use std::error::Error as StdError;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::Level;

use crate::spec::LogLevel;

/// `tracing` target of every event emitted by [`TracingSink`]
pub const TARGET: &str = "loggable";

// =============================================================================
// Identity
// =============================================================================

/// Which logger a message belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Explicitly named logger
    Name(String),
    /// Logger of the call site's declaring type
    Type(&'static str),
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Name(name) => name,
            Identity::Type(type_name) => type_name,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sink Port
// =============================================================================

/// Leveled logging destination
pub trait Sink: Send + Sync {
    /// Whether a message at `level` for `identity` would be written
    fn is_enabled(&self, level: LogLevel, identity: &Identity) -> bool;

    /// Write a message
    fn log(&self, level: LogLevel, identity: &Identity, message: &str);

    /// Write a message with the error that caused it attached
    fn log_error(
        &self,
        level: LogLevel,
        identity: &Identity,
        message: &str,
        error: &(dyn StdError + 'static),
    );
}

/// Render an error and its `source()` chain, one cause per line
pub fn error_trace(error: &(dyn StdError + 'static)) -> String {
    let mut trace = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(trace, "\n  caused by: {}", cause);
        source = cause.source();
    }
    trace
}

// =============================================================================
// Tracing Sink
// =============================================================================

/// Sink writing `tracing` events
///
/// Filtering happens on the `loggable` target, e.g.
/// `RUST_LOG=loggable=debug`. `tracing` targets are static, so the logger
/// identity travels as the `logger` field and [`Sink::is_enabled`] cannot
/// tell identities apart: every named logger and declaring type shares the
/// one `loggable` gate. Use a custom [`Sink`] when levels must differ per
/// logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($level:expr, $identity:expr, $message:expr) => {
        match $level {
            Level::TRACE => tracing::trace!(target: TARGET, logger = %$identity, "{}", $message),
            Level::DEBUG => tracing::debug!(target: TARGET, logger = %$identity, "{}", $message),
            Level::INFO => tracing::info!(target: TARGET, logger = %$identity, "{}", $message),
            Level::WARN => tracing::warn!(target: TARGET, logger = %$identity, "{}", $message),
            _ => tracing::error!(target: TARGET, logger = %$identity, "{}", $message),
        }
    };
    ($level:expr, $identity:expr, $message:expr, $trace:expr) => {
        match $level {
            Level::TRACE => {
                tracing::trace!(target: TARGET, logger = %$identity, error = %$trace, "{}", $message)
            }
            Level::DEBUG => {
                tracing::debug!(target: TARGET, logger = %$identity, error = %$trace, "{}", $message)
            }
            Level::INFO => {
                tracing::info!(target: TARGET, logger = %$identity, error = %$trace, "{}", $message)
            }
            Level::WARN => {
                tracing::warn!(target: TARGET, logger = %$identity, error = %$trace, "{}", $message)
            }
            _ => tracing::error!(target: TARGET, logger = %$identity, error = %$trace, "{}", $message),
        }
    };
}

impl Sink for TracingSink {
    fn is_enabled(&self, level: LogLevel, _identity: &Identity) -> bool {
        match level.as_tracing() {
            Some(Level::TRACE) => tracing::enabled!(target: TARGET, Level::TRACE),
            Some(Level::DEBUG) => tracing::enabled!(target: TARGET, Level::DEBUG),
            Some(Level::INFO) => tracing::enabled!(target: TARGET, Level::INFO),
            Some(Level::WARN) => tracing::enabled!(target: TARGET, Level::WARN),
            Some(_) => tracing::enabled!(target: TARGET, Level::ERROR),
            None => false,
        }
    }

    fn log(&self, level: LogLevel, identity: &Identity, message: &str) {
        if let Some(level) = level.as_tracing() {
            emit!(level, identity, message);
        }
    }

    fn log_error(
        &self,
        level: LogLevel,
        identity: &Identity,
        message: &str,
        error: &(dyn StdError + 'static),
    ) {
        if let Some(level) = level.as_tracing() {
            let trace = error_trace(error);
            emit!(level, identity, message, trace);
        }
    }
}

// =============================================================================
// Memory Sink
// =============================================================================

/// One message captured by a [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Level the message was written at (`Fatal` is written as `Error`)
    pub level: LogLevel,
    pub identity: Identity,
    pub message: String,
    /// Rendered error trace, when an error was attached
    pub trace: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} - {}", self.level, self.identity, self.message)?;
        if let Some(trace) = &self.trace {
            write!(f, "\n{}", trace)?;
        }
        Ok(())
    }
}

/// Sink keeping every record at or above a minimum level
#[derive(Debug)]
pub struct MemorySink {
    min_level: LogLevel,
    records: Mutex<Vec<Record>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Sink accepting every level
    pub fn new() -> Self {
        Self::with_min_level(LogLevel::Trace)
    }

    /// Sink accepting `min_level` and above; `Off` accepts nothing
    pub fn with_min_level(min_level: LogLevel) -> Self {
        Self {
            min_level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Records written at `level`
    pub fn at_level(&self, level: LogLevel) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Whether any record, formatted as `LEVEL identity - message`, contains
    /// `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|record| record.to_string().contains(needle))
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: LogLevel, identity: &Identity, message: &str, trace: Option<String>) {
        let Some(level) = level.effective() else {
            return;
        };
        self.records.lock().push(Record {
            level,
            identity: identity.clone(),
            message: message.to_string(),
            trace,
            logged_at: Utc::now(),
        });
    }
}

impl Sink for MemorySink {
    fn is_enabled(&self, level: LogLevel, _identity: &Identity) -> bool {
        match (level.effective(), self.min_level.effective()) {
            (Some(level), Some(min)) => level >= min,
            _ => false,
        }
    }

    fn log(&self, level: LogLevel, identity: &Identity, message: &str) {
        if self.is_enabled(level, identity) {
            self.push(level, identity, message, None);
        }
    }

    fn log_error(
        &self,
        level: LogLevel,
        identity: &Identity,
        message: &str,
        error: &(dyn StdError + 'static),
    ) {
        if self.is_enabled(level, identity) {
            self.push(level, identity, message, Some(error_trace(error)));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
