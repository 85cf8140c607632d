//! Call-Site Configuration
//!
//! A [`LogSpec`] is the resolved logging configuration of one instrumented
//! call site. It is built once (by hand, by a macro or by whatever framework
//! wires calls through the [`Interceptor`](crate::Interceptor)) and shared
//! immutably by every invocation of that site.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::ErrorType;

// =============================================================================
// Log Level
// =============================================================================

/// Severity at which a call site logs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl LogLevel {
    /// Level a conventional leveled logger actually writes at.
    ///
    /// `Fatal` has no counterpart in most loggers and is written as `Error`;
    /// `Off` writes nothing.
    pub fn effective(self) -> Option<LogLevel> {
        match self {
            LogLevel::Off => None,
            LogLevel::Fatal => Some(LogLevel::Error),
            level => Some(level),
        }
    }

    /// Equivalent `tracing` level, if any
    pub fn as_tracing(self) -> Option<tracing::Level> {
        match self.effective()? {
            LogLevel::Trace => Some(tracing::Level::TRACE),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            _ => Some(tracing::Level::ERROR),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Fatal => write!(f, "FATAL"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            "off" => Ok(LogLevel::Off),
            other => Err(crate::error::Error::Config(format!(
                "Unknown log level: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Warn Unit
// =============================================================================

/// Unit of [`LogSpec::warn_over`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarnUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    #[default]
    Minutes,
    Hours,
    Days,
}

impl WarnUnit {
    /// Convert `amount` of this unit to whole milliseconds.
    ///
    /// Finer units truncate, coarser units saturate.
    pub fn to_millis(self, amount: i64) -> i64 {
        match self {
            WarnUnit::Nanoseconds => amount / 1_000_000,
            WarnUnit::Microseconds => amount / 1_000,
            WarnUnit::Milliseconds => amount,
            WarnUnit::Seconds => amount.saturating_mul(1_000),
            WarnUnit::Minutes => amount.saturating_mul(60_000),
            WarnUnit::Hours => amount.saturating_mul(3_600_000),
            WarnUnit::Days => amount.saturating_mul(86_400_000),
        }
    }
}

// =============================================================================
// Call Site
// =============================================================================

/// Static identity of an instrumented function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Declaring type (or module) path, used as the default logger identity
    pub declaring_type: &'static str,
    /// Method name as it appears in messages
    pub method: &'static str,
}

impl CallSite {
    pub const fn new(declaring_type: &'static str, method: &'static str) -> Self {
        Self {
            declaring_type,
            method,
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.declaring_type, self.method)
    }
}

// =============================================================================
// Log Spec
// =============================================================================

/// Resolved logging configuration for one call site
#[derive(Debug, Clone, PartialEq)]
pub struct LogSpec {
    /// Level of the enter and after messages
    pub level: LogLevel,

    /// Logger name; empty means "use the declaring type"
    pub name: String,

    /// Log before the call runs
    pub entered: bool,

    /// Render arguments as `..`
    pub skip_args: bool,

    /// Render the result as `..`
    pub skip_result: bool,

    /// Error types logged without their trace
    pub ignore: Vec<&'static ErrorType>,

    /// Slow-call threshold, negative disables warnings
    pub warn_over: i64,

    /// Unit of `warn_over`
    pub warn_unit: WarnUnit,
}

impl Default for LogSpec {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            name: String::new(),
            entered: false,
            skip_args: false,
            skip_result: false,
            ignore: Vec::new(),
            warn_over: -1,
            warn_unit: WarnUnit::Minutes,
        }
    }
}

impl LogSpec {
    /// Create a spec logging at `level` with every other option defaulted
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_entered(mut self, entered: bool) -> Self {
        self.entered = entered;
        self
    }

    pub fn with_skip_args(mut self, skip: bool) -> Self {
        self.skip_args = skip;
        self
    }

    pub fn with_skip_result(mut self, skip: bool) -> Self {
        self.skip_result = skip;
        self
    }

    /// Add an error type whose trace is not attached when logged
    pub fn with_ignore(mut self, error_type: &'static ErrorType) -> Self {
        self.ignore.push(error_type);
        self
    }

    /// Warn when a call runs longer than `amount` of `unit`
    pub fn with_warn_over(mut self, amount: i64, unit: WarnUnit) -> Self {
        self.warn_over = amount;
        self.warn_unit = unit;
        self
    }

    /// Whether slow-call warnings are enabled
    pub fn warns(&self) -> bool {
        self.warn_over >= 0
    }

    /// Threshold in whole milliseconds, if warnings are enabled
    pub fn warn_threshold_millis(&self) -> Option<i64> {
        self.warns()
            .then(|| self.warn_unit.to_millis(self.warn_over))
    }

    /// Whether `elapsed` strictly exceeds the threshold.
    ///
    /// Both sides compare in whole milliseconds; a call that runs exactly as
    /// long as the threshold does not warn.
    pub fn is_over(&self, elapsed: Duration) -> bool {
        match self.warn_threshold_millis() {
            Some(threshold) => {
                let elapsed = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
                elapsed > threshold
            }
            None => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::IO_ERROR;

    // =========================================================================
    // LogLevel Tests
    // =========================================================================

    #[test]
    fn test_log_level_effective() {
        assert_eq!(LogLevel::Fatal.effective(), Some(LogLevel::Error));
        assert_eq!(LogLevel::Off.effective(), None);
        assert_eq!(LogLevel::Debug.effective(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_log_level_as_tracing() {
        assert_eq!(LogLevel::Trace.as_tracing(), Some(tracing::Level::TRACE));
        assert_eq!(LogLevel::Fatal.as_tracing(), Some(tracing::Level::ERROR));
        assert_eq!(LogLevel::Off.as_tracing(), None);
    }

    #[test]
    fn test_log_level_parse_and_display() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("FATAL".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Info.to_string(), "INFO");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Error < LogLevel::Fatal);
        assert!(LogLevel::Fatal < LogLevel::Off);
    }

    // =========================================================================
    // WarnUnit Tests
    // =========================================================================

    #[test]
    fn test_warn_unit_to_millis() {
        assert_eq!(WarnUnit::Nanoseconds.to_millis(2_999_999), 2);
        assert_eq!(WarnUnit::Microseconds.to_millis(1_500), 1);
        assert_eq!(WarnUnit::Milliseconds.to_millis(7), 7);
        assert_eq!(WarnUnit::Seconds.to_millis(2), 2_000);
        assert_eq!(WarnUnit::Minutes.to_millis(1), 60_000);
        assert_eq!(WarnUnit::Hours.to_millis(1), 3_600_000);
        assert_eq!(WarnUnit::Days.to_millis(1), 86_400_000);
        assert_eq!(WarnUnit::Days.to_millis(i64::MAX), i64::MAX);
    }

    // =========================================================================
    // LogSpec Tests
    // =========================================================================

    #[test]
    fn test_log_spec_default() {
        let spec = LogSpec::default();

        assert_eq!(spec.level, LogLevel::Info);
        assert!(spec.name.is_empty());
        assert!(!spec.entered);
        assert!(!spec.skip_args);
        assert!(!spec.skip_result);
        assert!(spec.ignore.is_empty());
        assert_eq!(spec.warn_over, -1);
        assert_eq!(spec.warn_unit, WarnUnit::Minutes);
        assert!(!spec.warns());
        assert_eq!(spec.warn_threshold_millis(), None);
    }

    #[test]
    fn test_log_spec_builder() {
        let spec = LogSpec::new(LogLevel::Debug)
            .with_name("orders")
            .with_entered(true)
            .with_skip_args(true)
            .with_skip_result(true)
            .with_ignore(&IO_ERROR)
            .with_warn_over(2, WarnUnit::Seconds);

        assert_eq!(spec.level, LogLevel::Debug);
        assert_eq!(spec.name, "orders");
        assert!(spec.entered && spec.skip_args && spec.skip_result);
        assert_eq!(spec.ignore.len(), 1);
        assert_eq!(spec.warn_threshold_millis(), Some(2_000));
    }

    #[test]
    fn test_is_over_is_strict() {
        let spec = LogSpec::default().with_warn_over(2, WarnUnit::Seconds);

        assert!(!spec.is_over(Duration::from_millis(1_999)));
        assert!(!spec.is_over(Duration::from_millis(2_000)));
        // Sub-millisecond remainder is discarded before comparing
        assert!(!spec.is_over(Duration::from_micros(2_000_900)));
        assert!(spec.is_over(Duration::from_millis(2_001)));
    }

    #[test]
    fn test_is_over_disabled() {
        let spec = LogSpec::default();
        assert!(!spec.is_over(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_zero_threshold_warns_after_one_milli() {
        let spec = LogSpec::default().with_warn_over(0, WarnUnit::Seconds);
        assert!(spec.warns());
        assert!(!spec.is_over(Duration::from_micros(999)));
        assert!(spec.is_over(Duration::from_millis(1)));
    }

    #[test]
    fn test_call_site_display() {
        let site = CallSite::new("billing::Invoices", "issue");
        assert_eq!(site.to_string(), "billing::Invoices#issue");
    }
}
