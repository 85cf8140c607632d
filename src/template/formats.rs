//! Message Formats
//!
//! The five message templates and their process-wide installation.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_ENTER: &str = "#${method.name}(${method.args}): entered";

pub const DEFAULT_WARN_BEFORE: &str = "#${method.name}(${method.args}): \
    in ${method.duration} and still running (max ${method.warn.duration})";

pub const DEFAULT_WARN_AFTER: &str = "#${method.name}(${method.args}): \
    ${method.result} in ${method.duration} (max ${method.warn.duration})";

pub const DEFAULT_AFTER: &str = "#${method.name}(${method.args}): \
    ${method.result} in ${method.duration}";

pub const DEFAULT_ERROR: &str = "#${method.name}(${method.args}): \
    thrown ${error.class.name}(${error.message}) \
    from ${error.source.class.name}[${error.source.line}] in ${method.duration}";

// =============================================================================
// Logger Formats
// =============================================================================

/// Message templates, one per kind of message
///
/// Any template left out of a formats file keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerFormats {
    /// Before the call runs
    pub enter: String,

    /// Call still running past its threshold
    pub warn_before: String,

    /// Call returned after its threshold
    pub warn_after: String,

    /// Call returned in time
    pub after: String,

    /// Call failed
    pub error: String,
}

impl Default for LoggerFormats {
    fn default() -> Self {
        Self {
            enter: DEFAULT_ENTER.to_string(),
            warn_before: DEFAULT_WARN_BEFORE.to_string(),
            warn_after: DEFAULT_WARN_AFTER.to_string(),
            after: DEFAULT_AFTER.to_string(),
            error: DEFAULT_ERROR.to_string(),
        }
    }
}

impl LoggerFormats {
    /// Parse formats from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse formats from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load formats from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(Error::UnsupportedFormatsFile {
                path: path.display().to_string(),
            }),
        }
    }
}

// =============================================================================
// Process-wide Formats
// =============================================================================

static FORMATS: OnceCell<Arc<LoggerFormats>> = OnceCell::new();

/// Install the process-wide formats.
///
/// Must happen once, at startup, before anything reads [`current`]; a second
/// install, or an install after the defaults were already handed out, fails.
pub fn install(formats: LoggerFormats) -> Result<()> {
    FORMATS
        .set(Arc::new(formats))
        .map_err(|_| Error::FormatsAlreadyInstalled)?;
    info!("Installed custom logger formats");
    Ok(())
}

/// The process-wide formats, or the defaults if none were installed
pub fn current() -> Arc<LoggerFormats> {
    Arc::clone(FORMATS.get_or_init(|| Arc::new(LoggerFormats::default())))
}

// =============================================================================
// Tests
// =============================================================================
