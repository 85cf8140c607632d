//! Error types for Loggable
//!
//! Failures of the wrapped calls never pass through this type: the
//! interceptor hands them back to the caller untouched. These errors only
//! cover setting the library up (loading and installing message formats,
//! starting the warning monitor).

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring Loggable
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML formats file could not be parsed
    #[error("Failed to parse YAML formats: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON formats file could not be parsed
    #[error("Failed to parse JSON formats: {0}")]
    Json(#[from] serde_json::Error),

    /// Formats file extension is not one we can read
    #[error("Unsupported formats file '{path}': expected .yaml, .yml or .json")]
    UnsupportedFormatsFile { path: String },

    /// Process-wide formats were already installed or already read
    #[error("Logger formats are already installed for this process")]
    FormatsAlreadyInstalled,

    /// The warning monitor's thread is already running
    #[error("Warning monitor is already started")]
    MonitorAlreadyStarted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedFormatsFile {
            path: "formats.toml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported formats file 'formats.toml': expected .yaml, .yml or .json"
        );

        assert_eq!(
            Error::MonitorAlreadyStarted.to_string(),
            "Warning monitor is already started"
        );

        let err = Error::Config("monitor period must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: monitor period must be positive"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: missing");
    }

    #[test]
    fn test_result_alias() {
        fn installed() -> Result<u8> {
            Err(Error::FormatsAlreadyInstalled)
        }
        assert!(installed().is_err());
    }
}
