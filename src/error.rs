//! Unified error hierarchy for sleeprs
//!
//! The estimation pipeline itself is total and never returns these errors;
//! they cover the boundary: reading histories, parsing instants and loading
//! configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sleeprs boundary operations
#[derive(Debug, Error)]
pub enum SleepRsError {
    /// Input value parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Sleep history import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors converting boundary values into internal representations
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not an ISO-8601 date-time
    #[error("Invalid ISO-8601 instant: {input}")]
    InvalidInstant { input: String },

    /// Epoch seconds that are not finite or outside the representable range
    #[error("Invalid epoch timestamp: {value}")]
    InvalidTimestamp { value: String },

    /// Non-numeric value in a numeric column
    #[error("Invalid number in {column}: {input}")]
    InvalidNumber { column: String, input: String },

    /// Not a `YYYY-MM-DD` date
    #[error("Invalid date: {input}")]
    InvalidDate { input: String },
}

/// Sleep history import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// A row could not be converted into a sleep entry
    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
}

/// Result type alias for sleeprs operations
pub type Result<T> = std::result::Result<T, SleepRsError>;

impl SleepRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SleepRsError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            SleepRsError::Parse(_) => ErrorSeverity::Warning,
            SleepRsError::Import(ImportError::InvalidRecord { .. }) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SleepRsError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find sleep history file: {}", path.display())
            }
            SleepRsError::Import(ImportError::UnsupportedFormat { format }) => {
                format!("Unsupported sleep history format '{}'. Use json or csv.", format)
            }
            SleepRsError::Parse(ParseError::InvalidInstant { input }) => {
                format!(
                    "Could not read '{}' as a date and time. Use a format like 2024-03-04T07:30:00Z.",
                    input
                )
            }
            SleepRsError::Configuration(reason) => {
                format!("Invalid configuration: {}. Run `sleeprs config --init` to start over.", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Warning that the user can fix by correcting input
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = SleepRsError::Import(ImportError::FileNotFound {
            path: PathBuf::from("/tmp/history.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = SleepRsError::Configuration("bad".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_user_messages() {
        let err: SleepRsError = ParseError::InvalidInstant {
            input: "noon-ish".to_string(),
        }
        .into();
        assert!(err.user_message().contains("noon-ish"));
        assert!(err.user_message().contains("2024-03-04T07:30:00Z"));

        let err = SleepRsError::Import(ImportError::UnsupportedFormat {
            format: "xml".to_string(),
        });
        assert!(err.user_message().contains("json or csv"));

        let err = SleepRsError::Configuration("invalid UTC offset: 1440 minutes".to_string());
        assert!(err.user_message().contains("1440"));
        assert!(err.user_message().contains("config --init"));
    }
}
