//! # CLI Error Type
//!
//! Unified error type for every command.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Pendler CLI                            │
//! │                                                                         │
//! │  Command Function ──► AppResult<String>                                 │
//! │         │                                                               │
//! │         ├── Config file unreadable? ── AppError::Io / ConfigParse ──┐  │
//! │         ├── Backup malformed?       ── AppError::Json / Backup ─────┤  │
//! │         ├── Rejected input?         ── AppError::Core(Validation) ──┤  │
//! │         │                                                           ▼  │
//! │         │                               run(): error!(code, msg)       │
//! │         │                                      exit code per ErrorCode │
//! │         ▼                                                               │
//! │  Success ──► output printed to stdout                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--json` a failure is also printed as:
//! ```json
//! { "code": "VALIDATION_ERROR", "message": "price must not be negative" }
//! ```

use std::fmt;
use std::path::PathBuf;

use pendler_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Result type for CLI operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain error from the calculation engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No backup file was given on the command line or in the config.
    #[error("no backup file given (use --data or set data.backup_file)")]
    MissingData,

    /// Backup JSON is well-formed but has unusable content.
    #[error("invalid backup: {0}")]
    Backup(String),

    /// Backup JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Config file could not be parsed.
    #[error("config file error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("config serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Rendering command output failed.
    #[error("output formatting failed")]
    Format(#[from] fmt::Error),

    /// File system error, with the file involved.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Core(CoreError::Validation(err))
    }
}

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced entry does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Backup file missing or malformed
    BackupError,

    /// Configuration missing or malformed
    ConfigError,

    /// File system error
    IoError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BackupError => "BACKUP_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Process exit code, following the BSD `sysexits` numbers.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::NotFound => 66,
            ErrorCode::ValidationError | ErrorCode::BackupError => 65,
            ErrorCode::ConfigError => 78,
            ErrorCode::IoError => 74,
            ErrorCode::Internal => 70,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable form of an error for `--json` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Core(CoreError::EntryNotFound { .. }) => ErrorCode::NotFound,
            AppError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            AppError::Core(CoreError::Export(_)) | AppError::Format(_) => ErrorCode::Internal,
            AppError::MissingData | AppError::Backup(_) | AppError::Json(_) => ErrorCode::BackupError,
            AppError::Config(_) | AppError::ConfigParse(_) | AppError::ConfigWrite(_) => ErrorCode::ConfigError,
            AppError::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Logs the error and converts it for display.
    pub fn report(&self) -> ErrorReport {
        match self {
            AppError::Core(CoreError::Export(e)) => tracing::error!("CSV export failed: {}", e),
            AppError::Io { path, source } => tracing::error!(?path, "File access failed: {}", source),
            other => tracing::error!(code = %other.code(), "{}", other),
        }

        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_validation_code() {
        let err: AppError = ValidationError::Negative {
            field: "price".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.to_string(), "Validation error: price must not be negative");
        assert_eq!(err.code().exit_code(), 65);
    }

    #[test]
    fn test_not_found_code() {
        let err = AppError::Core(CoreError::EntryNotFound {
            entity: "Equipment".to_string(),
            id: "e9".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.report().message, "Equipment not found: e9");
    }

    #[test]
    fn test_format_error_is_internal() {
        let err = AppError::from(fmt::Error);
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.code().exit_code(), 70);
    }

    #[test]
    fn test_report_serializes_code() {
        let report = AppError::MissingData.report();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"code\":\"BACKUP_ERROR\""));
    }
}
