//! # Error Types
//!
//! Domain-specific error types for pendler-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pendler-core errors (this file)                                       │
//! │  ├── CoreError        - Ledger and export failures                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pendler-cli errors (app)                                              │
//! │  └── AppError         - What the terminal user sees                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → stderr                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calculators never fail for well-formed input. Errors only come from
//! rejecting malformed input (negative amounts, unparsable dates) and from
//! ledger operations that reference an entry that does not exist.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An edit referenced an entry id that is not in the ledger.
    ///
    /// ## When This Occurs
    /// - Editing a trip that was deleted in the meantime
    /// - Editing equipment with a stale id
    ///
    /// Deletes never produce this error: deleting an unknown id is a no-op.
    #[error("{entity} not found: {id}")]
    EntryNotFound { entity: String, id: String },

    /// Building the CSV export failed.
    #[error("CSV export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are surfaced to the caller as a rejection with a human-readable
/// reason. Nothing is silently clamped except the documented zero floor on
/// deductibles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amount or distance is below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. invalid date or time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An end lies before its start.
    #[error("{field} must not be before {start_field}")]
    EndBeforeStart { field: String, start_field: String },

    /// Duplicate value (e.g. a month that already has employer expenses).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
