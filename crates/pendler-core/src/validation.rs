//! # Validation Module
//!
//! Input validation for entries before they reach the calculators.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end / CLI                                              │
//! │  ├── Form fields, argument parsing                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Dates and times parse                                             │
//! │  ├── Amounts and distances are not negative                            │
//! │  └── Notes stay within their length limit                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Calculators                                                  │
//! │  └── Total functions over validated input, never fail                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pendler_core::validation::{parse_date, parse_time, validate_distance};
//!
//! let date = parse_date("date", "2025-05-01").unwrap();
//! let time = parse_time("start_time", "08:00").unwrap();
//! assert!(validate_distance(-1.0).is_err());
//! ```

use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_NOTE_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted entry name (equipment, expense description).
pub const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// Date / Time Parsers
// =============================================================================

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("expected YYYY-MM-DD ({})", e),
    })
}

/// Parses a local time of day in `HH:MM` or `HH:MM:SS` form.
///
/// ## Example
/// ```rust
/// use pendler_core::validation::parse_time;
///
/// assert!(parse_time("end_time", "18:00").is_ok());
/// assert!(parse_time("end_time", "18:00:30").is_ok());
/// assert!(parse_time("end_time", "6 pm").is_err());
/// ```
pub fn parse_time(field: &str, value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected HH:MM ({})", e),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that an amount is not negative.
///
/// ## Example
/// ```rust
/// use pendler_core::money::Money;
/// use pendler_core::validation::validate_amount;
///
/// assert!(validate_amount("employer_expenses", Money::zero()).is_ok());
/// assert!(validate_amount("employer_expenses", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a distance in kilometres.
///
/// ## Rules
/// - Must be a finite number
/// - Must not be negative (zero is allowed: an unused commute preset)
pub fn validate_distance(km: f64) -> ValidationResult<()> {
    if !km.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "distance".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if km < 0.0 {
        return Err(ValidationError::Negative {
            field: "distance".to_string(),
        });
    }

    Ok(())
}

/// Validates a 0-indexed month (0 = January … 11 = December).
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if month > 11 {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 0,
            max: 11,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an optional free-text note (max 200 characters).
///
/// ## Returns
/// The trimmed note, or `None` when it is empty.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(if note.is_empty() {
        None
    } else {
        Some(note.to_string())
    })
}

/// Validates a required name (equipment, expense description).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(matches!(
            parse_date("date", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_date("date", "01.03.2024"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_date("date", "2024-02-30").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("start_time", "08:00").unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert!(parse_time("start_time", "25:00").is_err());
        assert!(parse_time("start_time", "  ").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", Money::from_cents(0)).is_ok());
        assert!(validate_amount("amount", Money::from_cents(7500)).is_ok());
        assert!(validate_amount("amount", Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_distance() {
        assert!(validate_distance(0.0).is_ok());
        assert!(validate_distance(42.5).is_ok());
        assert!(validate_distance(-0.1).is_err());
        assert!(validate_distance(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month(0).is_ok());
        assert!(validate_month(11).is_ok());
        assert!(validate_month(12).is_err());
    }

    #[test]
    fn test_validate_note() {
        assert_eq!(validate_note(None).unwrap(), None);
        assert_eq!(validate_note(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_note(Some(" Monatspauschale ")).unwrap(),
            Some("Monatspauschale".to_string())
        );
        assert!(validate_note(Some(&"x".repeat(200))).is_ok());
        assert!(validate_note(Some(&"x".repeat(201))).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Laptop").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }
}
