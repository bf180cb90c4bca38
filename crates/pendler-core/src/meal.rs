//! # Meal Allowance (Verpflegungsmehraufwand)
//!
//! Turns an absence period into a per-diem deduction.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  date + start_time ─┐                                                   │
//! │                     ├──► duration (h) ──► tier ──► rate                 │
//! │  end_date + end_time┘        │                      │                   │
//! │                              │                      ▼                   │
//! │           no end date and    │          deductible = max(0, rate − AG)  │
//! │           end < start ──► +24h (wrapped)                                │
//! │                                                                         │
//! │  Tiers:  duration ≥ 24h ──► meal_rate_24h                               │
//! │          8h ≤ duration < 24h ──► meal_rate_8h                           │
//! │          duration < 8h ──► 0                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use pendler_core::meal::{calculate_meal_allowance, TripInput};
//! use pendler_core::{Money, TaxRates};
//!
//! let input = TripInput::new(
//!     NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
//!     Some(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()),
//!     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     Money::from_cents(1000),
//! );
//!
//! let meal = calculate_meal_allowance(&input, &TaxRates::default());
//! assert_eq!(meal.duration, 25.0);
//! assert_eq!(meal.rate.cents(), 2800);
//! assert_eq!(meal.deductible.cents(), 1800);
//! ```

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::rates::TaxRates;
use crate::types::{EmployerRefundSettings, TripEntry};
use crate::validation::{parse_date, parse_time, validate_amount, validate_note, ValidationResult};

// =============================================================================
// Input
// =============================================================================

/// Raw user input for a trip, before derived fields are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Omitted for single-day trips.
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,

    #[serde(with = "crate::types::hhmm")]
    #[ts(as = "String")]
    pub start_time: NaiveTime,

    #[serde(with = "crate::types::hhmm")]
    #[ts(as = "String")]
    pub end_time: NaiveTime,

    #[serde(default)]
    pub employer_expenses: Money,

    #[serde(default)]
    pub receipt_file_name: Option<String>,

    #[serde(default)]
    pub note: Option<String>,
}

impl TripInput {
    pub fn new(
        date: NaiveDate,
        end_date: Option<NaiveDate>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        employer_expenses: Money,
    ) -> Self {
        TripInput {
            date,
            end_date,
            start_time,
            end_time,
            employer_expenses,
            receipt_file_name: None,
            note: None,
        }
    }

    /// Parses form strings (`YYYY-MM-DD`, `HH:MM`) into an input.
    ///
    /// An empty end date counts as omitted.
    pub fn parse(
        date: &str,
        end_date: Option<&str>,
        start_time: &str,
        end_time: &str,
        employer_expenses: Money,
    ) -> ValidationResult<Self> {
        let end_date = match end_date.map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_date("endDate", raw)?),
            _ => None,
        };

        Ok(TripInput::new(
            parse_date("date", date)?,
            end_date,
            parse_time("startTime", start_time)?,
            parse_time("endTime", end_time)?,
            employer_expenses,
        ))
    }

    /// Validates the input.
    ///
    /// ## Rules
    /// - Employer reimbursement is not negative
    /// - An explicit end date is not before the start date
    /// - With an explicit end date, the end instant is not before the start
    ///   instant (the 24h wrap only applies without an end date)
    /// - The note stays within its length limit
    pub fn validate(&self) -> ValidationResult<()> {
        validate_amount("employerExpenses", self.employer_expenses)?;

        if let Some(end_date) = self.end_date {
            if end_date < self.date {
                return Err(ValidationError::EndBeforeStart {
                    field: "endDate".to_string(),
                    start_field: "date".to_string(),
                });
            }
            if end_date == self.date && self.end_time < self.start_time {
                return Err(ValidationError::EndBeforeStart {
                    field: "endTime".to_string(),
                    start_field: "startTime".to_string(),
                });
            }
        }

        validate_note(self.note.as_deref())?;
        Ok(())
    }

    /// Last day of the absence.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.date)
    }
}

// =============================================================================
// Duration & Tier
// =============================================================================

/// Absence duration in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsenceDuration {
    pub hours: f64,
    /// 24 hours were added because the end time lay before the start time
    /// and no end date was given.
    pub wrapped: bool,
}

/// Computes the absence duration between two local instants.
///
/// No time zone or DST handling: both instants are naive local times.
pub fn absence_duration(
    date: NaiveDate,
    end_date: Option<NaiveDate>,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> AbsenceDuration {
    let start = date.and_time(start_time);
    let end = end_date.unwrap_or(date).and_time(end_time);
    let hours = (end - start).num_seconds() as f64 / 3600.0;

    if hours < 0.0 && end_date.is_none() {
        return AbsenceDuration {
            hours: hours + 24.0,
            wrapped: true,
        };
    }

    AbsenceDuration {
        hours,
        wrapped: false,
    }
}

/// Returns the per-diem tier for a duration.
///
/// ```rust
/// use pendler_core::meal::rate_for_duration;
/// use pendler_core::TaxRates;
///
/// let rates = TaxRates::default();
/// assert_eq!(rate_for_duration(7.99, &rates).cents(), 0);
/// assert_eq!(rate_for_duration(8.0, &rates).cents(), 1400);
/// assert_eq!(rate_for_duration(24.0, &rates).cents(), 2800);
/// ```
pub fn rate_for_duration(hours: f64, rates: &TaxRates) -> Money {
    if hours >= 24.0 {
        rates.meal_rate_24h
    } else if hours >= 8.0 {
        rates.meal_rate_8h
    } else {
        Money::zero()
    }
}

// =============================================================================
// Allowance
// =============================================================================

/// Result of the per-diem calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealAllowance {
    pub duration: f64,
    pub wrapped: bool,
    pub rate: Money,
    pub deductible: Money,
}

/// Computes duration, tier and net deductible for a trip.
///
/// Total over validated input; a reimbursement above the rate floors the
/// deductible at zero.
pub fn calculate_meal_allowance(input: &TripInput, rates: &TaxRates) -> MealAllowance {
    let duration = absence_duration(input.date, input.end_date, input.start_time, input.end_time);

    if duration.wrapped {
        warn!(
            date = %input.date,
            start = %input.start_time,
            end = %input.end_time,
            "End time before start time without end date, assuming next day"
        );
    }

    let rate = rate_for_duration(duration.hours, rates);
    let deductible = (rate - input.employer_expenses).floor_zero();

    debug!(
        hours = duration.hours,
        rate = rate.cents(),
        deductible = deductible.cents(),
        "Meal allowance calculated"
    );

    MealAllowance {
        duration: duration.hours,
        wrapped: duration.wrapped,
        rate,
        deductible,
    }
}

/// Suggests the employer reimbursement for a trip of the given length.
///
/// Returns the configured amount when the absence reaches the threshold,
/// otherwise zero. Without refund settings nothing is suggested.
pub fn suggest_employer_refund(hours: f64, settings: Option<&EmployerRefundSettings>) -> Money {
    match settings {
        Some(refund) if hours >= refund.threshold_hours => refund.amount,
        _ => Money::zero(),
    }
}

// =============================================================================
// Trip Entry Construction
// =============================================================================

impl TripEntry {
    /// Validates the input and builds a trip with all derived fields.
    pub fn from_input(id: impl Into<String>, input: &TripInput, rates: &TaxRates) -> ValidationResult<Self> {
        input.validate()?;
        let meal = calculate_meal_allowance(input, rates);

        Ok(TripEntry {
            id: id.into(),
            date: input.date,
            end_date: input.last_day(),
            start_time: input.start_time,
            end_time: input.end_time,
            employer_expenses: input.employer_expenses,
            duration: meal.duration,
            rate: meal.rate,
            deductible: meal.deductible,
            wrapped: meal.wrapped,
            receipt_file_name: input.receipt_file_name.clone(),
            note: validate_note(input.note.as_deref())?,
        })
    }

    /// Rebuilds the input this trip was created from.
    ///
    /// A wrapped trip was entered without an end date, so none is returned.
    pub fn to_input(&self) -> TripInput {
        TripInput {
            date: self.date,
            end_date: if self.wrapped { None } else { Some(self.end_date) },
            start_time: self.start_time,
            end_time: self.end_time,
            employer_expenses: self.employer_expenses,
            receipt_file_name: self.receipt_file_name.clone(),
            note: self.note.clone(),
        }
    }

    /// Recomputes duration, rate and deductible from the stored inputs.
    ///
    /// Running it twice yields identical fields.
    pub fn recompute(&mut self, rates: &TaxRates) {
        let meal = calculate_meal_allowance(&self.to_input(), rates);
        self.duration = meal.duration;
        self.rate = meal.rate;
        self.deductible = meal.deductible;
        self.wrapped = meal.wrapped;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
