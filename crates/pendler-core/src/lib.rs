//! # pendler-core: Pure Deduction Engine for Pendler
//!
//! This crate turns raw bookkeeping entries (business trips, mileage legs,
//! equipment purchases, employer reimbursements) into tax-deductible amounts,
//! and rolls them up by month and year. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pendler Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pendler-cli (app)                            │   │
//! │  │    config ──► backup import ──► summary / months / export       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pendler-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   meal    │  │  mileage  │  │ equipment │  │ aggregate │  │   │
//! │  │   │ per-diem  │  │ legs, km  │  │ GWG, AfA  │  │  months   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  rollup   │  │  ledger   │  │  export   │  │ validation│  │   │
//! │  │   │   year    │  │   state   │  │    CSV    │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer cents
//! - [`types`] - Entry types (TripEntry, MileageEntry, EquipmentEntry, ...)
//! - [`rates`] - Tax rates (per-diem tiers, mileage rates, GWG limit)
//! - [`meal`] - Absence duration and per-diem calculation
//! - [`mileage`] - Mileage allowance and station/commute legs
//! - [`equipment`] - GWG deduction and 3-year depreciation
//! - [`aggregate`] - Monthly buckets for one year
//! - [`rollup`] - Yearly totals, balance sheet, recent activity
//! - [`ledger`] - Application state with cascade delete and upserts
//! - [`export`] - Flat CSV text export
//! - [`error`] / [`validation`] - Typed errors and input rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same entries + same rates = same totals
//! 2. **No I/O**: reading backups and receipt files is the app's job
//! 3. **Integer Money**: all amounts are cents, sums are exact
//! 4. **Explicit State**: calculators receive rates and entries as arguments
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pendler_core::equipment::deductible_for_year;
//! use pendler_core::Money;
//!
//! let price = Money::from_cents(300_000); // 3000.00 €
//! let bought = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let gwg_limit = Money::from_cents(95_200);
//!
//! assert_eq!(deductible_for_year(price, bought, 2024, gwg_limit).cents(), 83_333);
//! assert_eq!(deductible_for_year(price, bought, 2025, gwg_limit).cents(), 100_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod equipment;
pub mod error;
pub mod export;
pub mod ledger;
pub mod meal;
pub mod mileage;
pub mod money;
pub mod rates;
pub mod rollup;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Backup, Ledger};
pub use money::Money;
pub use rates::TaxRates;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Useful life of depreciable equipment, in years.
///
/// The depreciation window spans `USEFUL_LIFE_YEARS * 12` months starting in
/// the purchase month.
pub const USEFUL_LIFE_YEARS: i32 = 3;

/// Total months in the depreciation window.
pub const USEFUL_LIFE_MONTHS: i64 = USEFUL_LIFE_YEARS as i64 * 12;

/// Maximum length of free-text notes (monthly employer expenses, trips).
pub const MAX_NOTE_LENGTH: usize = 200;

/// Logical directory for receipt files. Only the key is built here.
pub const RECEIPTS_DIR: &str = "receipts";

/// Purpose tag marking the outbound leg of a business trip.
pub const STATION_BEGIN_TAG: &str = "Beginn";

/// Purpose tag marking the return leg of a business trip.
pub const STATION_END_TAG: &str = "Ende";
