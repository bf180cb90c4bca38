//! # Equipment Depreciation (Arbeitsmittel)
//!
//! Low-value assets (GWG) are deducted in full in their purchase year. Every
//! other asset is depreciated month by month over three years, starting in
//! the purchase month.
//!
//! ## Depreciation Window
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Purchase 2024-03 (m = 2, 0-indexed), price 3000.00 €                   │
//! │                                                                         │
//! │   2024          2025          2026          2027                        │
//! │   ┌────────┐   ┌──────────┐  ┌──────────┐  ┌──┐                         │
//! │   │ 12 − m │   │    12    │  │    12    │  │ m│   Σ months = 36         │
//! │   │  = 10  │   │          │  │          │  │=2│                         │
//! │   └────────┘   └──────────┘  └──────────┘  └──┘                         │
//! │    833.33       1000.00       1000.00     166.67   Σ = 3000.00          │
//! │                                                                         │
//! │  deduction(year) = round(price × months / 36)                           │
//! │  the last year with months > 0 takes the cent remainder                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::EquipmentEntry;
use crate::validation::{validate_amount, validate_name, ValidationResult};
use crate::{USEFUL_LIFE_MONTHS, USEFUL_LIFE_YEARS};

/// Status label for low-value assets.
pub const STATUS_GWG: &str = "GWG (Sofortabzug)";

// =============================================================================
// Classification
// =============================================================================

/// Returns true if the price qualifies for immediate deduction.
///
/// The limit is inclusive: an asset priced exactly at the limit is GWG.
#[inline]
pub fn is_gwg(price: Money, gwg_limit: Money) -> bool {
    price <= gwg_limit
}

/// 0-indexed purchase month (0 = January).
#[inline]
fn purchase_month(purchase_date: NaiveDate) -> u32 {
    purchase_date.month0()
}

/// Last calendar year touched by the depreciation window.
#[inline]
pub fn end_year(purchase_date: NaiveDate) -> i32 {
    purchase_date.year() + USEFUL_LIFE_YEARS
}

/// Last year in which at least one month is depreciated.
///
/// A January purchase uses up its 36 months by the end of
/// `purchase_year + 2`.
fn last_active_year(purchase_date: NaiveDate) -> i32 {
    if purchase_month(purchase_date) == 0 {
        end_year(purchase_date) - 1
    } else {
        end_year(purchase_date)
    }
}

/// Number of depreciated months of a depreciable asset in `year`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pendler_core::equipment::months_in_year;
///
/// let december = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
/// assert_eq!(months_in_year(december, 2024), 1);
/// assert_eq!(months_in_year(december, 2025), 12);
/// assert_eq!(months_in_year(december, 2027), 11);
/// assert_eq!(months_in_year(december, 2028), 0);
/// ```
pub fn months_in_year(purchase_date: NaiveDate, year: i32) -> u32 {
    let purchase_year = purchase_date.year();
    let month = purchase_month(purchase_date);

    if year < purchase_year || year > end_year(purchase_date) {
        0
    } else if year == purchase_year {
        12 - month
    } else if year < end_year(purchase_date) {
        12
    } else {
        month
    }
}

// =============================================================================
// Yearly Deduction
// =============================================================================

fn pro_rata(price: Money, months: u32) -> Money {
    price.mul_ratio(months as i64, USEFUL_LIFE_MONTHS)
}

/// Deductible amount of an equipment purchase in `year`.
///
/// ## Rules
/// - GWG: the full price in the purchase year, 0 otherwise
/// - Depreciable: `round(price × months / 36)`, capped at what earlier years
///   left over; the last active year takes the rest so the years sum exactly
///   to the price and none goes negative
/// - Years outside the window yield 0
pub fn deductible_for_year(price: Money, purchase_date: NaiveDate, year: i32, gwg_limit: Money) -> Money {
    if is_gwg(price, gwg_limit) {
        return if year == purchase_date.year() {
            price
        } else {
            Money::zero()
        };
    }

    let months = months_in_year(purchase_date, year);
    if months == 0 {
        return Money::zero();
    }

    let mut remaining = price;
    for earlier in purchase_date.year()..year {
        remaining = remaining - pro_rata(price, months_in_year(purchase_date, earlier)).min(remaining);
    }

    if year == last_active_year(purchase_date) {
        remaining
    } else {
        pro_rata(price, months).min(remaining)
    }
}

/// Label shown next to an equipment entry.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pendler_core::equipment::status_label;
/// use pendler_core::Money;
///
/// let limit = Money::from_cents(95_200);
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(status_label(Money::from_cents(50_000), date, limit), "GWG (Sofortabzug)");
/// assert_eq!(status_label(Money::from_cents(300_000), date, limit), "Abschreibung 2024 (10 Mon.)");
/// ```
pub fn status_label(price: Money, purchase_date: NaiveDate, gwg_limit: Money) -> String {
    if is_gwg(price, gwg_limit) {
        STATUS_GWG.to_string()
    } else {
        format!(
            "Abschreibung {} ({} Mon.)",
            purchase_date.year(),
            months_in_year(purchase_date, purchase_date.year())
        )
    }
}

// =============================================================================
// Monthly Spread
// =============================================================================

/// Spreads the deduction of `year` over calendar months (index 0-11).
///
/// GWG assets land entirely in the purchase month. Depreciable assets split
/// the year's deduction evenly over the active months in whole cents, with
/// the remainder on the last active month, so the twelve values always sum to
/// [`deductible_for_year`].
pub fn monthly_spread(price: Money, purchase_date: NaiveDate, year: i32, gwg_limit: Money) -> [Money; 12] {
    let mut months = [Money::zero(); 12];
    let year_amount = deductible_for_year(price, purchase_date, year, gwg_limit);
    if year_amount.is_zero() {
        return months;
    }

    if is_gwg(price, gwg_limit) {
        months[purchase_month(purchase_date) as usize] = year_amount;
        return months;
    }

    let first = if year == purchase_date.year() {
        purchase_month(purchase_date)
    } else {
        0
    };
    let count = months_in_year(purchase_date, year);
    let last = first + count - 1;

    let share = Money::from_cents(year_amount.cents() / count as i64);
    for month in first..last {
        months[month as usize] = share;
    }
    months[last as usize] = year_amount - share * (count as i64 - 1);

    months
}

// =============================================================================
// Schedule
// =============================================================================

/// One year of a depreciation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleYear {
    pub year: i32,
    pub deduction: Money,
    pub months: u32,
    pub is_current_year: bool,
}

/// Year-by-year deduction plan of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationSchedule {
    pub years: Vec<ScheduleYear>,
    /// Price minus every scheduled deduction, floored at zero.
    pub book_value: Money,
    pub is_gwg: bool,
    /// 1 for GWG, otherwise the useful life.
    pub useful_life_years: i32,
}

impl DepreciationSchedule {
    /// Value not yet deducted at the end of `year`.
    pub fn remaining_after(&self, year: i32) -> Money {
        let deducted: Money = self.years.iter().filter(|y| y.year <= year).map(|y| y.deduction).sum();
        let total: Money = self.years.iter().map(|y| y.deduction).sum();
        (total + self.book_value - deducted).floor_zero()
    }
}

/// Builds the deduction plan for an asset.
///
/// `current_year` only marks the matching row.
pub fn schedule(price: Money, purchase_date: NaiveDate, gwg_limit: Money, current_year: i32) -> DepreciationSchedule {
    let purchase_year = purchase_date.year();
    let gwg = is_gwg(price, gwg_limit);

    let years: Vec<ScheduleYear> = if gwg {
        vec![ScheduleYear {
            year: purchase_year,
            deduction: price,
            months: 12 - purchase_month(purchase_date),
            is_current_year: purchase_year == current_year,
        }]
    } else {
        (purchase_year..=end_year(purchase_date))
            .map(|year| ScheduleYear {
                year,
                deduction: deductible_for_year(price, purchase_date, year, gwg_limit),
                months: months_in_year(purchase_date, year),
                is_current_year: year == current_year,
            })
            .collect()
    };

    let deducted: Money = years.iter().map(|y| y.deduction).sum();

    DepreciationSchedule {
        years,
        book_value: (price - deducted).floor_zero(),
        is_gwg: gwg,
        useful_life_years: if gwg { 1 } else { USEFUL_LIFE_YEARS },
    }
}

// =============================================================================
// Entry Helpers
// =============================================================================

/// An equipment entry with its year-dependent fields resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentView {
    pub entry: EquipmentEntry,
    pub deductible_amount: Money,
    pub status: String,
}

impl EquipmentEntry {
    /// Validates and builds an equipment entry.
    pub fn new(
        id: impl Into<String>,
        name: &str,
        category: &str,
        date: NaiveDate,
        price: Money,
    ) -> ValidationResult<Self> {
        validate_name("name", name)?;
        validate_amount("price", price)?;

        Ok(EquipmentEntry {
            id: id.into(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            date,
            price,
            receipt_file_name: None,
        })
    }

    pub fn deductible_for_year(&self, year: i32, gwg_limit: Money) -> Money {
        deductible_for_year(self.price, self.date, year, gwg_limit)
    }

    pub fn status(&self, gwg_limit: Money) -> String {
        status_label(self.price, self.date, gwg_limit)
    }

    pub fn schedule(&self, gwg_limit: Money, current_year: i32) -> DepreciationSchedule {
        schedule(self.price, self.date, gwg_limit, current_year)
    }

    /// Resolves the deductible amount for `year` and the status label.
    pub fn view(&self, year: i32, gwg_limit: Money) -> EquipmentView {
        EquipmentView {
            entry: self.clone(),
            deductible_amount: self.deductible_for_year(year, gwg_limit),
            status: self.status(gwg_limit),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
