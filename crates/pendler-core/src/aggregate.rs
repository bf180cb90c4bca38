//! # Monthly Aggregator
//!
//! Buckets one year's deductible amounts by calendar month and balances them
//! against the employer's monthly travel reimbursement (Spesen).
//!
//! ## Bucket Layout
//! ```text
//! ┌───────┬────────┬─────────┬───────────┬─────────┬────────┬─────────┐
//! │ month │ trips  │ mileage │ equipment │  gross  │ spesen │   net   │
//! ├───────┼────────┼─────────┼───────────┼─────────┼────────┼─────────┤
//! │   0   │ Σ per- │ Σ leg   │ GWG in    │ trips + │ AG     │ gross − │
//! │  ...  │ diems  │ allow-  │ purchase  │ equip-  │ Spesen │ spesen  │
//! │  11   │        │ ances   │ month, or │ ment    │        │         │
//! │       │        │         │ AfA share │         │        │         │
//! └───────┴────────┴─────────┴───────────┴─────────┴────────┴─────────┘
//! ```
//!
//! Mileage is reported in its own column and stays out of `gross`. Trips are
//! bucketed by their start date, legs by their own date.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::equipment::monthly_spread;
use crate::money::Money;
use crate::types::{EquipmentEntry, ExpenseEntry, MileageEntry, MonthlyEmployerExpense, TripEntry};

/// German month names, indexed by 0-based month.
pub const MONTH_NAMES: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Name of a 0-based month; out-of-range months yield `"?"`.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES.get(month as usize).copied().unwrap_or("?")
}

// =============================================================================
// Entry Set
// =============================================================================

/// Borrowed snapshot of every entry list.
///
/// Calculators take this instead of reaching into shared state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntrySet<'a> {
    pub trips: &'a [TripEntry],
    pub mileage: &'a [MileageEntry],
    pub equipment: &'a [EquipmentEntry],
    pub expenses: &'a [ExpenseEntry],
    pub monthly_expenses: &'a [MonthlyEmployerExpense],
}

/// Employer reimbursement per month of `year`.
///
/// Should the input hold two records for the same month, the later one wins,
/// matching the upsert rule.
pub fn employer_expenses_by_month(expenses: &[MonthlyEmployerExpense], year: i32) -> [Money; 12] {
    let mut months = [Money::zero(); 12];
    for expense in expenses.iter().filter(|e| e.year == year && e.month < 12) {
        months[expense.month as usize] = expense.amount;
    }
    months
}

// =============================================================================
// Buckets
// =============================================================================

/// Deductible amounts of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// 0 = January … 11 = December.
    pub month: u32,
    pub trips: Money,
    pub mileage: Money,
    pub equipment: Money,
    /// `trips + equipment`.
    pub gross: Money,
    /// Employer reimbursement for the month.
    pub spesen: Money,
    /// `gross − spesen`.
    pub net: Money,
}

impl MonthlyBucket {
    /// True if nothing at all was recorded for the month.
    pub fn is_empty(&self) -> bool {
        self.trips.is_zero() && self.mileage.is_zero() && self.equipment.is_zero() && self.spesen.is_zero()
    }

    /// Allowances minus reimbursement, mileage included.
    pub fn balance(&self) -> Money {
        self.trips + self.mileage - self.spesen
    }
}

/// Twelve monthly buckets of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBreakdown {
    pub year: i32,
    pub months: Vec<MonthlyBucket>,
}

impl MonthlyBreakdown {
    /// Buckets all entries of `year`.
    ///
    /// Equipment from earlier years still depreciating contributes its share
    /// for `year`.
    pub fn compute(year: i32, entries: EntrySet<'_>, gwg_limit: Money) -> Self {
        let mut months: Vec<MonthlyBucket> = (0..12)
            .map(|month| MonthlyBucket {
                month,
                ..MonthlyBucket::default()
            })
            .collect();

        for trip in entries.trips.iter().filter(|t| t.is_in_year(year)) {
            months[trip.date.month0() as usize].trips += trip.deductible;
        }

        for leg in entries.mileage.iter().filter(|m| m.is_in_year(year)) {
            months[leg.date.month0() as usize].mileage += leg.allowance;
        }

        for item in entries.equipment {
            let spread = monthly_spread(item.price, item.date, year, gwg_limit);
            for (bucket, share) in months.iter_mut().zip(spread) {
                bucket.equipment += share;
            }
        }

        let spesen = employer_expenses_by_month(entries.monthly_expenses, year);
        for (bucket, amount) in months.iter_mut().zip(spesen) {
            bucket.spesen = amount;
            bucket.gross = bucket.trips + bucket.equipment;
            bucket.net = bucket.gross - bucket.spesen;
        }

        debug!(year, "Monthly breakdown computed");
        MonthlyBreakdown { year, months }
    }

    /// All twelve months, zero-filled.
    pub fn full_year(&self) -> &[MonthlyBucket] {
        &self.months
    }

    /// Only months with any recorded activity.
    pub fn active_months(&self) -> Vec<&MonthlyBucket> {
        self.months.iter().filter(|m| !m.is_empty()).collect()
    }

    pub fn month(&self, month: u32) -> Option<&MonthlyBucket> {
        self.months.get(month as usize)
    }

    pub fn total_trips(&self) -> Money {
        self.months.iter().map(|m| m.trips).sum()
    }

    pub fn total_mileage(&self) -> Money {
        self.months.iter().map(|m| m.mileage).sum()
    }

    pub fn total_equipment(&self) -> Money {
        self.months.iter().map(|m| m.equipment).sum()
    }

    pub fn total_spesen(&self) -> Money {
        self.months.iter().map(|m| m.spesen).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal::TripInput;
    use crate::rates::TaxRates;
    use chrono::{NaiveDate, NaiveTime};

    const LIMIT: Money = Money::from_cents(95_200);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trip(id: &str, on: NaiveDate) -> TripEntry {
        let input = TripInput::new(
            on,
            None,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            Money::zero(),
        );
        TripEntry::from_input(id, &input, &TaxRates::default()).unwrap()
    }

    fn spesen(id: &str, year: i32, month: u32, cents: i64) -> MonthlyEmployerExpense {
        MonthlyEmployerExpense {
            id: id.to_string(),
            year,
            month,
            amount: Money::from_cents(cents),
            note: None,
        }
    }

    #[test]
    fn test_trips_bucketed_by_start_month() {
        let trips = vec![trip("a", date(2025, 1, 31)), trip("b", date(2025, 3, 2)), trip("c", date(2024, 3, 2))];
        let breakdown = MonthlyBreakdown::compute(
            2025,
            EntrySet {
                trips: &trips,
                ..EntrySet::default()
            },
            LIMIT,
        );

        assert_eq!(breakdown.months.len(), 12);
        assert_eq!(breakdown.months[0].trips.cents(), 1400);
        assert_eq!(breakdown.months[2].trips.cents(), 1400);
        assert_eq!(breakdown.total_trips().cents(), 2800);
        assert_eq!(breakdown.active_months().len(), 2);
    }

    #[test]
    fn test_gross_and_net() {
        let trips = vec![trip("a", date(2025, 4, 10))];
        let equipment = vec![EquipmentEntry::new("e", "Headset", "IT", date(2025, 4, 2), Money::from_cents(5_000)).unwrap()];
        let monthly = vec![spesen("s", 2025, 3, 2_000)];

        let breakdown = MonthlyBreakdown::compute(
            2025,
            EntrySet {
                trips: &trips,
                equipment: &equipment,
                monthly_expenses: &monthly,
                ..EntrySet::default()
            },
            LIMIT,
        );

        let april = breakdown.month(3).unwrap();
        assert_eq!(april.gross.cents(), 1400 + 5_000);
        assert_eq!(april.spesen.cents(), 2_000);
        assert_eq!(april.net.cents(), 1400 + 5_000 - 2_000);
        assert_eq!(april.balance().cents(), 1400 - 2_000);
    }

    #[test]
    fn test_equipment_from_prior_year_keeps_depreciating() {
        let equipment =
            vec![EquipmentEntry::new("e", "Laptop", "IT", date(2024, 3, 1), Money::from_cents(300_000)).unwrap()];
        let breakdown = MonthlyBreakdown::compute(
            2025,
            EntrySet {
                equipment: &equipment,
                ..EntrySet::default()
            },
            LIMIT,
        );

        assert_eq!(breakdown.total_equipment().cents(), 100_000);
        assert_eq!(breakdown.active_months().len(), 12);
    }

    #[test]
    fn test_duplicate_month_last_wins() {
        let monthly = vec![spesen("a", 2025, 3, 5_000), spesen("b", 2025, 3, 7_500), spesen("c", 2024, 3, 999)];
        let by_month = employer_expenses_by_month(&monthly, 2025);
        assert_eq!(by_month[3].cents(), 7_500);
        assert_eq!(by_month.iter().sum::<Money>().cents(), 7_500);
    }

    #[test]
    fn test_empty_year() {
        let breakdown = MonthlyBreakdown::compute(2030, EntrySet::default(), LIMIT);
        assert_eq!(breakdown.full_year().len(), 12);
        assert!(breakdown.active_months().is_empty());
        assert_eq!(breakdown.total_spesen(), Money::zero());
    }
}
