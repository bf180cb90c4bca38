//! # Yearly Rollup
//!
//! Dashboard totals for one year, the yearly balance sheet and the feed of
//! recent activity.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   total_trips ─────┐                                                    │
//! │   total_mileage ───┼──► − total_employer_reimbursement ──► grand_total  │
//! │   total_equipment ─┘                                          │         │
//! │                                                               ▼         │
//! │                              − total_expenses (personal) ──► net_total  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every total is the sum of the matching column of the
//! [`MonthlyBreakdown`], so the dashboard and the monthly view never
//! disagree.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::aggregate::{EntrySet, MonthlyBreakdown};
use crate::equipment::deductible_for_year;
use crate::money::Money;
use crate::types::ExpenseEntry;

/// Default length of the recent-activity feed.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

// =============================================================================
// Yearly Rollup
// =============================================================================

/// Yearly totals shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRollup {
    pub year: i32,
    pub total_trips: Money,
    pub total_mileage: Money,
    pub total_equipment: Money,
    pub total_employer_reimbursement: Money,
    /// `trips + mileage + equipment − reimbursement`.
    pub grand_total: Money,
    /// Personal spending, not deductible.
    pub total_expenses: Money,
    /// `grand_total − total_expenses`.
    pub net_total: Money,
}

impl YearlyRollup {
    /// Builds the rollup from a monthly breakdown plus personal expenses.
    pub fn from_breakdown(breakdown: &MonthlyBreakdown, expenses: &[ExpenseEntry]) -> Self {
        let total_trips = breakdown.total_trips();
        let total_mileage = breakdown.total_mileage();
        let total_equipment = breakdown.total_equipment();
        let total_employer_reimbursement = breakdown.total_spesen();
        let grand_total = total_trips + total_mileage + total_equipment - total_employer_reimbursement;

        let total_expenses: Money = expenses
            .iter()
            .filter(|e| e.is_in_year(breakdown.year))
            .map(|e| e.amount)
            .sum();

        YearlyRollup {
            year: breakdown.year,
            total_trips,
            total_mileage,
            total_equipment,
            total_employer_reimbursement,
            grand_total,
            total_expenses,
            net_total: grand_total - total_expenses,
        }
    }

    /// Computes the breakdown and the rollup in one go.
    pub fn compute(year: i32, entries: EntrySet<'_>, gwg_limit: Money) -> (MonthlyBreakdown, Self) {
        let breakdown = MonthlyBreakdown::compute(year, entries, gwg_limit);
        let rollup = YearlyRollup::from_breakdown(&breakdown, entries.expenses);

        debug!(
            year,
            grand_total = rollup.grand_total.cents(),
            net_total = rollup.net_total.cents(),
            "Yearly rollup computed"
        );

        (breakdown, rollup)
    }
}

// =============================================================================
// Balance Sheet
// =============================================================================

/// Allowances against reimbursement for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBalance {
    pub month: u32,
    pub income: Money,
    pub spesen: Money,
    pub balance: Money,
}

/// Yearly balance sheet (Bilanz): per-diems plus mileage against Spesen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub year: i32,
    /// `total_trips + total_mileage`.
    pub income: Money,
    pub reimbursement: Money,
    pub balance: Money,
    /// Months with income or reimbursement, newest first.
    pub months: Vec<MonthlyBalance>,
}

impl BalanceSheet {
    pub fn from_breakdown(breakdown: &MonthlyBreakdown) -> Self {
        let income = breakdown.total_trips() + breakdown.total_mileage();
        let reimbursement = breakdown.total_spesen();

        let months = breakdown
            .full_year()
            .iter()
            .rev()
            .map(|bucket| MonthlyBalance {
                month: bucket.month,
                income: bucket.trips + bucket.mileage,
                spesen: bucket.spesen,
                balance: bucket.balance(),
            })
            .filter(|m| !(m.income.is_zero() && m.spesen.is_zero()))
            .collect();

        BalanceSheet {
            year: breakdown.year,
            income,
            reimbursement,
            balance: income - reimbursement,
            months,
        }
    }
}

// =============================================================================
// Recent Activity
// =============================================================================

/// Kind of entry in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ActivityKind {
    Verpflegung,
    Fahrt,
    Arbeitsmittel,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Verpflegung => "Verpflegung",
            ActivityKind::Fahrt => "Fahrt",
            ActivityKind::Arbeitsmittel => "Arbeitsmittel",
        }
    }
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub kind: ActivityKind,
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub title: String,
    pub amount: Money,
}

/// Latest entries across trips, legs and equipment, newest first.
///
/// Covers all years. Equipment shows its purchase-year deduction. Entries on
/// the same date keep the order trips, legs, equipment.
pub fn recent_activities(entries: EntrySet<'_>, gwg_limit: Money, limit: usize) -> Vec<Activity> {
    let trips = entries.trips.iter().map(|t| Activity {
        kind: ActivityKind::Verpflegung,
        id: t.id.clone(),
        date: t.date,
        title: if t.is_multi_day() {
            format!("{} bis {}", t.date, t.end_date)
        } else {
            t.date.to_string()
        },
        amount: t.deductible,
    });

    let legs = entries.mileage.iter().map(|m| Activity {
        kind: ActivityKind::Fahrt,
        id: m.id.clone(),
        date: m.date,
        title: if m.purpose.is_empty() {
            format!("{} → {}", m.start_location, m.end_location)
        } else {
            m.purpose.clone()
        },
        amount: m.allowance,
    });

    let equipment = entries.equipment.iter().map(|e| Activity {
        kind: ActivityKind::Arbeitsmittel,
        id: e.id.clone(),
        date: e.date,
        title: e.name.clone(),
        amount: deductible_for_year(e.price, e.date, e.date.year(), gwg_limit),
    });

    let mut feed: Vec<Activity> = trips.chain(legs).chain(equipment).collect();
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed.truncate(limit);
    feed
}

// =============================================================================
// Unit Tests
// =============================================================================
