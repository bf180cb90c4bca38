//! # Months Command
//!
//! Monthly breakdown of one year as a table.

use std::fmt::Write as _;

use pendler_core::aggregate::{month_name, MonthlyBucket};
use pendler_core::Ledger;
use tracing::debug;

use super::{eur, to_json};
use crate::error::AppResult;

/// Prints the breakdown. Without `all`, empty months are skipped.
pub fn run(ledger: &Ledger, year: i32, all: bool, json: bool) -> AppResult<String> {
    debug!(year, all, "months command");
    let breakdown = ledger.breakdown(year);

    if json {
        return to_json(&breakdown);
    }

    let rows: Vec<&MonthlyBucket> = if all {
        breakdown.full_year().iter().collect()
    } else {
        breakdown.active_months()
    };

    let mut out = String::new();
    writeln!(
        out,
        "{:<10} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        year, "Verpflegung", "Fahrten", "Arbeitsm.", "Brutto", "Spesen", "Netto"
    )?;
    for m in &rows {
        writeln!(
            out,
            "{:<10} {} {} {} {} {} {}",
            month_name(m.month),
            eur(m.trips),
            eur(m.mileage),
            eur(m.equipment),
            eur(m.gross),
            eur(m.spesen),
            eur(m.net)
        )?;
    }
    if rows.is_empty() {
        writeln!(out, "Keine Einträge")?;
    }

    Ok(out)
}
