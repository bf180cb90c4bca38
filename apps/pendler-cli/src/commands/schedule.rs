//! # Schedule Command
//!
//! Depreciation plan of each equipment item: GWG items show their single
//! deduction, others the three-year spread with the current year marked.

use std::fmt::Write as _;

use pendler_core::equipment::{DepreciationSchedule, EquipmentView};
use pendler_core::{CoreError, Ledger};
use serde::Serialize;
use tracing::debug;

use super::{eur, to_json};
use crate::error::AppResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleReport {
    #[serde(flatten)]
    view: EquipmentView,
    schedule: DepreciationSchedule,
}

/// Prints the plans of all items, or of the item with `id`.
///
/// ## Errors
/// - `EntryNotFound` if `id` matches no equipment entry
pub fn run(ledger: &Ledger, year: i32, id: Option<&str>, json: bool) -> AppResult<String> {
    debug!(year, ?id, "schedule command");
    let gwg_limit = ledger.tax_rates().gwg_limit;

    let items: Vec<_> = match id {
        Some(id) => {
            let item = ledger
                .equipment
                .iter()
                .find(|e| e.id == id)
                .ok_or_else(|| CoreError::EntryNotFound {
                    entity: "Equipment".to_string(),
                    id: id.to_string(),
                })?;
            vec![item]
        }
        None => ledger.equipment.iter().collect(),
    };

    let reports: Vec<ScheduleReport> = items
        .into_iter()
        .map(|item| ScheduleReport {
            view: item.view(year, gwg_limit),
            schedule: item.schedule(gwg_limit, year),
        })
        .collect();

    if json {
        return to_json(&reports);
    }

    let mut out = String::new();
    for report in &reports {
        let entry = &report.view.entry;
        writeln!(out, "{} ({}, {})", entry.name, entry.date, entry.price)?;
        writeln!(out, "  Status: {}", report.view.status)?;
        for row in &report.schedule.years {
            let marker = if row.is_current_year { "◄" } else { "" };
            writeln!(
                out,
                "  {}  {:>2} Mon. {} {}",
                row.year,
                row.months,
                eur(row.deduction),
                marker
            )?;
        }
        writeln!(out, "  Restwert Ende {} {}", year, eur(report.schedule.remaining_after(year)))?;
        writeln!(out)?;
    }
    if reports.is_empty() {
        writeln!(out, "Keine Arbeitsmittel")?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ErrorCode};
    use chrono::NaiveDate;
    use pendler_core::{EquipmentEntry, Money};

    fn ledger() -> Ledger {
        let mut ledger = Ledger::default();
        for (id, name, price) in [("e1", "Laptop", 300_000), ("e2", "Maus", 3_000)] {
            ledger
                .add_equipment(
                    EquipmentEntry::new(
                        id,
                        name,
                        "IT",
                        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                        Money::from_cents(price),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_depreciation_plan() {
        let out = run(&ledger(), 2025, Some("e1"), false).unwrap();
        assert!(out.starts_with("Laptop (2024-03-01, 3000.00 €)\n"));
        assert!(out.contains("Status: Abschreibung 2024 (10 Mon.)"));
        assert!(out.contains("2024  10 Mon."));
        assert!(out.contains("833.33 €"));
        assert!(out.contains("166.67 €"));
        assert!(out.lines().any(|l| l.starts_with("  2025") && l.ends_with('◄')));
        assert!(out.contains("Restwert Ende 2025"));
        assert!(out.contains("1166.67 €"));
        assert!(!out.contains("Maus"));
    }

    #[test]
    fn test_all_items_json() {
        let json = run(&ledger(), 2024, None, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["deductibleAmount"], 83_333);
        assert_eq!(items[1]["schedule"]["isGwg"], true);
        assert_eq!(items[1]["status"], "GWG (Sofortabzug)");
    }

    #[test]
    fn test_unknown_id() {
        let err = run(&ledger(), 2025, Some("nope"), false).unwrap_err();
        assert!(matches!(err, AppError::Core(CoreError::EntryNotFound { .. })));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
