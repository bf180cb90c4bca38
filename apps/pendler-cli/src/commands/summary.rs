//! # Summary Command
//!
//! Dashboard view of one year: totals, balance against Spesen and the latest
//! entries.

use std::fmt::Write as _;

use pendler_core::aggregate::month_name;
use pendler_core::rollup::{Activity, BalanceSheet, YearlyRollup};
use pendler_core::{Ledger, Money};
use serde::Serialize;
use tracing::debug;

use super::{eur, to_json};
use crate::error::AppResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryReport {
    rollup: YearlyRollup,
    balance: BalanceSheet,
    recent: Vec<Activity>,
}

pub fn run(ledger: &Ledger, year: i32, recent: usize, json: bool) -> AppResult<String> {
    debug!(year, recent, "summary command");

    let breakdown = ledger.breakdown(year);
    let report = SummaryReport {
        rollup: YearlyRollup::from_breakdown(&breakdown, &ledger.expenses),
        balance: BalanceSheet::from_breakdown(&breakdown),
        recent: ledger.recent_activities(recent),
    };

    if json {
        return to_json(&report);
    }
    render(&report)
}

fn render(report: &SummaryReport) -> AppResult<String> {
    let r = &report.rollup;
    let mut out = String::new();

    writeln!(out, "Steuerjahr {}", r.year)?;
    writeln!(out, "  Verpflegungsmehraufwand {}", eur(r.total_trips))?;
    writeln!(out, "  Fahrtkosten             {}", eur(r.total_mileage))?;
    writeln!(out, "  Arbeitsmittel           {}", eur(r.total_equipment))?;
    writeln!(out, "  Erstattung AG           {}", eur(Money::zero() - r.total_employer_reimbursement))?;
    writeln!(out, "  Gesamt absetzbar        {}", eur(r.grand_total))?;
    if !r.total_expenses.is_zero() {
        writeln!(out, "  Ausgaben (privat)       {}", eur(r.total_expenses))?;
        writeln!(out, "  Netto                   {}", eur(r.net_total))?;
    }

    let b = &report.balance;
    if !b.months.is_empty() {
        writeln!(out)?;
        writeln!(out, "Bilanz (Pauschalen − Spesen)")?;
        for m in &b.months {
            writeln!(
                out,
                "  {:<10} {} {} {}",
                month_name(m.month),
                eur(m.income),
                eur(m.spesen),
                eur(m.balance)
            )?;
        }
        writeln!(out, "  {:<10} {} {} {}", "Summe", eur(b.income), eur(b.reimbursement), eur(b.balance))?;
    }

    if !report.recent.is_empty() {
        writeln!(out)?;
        writeln!(out, "Letzte Einträge")?;
        for a in &report.recent {
            writeln!(out, "  {}  {:<14} {} {}", a.date, a.kind.label(), eur(a.amount), a.title)?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use pendler_core::meal::TripInput;
    use pendler_core::Settings;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new(Settings {
            station_distance: 5.0,
            ..Settings::default()
        });
        ledger
            .add_trip(
                Some("t1".to_string()),
                &TripInput::new(
                    NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                    Some(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()),
                    NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    Money::from_cents(1000),
                ),
            )
            .unwrap();
        ledger.upsert_monthly_expense(2025, 4, Money::from_cents(500), None).unwrap();
        ledger
    }

    fn line<'a>(out: &'a str, label: &str) -> &'a str {
        out.lines().find(|l| l.trim_start().starts_with(label)).unwrap_or("")
    }

    #[test]
    fn test_text_summary() {
        let out = run(&ledger(), 2025, 5, false).unwrap();
        assert!(out.starts_with("Steuerjahr 2025\n"));
        assert!(line(&out, "Verpflegungsmehraufwand").ends_with(" 18.00 €"));
        assert!(line(&out, "Erstattung AG").ends_with(" -5.00 €"));
        assert!(line(&out, "Gesamt absetzbar").ends_with(" 16.00 €"));
        assert!(out.contains("Mai"));
        assert!(out.contains("Letzte Einträge"));
        assert!(!out.contains("Ausgaben"));
    }

    #[test]
    fn test_json_summary() {
        let out = run(&ledger(), 2025, 2, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["rollup"]["grandTotal"], 1600);
        assert_eq!(value["balance"]["income"], 2100);
        assert_eq!(value["recent"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_year() {
        let out = run(&Ledger::default(), 2030, 5, false).unwrap();
        assert!(line(&out, "Gesamt absetzbar").ends_with(" 0.00 €"));
        assert!(!out.contains("Bilanz"));
    }
}
