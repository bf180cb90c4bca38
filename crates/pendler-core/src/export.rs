//! # CSV Export
//!
//! Flat, sectioned CSV text of one year for the tax return.
//!
//! ## Layout
//! ```text
//! ZUSAMMENFASSUNG (2025)
//! Verpflegungsmehraufwand,<total>
//! Fahrtkosten,<total>
//! Arbeitsmittel,<total>
//! Erstattung AG,-<reimbursement>
//! GESAMT,<grand total>
//!
//! VERPFLEGUNG
//! Datum,Start,Ende,Dauer,Pauschale,Erstattung AG,Absetzbar
//! ...
//!
//! FAHRTKOSTEN
//! Datum,Strecke (einfach),Gesamtstrecke,Pauschale
//! ...
//!
//! ARBEITSMITTEL
//! Datum,Gegenstand,Preis,Status,Absetzbar
//! ...
//! ```
//!
//! Each section is written by its own `csv::Writer` (the sections have
//! different widths) and the sections are joined by a blank line. Text
//! fields with commas, quotes or line breaks are quoted by the writer.

use chrono::Datelike;
use csv::Writer;
use tracing::debug;

use crate::aggregate::EntrySet;
use crate::equipment::{deductible_for_year, status_label};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::rollup::YearlyRollup;

pub const SECTION_SUMMARY: &str = "ZUSAMMENFASSUNG";
pub const SECTION_TRIPS: &str = "VERPFLEGUNG";
pub const SECTION_MILEAGE: &str = "FAHRTKOSTEN";
pub const SECTION_EQUIPMENT: &str = "ARBEITSMITTEL";

/// Formats kilometres with at most two decimals and no trailing zeros.
fn format_km(km: f64) -> String {
    let fixed = format!("{:.2}", km);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn money(m: Money) -> String {
    m.to_decimal_string()
}

fn finish(writer: Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

fn section_writer() -> Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

/// Builds the CSV text for `year`.
///
/// Trips and legs are filtered by their date. Equipment lists every item
/// bought in `year` or still depreciating in it, with that year's deduction.
///
/// ## Example
/// ```rust
/// use pendler_core::aggregate::EntrySet;
/// use pendler_core::export::export_csv;
/// use pendler_core::rollup::YearlyRollup;
/// use pendler_core::Money;
///
/// let gwg_limit = Money::from_cents(95_200);
/// let (_, rollup) = YearlyRollup::compute(2025, EntrySet::default(), gwg_limit);
/// let csv = export_csv(2025, &rollup, EntrySet::default(), gwg_limit).unwrap();
/// assert!(csv.starts_with("ZUSAMMENFASSUNG (2025)\n"));
/// assert!(csv.contains("GESAMT,0.00\n"));
/// ```
pub fn export_csv(year: i32, rollup: &YearlyRollup, entries: EntrySet<'_>, gwg_limit: Money) -> CoreResult<String> {
    let mut sections = Vec::with_capacity(4);

    // Summary
    let mut w = section_writer();
    w.write_record([format!("{} ({})", SECTION_SUMMARY, year)])?;
    w.write_record(["Verpflegungsmehraufwand".to_string(), money(rollup.total_trips)])?;
    w.write_record(["Fahrtkosten".to_string(), money(rollup.total_mileage)])?;
    w.write_record(["Arbeitsmittel".to_string(), money(rollup.total_equipment)])?;
    w.write_record([
        "Erstattung AG".to_string(),
        format!("-{}", money(rollup.total_employer_reimbursement)),
    ])?;
    w.write_record(["GESAMT".to_string(), money(rollup.grand_total)])?;
    sections.push(finish(w)?);

    // Trips
    let mut w = section_writer();
    w.write_record([SECTION_TRIPS])?;
    w.write_record(["Datum", "Start", "Ende", "Dauer", "Pauschale", "Erstattung AG", "Absetzbar"])?;
    for trip in entries.trips.iter().filter(|t| t.is_in_year(year)) {
        w.write_record([
            trip.date.to_string(),
            trip.start_time.format("%H:%M").to_string(),
            trip.end_time.format("%H:%M").to_string(),
            format!("{:.1}", trip.duration),
            money(trip.rate),
            money(trip.employer_expenses),
            money(trip.deductible),
        ])?;
    }
    sections.push(finish(w)?);

    // Mileage
    let mut w = section_writer();
    w.write_record([SECTION_MILEAGE])?;
    w.write_record(["Datum", "Strecke (einfach)", "Gesamtstrecke", "Pauschale"])?;
    for leg in entries.mileage.iter().filter(|m| m.is_in_year(year)) {
        w.write_record([
            leg.date.to_string(),
            format_km(leg.distance),
            format_km(leg.total_km),
            money(leg.allowance),
        ])?;
    }
    sections.push(finish(w)?);

    // Equipment
    let mut w = section_writer();
    w.write_record([SECTION_EQUIPMENT])?;
    w.write_record(["Datum", "Gegenstand", "Preis", "Status", "Absetzbar"])?;
    for item in entries.equipment {
        let deduction = deductible_for_year(item.price, item.date, year, gwg_limit);
        if item.date.year() != year && deduction.is_zero() {
            continue;
        }
        w.write_record([
            item.date.to_string(),
            item.name.clone(),
            money(item.price),
            status_label(item.price, item.date, gwg_limit),
            money(deduction),
        ])?;
    }
    sections.push(finish(w)?);

    let csv = sections.join("\n");
    debug!(year, bytes = csv.len(), "CSV export built");
    Ok(csv)
}

// =============================================================================
// Unit Tests
// =============================================================================
