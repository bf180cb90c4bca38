//! End-to-end bookkeeping scenarios through the public `Ledger` API.

use chrono::{NaiveDate, NaiveTime};
use pendler_core::equipment::{deductible_for_year, monthly_spread, months_in_year};
use pendler_core::meal::TripInput;
use pendler_core::mileage::station_legs_for_trip;
use pendler_core::{CoreError, EquipmentEntry, Ledger, Money, Settings, ValidationError};

const GWG_LIMIT: Money = Money::from_cents(95_200);

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn ledger_with_station(km: f64) -> Ledger {
    Ledger::new(Settings {
        station_distance: km,
        ..Settings::default()
    })
}

#[test]
fn test_gwg_is_deducted_in_purchase_year_only() {
    let mut ledger = Ledger::default();
    ledger
        .add_equipment(EquipmentEntry::new("", "Monitor", "IT", date(2024, 6, 15), Money::from_cents(50_000)).unwrap())
        .unwrap();

    assert_eq!(ledger.rollup(2024).total_equipment.cents(), 50_000);
    assert_eq!(ledger.rollup(2025).total_equipment.cents(), 0);

    let june = ledger.breakdown(2024).months[5];
    assert_eq!(june.equipment.cents(), 50_000);
    assert_eq!(ledger.breakdown(2024).active_months().len(), 1);
}

#[test]
fn test_depreciation_over_three_years() {
    let mut ledger = Ledger::default();
    let laptop = ledger
        .add_equipment(EquipmentEntry::new("", "Laptop", "IT", date(2024, 3, 1), Money::from_cents(300_000)).unwrap())
        .unwrap();
    assert!(!laptop.id.is_empty());

    let per_year: Vec<i64> = (2024..=2028).map(|y| ledger.rollup(y).total_equipment.cents()).collect();
    assert_eq!(per_year, vec![83_333, 100_000, 100_000, 16_667, 0]);
    assert_eq!(per_year.iter().sum::<i64>(), 300_000);

    let months: u32 = (2024..=2027).map(|y| months_in_year(laptop.date, y)).sum();
    assert_eq!(months, 36);
}

#[test]
fn test_rollup_equipment_equals_sum_of_monthly_buckets() {
    for (price, purchase) in [
        (300_000, date(2024, 3, 1)),
        (100_001, date(2024, 1, 31)),
        (99_999, date(2023, 12, 5)),
        (95_200, date(2025, 7, 9)),
    ] {
        let price = Money::from_cents(price);
        for year in 2023..=2027 {
            let spread: Money = monthly_spread(price, purchase, year, GWG_LIMIT).iter().copied().sum();
            assert_eq!(spread, deductible_for_year(price, purchase, year, GWG_LIMIT), "{} {}", purchase, year);
        }
    }
}

#[test]
fn test_same_day_trip() {
    let mut ledger = Ledger::default();
    let trip = ledger
        .add_trip(
            None,
            &TripInput::new(date(2025, 2, 3), None, time(8, 0), time(18, 0), Money::zero()),
        )
        .unwrap();

    assert_eq!(trip.duration, 10.0);
    assert_eq!(trip.rate.cents(), 1400);
    assert_eq!(trip.deductible.cents(), 1400);
    assert!(!trip.wrapped);
    // No station distance, no commute distance
    assert!(ledger.mileage.is_empty());
}

#[test]
fn test_multi_day_trip_with_reimbursement_and_station_legs() {
    let mut ledger = ledger_with_station(5.0);
    let trip = ledger
        .add_trip(
            Some("trip-1".to_string()),
            &TripInput::new(
                date(2025, 5, 1),
                Some(date(2025, 5, 2)),
                time(8, 0),
                time(9, 0),
                Money::from_cents(1000),
            ),
        )
        .unwrap();

    assert_eq!(trip.duration, 25.0);
    assert_eq!(trip.rate.cents(), 2800);
    assert_eq!(trip.deductible.cents(), 1800);

    assert_eq!(ledger.mileage.len(), 2);
    let legs = station_legs_for_trip(&trip, &ledger.mileage);
    assert_eq!(legs.to_amount().cents(), 150);
    assert_eq!(legs.from_amount().cents(), 150);
    assert_eq!(legs.trip_total(&trip).cents(), 2100);

    let rollup = ledger.rollup(2025);
    assert_eq!(rollup.total_trips.cents(), 1800);
    assert_eq!(rollup.total_mileage.cents(), 300);
    assert_eq!(rollup.grand_total.cents(), 2100);

    // Deleting the trip takes its legs along
    let (_, removed) = ledger.delete_trip("trip-1").unwrap();
    assert_eq!(removed.len(), 2);
    assert!(ledger.mileage.is_empty());
    assert_eq!(ledger.rollup(2025).grand_total, Money::zero());
}

#[test]
fn test_monthly_expense_upsert_and_quick_add() {
    let mut ledger = Ledger::default();
    ledger.upsert_monthly_expense(2025, 3, Money::from_cents(5_000), None).unwrap();
    ledger
        .upsert_monthly_expense(2025, 3, Money::from_cents(7_500), Some("korrigiert"))
        .unwrap();

    assert_eq!(ledger.monthly_expenses.len(), 1);
    assert_eq!(ledger.monthly_expenses[0].amount.cents(), 7_500);
    assert_eq!(ledger.rollup(2025).total_employer_reimbursement.cents(), 7_500);

    let err = ledger
        .quick_add_monthly_expense(2025, 3, Money::from_cents(100), None)
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
    assert_eq!(ledger.monthly_expenses[0].amount.cents(), 7_500);
}

#[test]
fn test_recompute_is_idempotent() {
    let mut ledger = ledger_with_station(12.5);
    ledger
        .add_trip(
            None,
            &TripInput::new(date(2025, 9, 1), None, time(22, 0), time(7, 30), Money::from_cents(300)),
        )
        .unwrap();
    ledger
        .add_trip(
            None,
            &TripInput::new(date(2025, 9, 8), Some(date(2025, 9, 10)), time(6, 0), time(20, 0), Money::zero()),
        )
        .unwrap();

    let before = ledger.clone();
    ledger.recompute_trips();
    ledger.recompute_trips();
    assert_eq!(ledger, before);
}

#[test]
fn test_backup_round_trip_through_json() {
    let mut ledger = ledger_with_station(5.0);
    ledger
        .add_trip(
            None,
            &TripInput::new(date(2025, 5, 1), None, time(7, 0), time(19, 0), Money::zero()),
        )
        .unwrap();
    ledger
        .add_equipment(EquipmentEntry::new("", "Stuhl", "Büro", date(2025, 1, 10), Money::from_cents(40_000)).unwrap())
        .unwrap();
    ledger.upsert_monthly_expense(2025, 4, Money::from_cents(2_000), None).unwrap();

    let json = serde_json::to_string(&ledger.backup()).unwrap();
    let mut restored = Ledger::default();
    restored.import(serde_json::from_str(&json).unwrap()).unwrap();

    assert_eq!(restored.rollup(2025), ledger.rollup(2025));
    assert_eq!(restored.settings.station_distance, 5.0);
}

#[test]
fn test_export_matches_rollup() {
    let mut ledger = ledger_with_station(5.0);
    ledger
        .add_trip(
            None,
            &TripInput::new(date(2025, 5, 1), Some(date(2025, 5, 2)), time(8, 0), time(9, 0), Money::from_cents(1000)),
        )
        .unwrap();

    let csv = ledger.export_csv(2025).unwrap();
    assert!(csv.contains("Verpflegungsmehraufwand,18.00\n"));
    assert!(csv.contains("Fahrtkosten,3.00\n"));
    assert!(csv.contains("GESAMT,21.00\n"));
}
