//! # Backup Reader
//!
//! Reads a JSON backup into a [`Ledger`].
//!
//! Two layouts are accepted:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Native (Ledger::backup)          App export                            │
//! │  ───────────────────────          ──────────                            │
//! │  money as integer cents           money as euro numbers or strings      │
//! │  ids are strings                  ids are numbers (timestamps)          │
//! │  tripEntries                      mealEntries                           │
//! │  relatedTripId                    relatedMealId                         │
//! │                                                                         │
//! │  "format": "pendler" marks the native layout; anything else is read    │
//! │  as an app export.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! App exports store derived trip values (duration, rate, deductible); those
//! are discarded and recomputed against the imported tax rates. Mileage
//! allowances are kept as stored. A trip whose end date equals its start date
//! is read as a single-day trip so a legacy overnight entry (end time before
//! start time) keeps its 24-hour wrap.

use std::path::Path;

use chrono::NaiveDate;
use pendler_core::meal::TripInput;
use pendler_core::validation::{parse_date, parse_time};
use pendler_core::{
    Backup, CommutePreset, CommuteSettings, EmployerRefundSettings, EquipmentEntry, ExpenseEntry, Ledger,
    MileageEntry, Money, MonthlyEmployerExpense, PublicTransportPreset, Settings, TaxRates, TripEntry,
    VehicleType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Marker written into native backups.
pub const NATIVE_FORMAT: &str = "pendler";

// =============================================================================
// Lenient Scalars
// =============================================================================

/// A number the app may have stored as a JSON number or a form string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

impl Lenient {
    fn to_f64(&self, field: &str) -> AppResult<f64> {
        match self {
            Lenient::Number(n) => Ok(*n),
            Lenient::Text(s) if s.trim().is_empty() => Ok(0.0),
            Lenient::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| AppError::Backup(format!("{} is not a number: '{}'", field, s))),
        }
    }

    fn to_money(&self, field: &str) -> AppResult<Money> {
        Ok(Money::from_euros(self.to_f64(field)?))
    }
}

fn money(value: &Option<Lenient>, field: &str) -> AppResult<Money> {
    value.as_ref().map_or(Ok(Money::zero()), |v| v.to_money(field))
}

fn number(value: &Option<Lenient>, field: &str) -> AppResult<f64> {
    value.as_ref().map_or(Ok(0.0), |v| v.to_f64(field))
}

/// Ids are timestamps (numbers) in app exports.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    // Older exports may carry a full ISO timestamp
    let day = raw.get(..10).unwrap_or(raw);
    Ok(parse_date(field, day)?)
}

// =============================================================================
// App Export Layout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppTrip {
    #[serde(default)]
    id: Value,
    date: String,
    #[serde(default)]
    end_date: Option<String>,
    start_time: String,
    end_time: String,
    #[serde(default)]
    employer_expenses: Option<Lenient>,
    #[serde(default)]
    receipt_file_name: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppMileage {
    #[serde(default)]
    id: Value,
    date: String,
    #[serde(default)]
    start_location: String,
    #[serde(default)]
    end_location: String,
    #[serde(default)]
    distance: Option<Lenient>,
    #[serde(default)]
    total_km: Option<Lenient>,
    #[serde(default)]
    allowance: Option<Lenient>,
    #[serde(default)]
    purpose: String,
    #[serde(default)]
    vehicle_type: Option<VehicleType>,
    #[serde(default, alias = "relatedMealId")]
    related_trip_id: Value,
    #[serde(default)]
    receipt_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppEquipment {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    date: String,
    #[serde(default)]
    price: Option<Lenient>,
    #[serde(default)]
    receipt_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppExpense {
    #[serde(default)]
    id: Value,
    date: String,
    #[serde(default)]
    amount: Option<Lenient>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    receipt_file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppMonthlyExpense {
    #[serde(default)]
    id: Value,
    year: i32,
    month: u32,
    #[serde(default)]
    amount: Option<Lenient>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppPreset {
    active: bool,
    distance: Option<Lenient>,
    cost: Option<Lenient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppCommute {
    car: Option<AppPreset>,
    motorcycle: Option<AppPreset>,
    bike: Option<AppPreset>,
    public_transport: Option<AppPreset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AppTaxRates {
    meal_rate_8h: Option<Lenient>,
    meal_rate_24h: Option<Lenient>,
    mileage_rate: Option<Lenient>,
    mileage_rate_car: Option<Lenient>,
    mileage_rate_motorcycle: Option<Lenient>,
    mileage_rate_bike: Option<Lenient>,
    gwg_limit: Option<Lenient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRefund {
    threshold_hours: Lenient,
    amount: Lenient,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AppBackup {
    #[serde(alias = "tripEntries")]
    meal_entries: Option<Vec<AppTrip>>,
    mileage_entries: Option<Vec<AppMileage>>,
    equipment_entries: Option<Vec<AppEquipment>>,
    expense_entries: Option<Vec<AppExpense>>,
    monthly_employer_expenses: Option<Vec<AppMonthlyExpense>>,
    default_commute: Option<AppCommute>,
    tax_rates: Option<AppTaxRates>,
    station_distance: Option<Lenient>,
    employer_refund_settings: Option<AppRefund>,
}

impl AppTaxRates {
    /// Missing rates fall back to `base`.
    fn to_tax_rates(&self, base: &TaxRates) -> AppResult<TaxRates> {
        let rate = |value: &Option<Lenient>, field: &str, fallback: Money| -> AppResult<Money> {
            value.as_ref().map_or(Ok(fallback), |v| v.to_money(field))
        };

        Ok(TaxRates {
            meal_rate_8h: rate(&self.meal_rate_8h, "mealRate8h", base.meal_rate_8h)?,
            meal_rate_24h: rate(&self.meal_rate_24h, "mealRate24h", base.meal_rate_24h)?,
            mileage_rate: rate(&self.mileage_rate, "mileageRate", base.mileage_rate)?,
            mileage_rate_car: rate(&self.mileage_rate_car, "mileageRateCar", base.mileage_rate_car)?,
            mileage_rate_motorcycle: rate(
                &self.mileage_rate_motorcycle,
                "mileageRateMotorcycle",
                base.mileage_rate_motorcycle,
            )?,
            mileage_rate_bike: rate(&self.mileage_rate_bike, "mileageRateBike", base.mileage_rate_bike)?,
            gwg_limit: rate(&self.gwg_limit, "gwgLimit", base.gwg_limit)?,
        })
    }
}

impl AppCommute {
    fn to_commute_settings(&self) -> AppResult<CommuteSettings> {
        let preset = |p: &Option<AppPreset>, field: &str| -> AppResult<CommutePreset> {
            Ok(match p {
                Some(p) => CommutePreset {
                    active: p.active,
                    distance: number(&p.distance, field)?,
                },
                None => CommutePreset::default(),
            })
        };

        let defaults = CommuteSettings::default();
        Ok(CommuteSettings {
            car: match &self.car {
                Some(_) => preset(&self.car, "defaultCommute.car.distance")?,
                None => defaults.car,
            },
            motorcycle: preset(&self.motorcycle, "defaultCommute.motorcycle.distance")?,
            bike: preset(&self.bike, "defaultCommute.bike.distance")?,
            public_transport: match &self.public_transport {
                Some(p) => PublicTransportPreset {
                    active: p.active,
                    cost: money(&p.cost, "defaultCommute.public_transport.cost")?,
                },
                None => PublicTransportPreset::default(),
            },
        })
    }
}

impl AppBackup {
    /// Converts the app layout into a core backup.
    ///
    /// Trips are recomputed against the backup's own rates, falling back to
    /// `settings` for anything the backup does not carry.
    fn into_backup(self, settings: &Settings) -> AppResult<Backup> {
        let tax_rates = match &self.tax_rates {
            Some(rates) => Some(rates.to_tax_rates(&settings.tax_rates)?),
            None => None,
        };
        let rates = tax_rates.unwrap_or(settings.tax_rates);

        let trip_entries = match self.meal_entries {
            Some(trips) => Some(
                trips
                    .into_iter()
                    .map(|t| convert_trip(t, &rates))
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            None => None,
        };

        let mileage_entries = match self.mileage_entries {
            Some(legs) => Some(legs.into_iter().map(convert_mileage).collect::<AppResult<Vec<_>>>()?),
            None => None,
        };

        let equipment_entries = match self.equipment_entries {
            Some(items) => Some(
                items
                    .into_iter()
                    .map(|e| {
                        Ok(EquipmentEntry {
                            id: id_string(&e.id),
                            name: e.name,
                            category: e.category,
                            date: date("equipment.date", &e.date)?,
                            price: money(&e.price, "equipment.price")?,
                            receipt_file_name: optional_text(e.receipt_file_name),
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            None => None,
        };

        let expense_entries = match self.expense_entries {
            Some(items) => Some(
                items
                    .into_iter()
                    .map(|e| {
                        Ok(ExpenseEntry {
                            id: id_string(&e.id),
                            date: date("expense.date", &e.date)?,
                            amount: money(&e.amount, "expense.amount")?,
                            description: e.description,
                            category: e.category,
                            receipt_file_name: optional_text(e.receipt_file_name),
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            None => None,
        };

        let monthly_employer_expenses = match self.monthly_employer_expenses {
            Some(items) => Some(
                items
                    .into_iter()
                    .map(|e| {
                        Ok(MonthlyEmployerExpense {
                            id: id_string(&e.id),
                            year: e.year,
                            month: e.month,
                            amount: money(&e.amount, "monthlyEmployerExpense.amount")?,
                            note: optional_text(e.note),
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            None => None,
        };

        let default_commute = match &self.default_commute {
            Some(commute) => Some(commute.to_commute_settings()?),
            None => None,
        };

        let station_distance = match &self.station_distance {
            Some(km) => Some(km.to_f64("stationDistance")?),
            None => None,
        };

        let employer_refund_settings = match &self.employer_refund_settings {
            Some(refund) => Some(EmployerRefundSettings {
                threshold_hours: refund.threshold_hours.to_f64("employerRefundSettings.thresholdHours")?,
                amount: refund.amount.to_money("employerRefundSettings.amount")?,
            }),
            None => None,
        };

        Ok(Backup {
            trip_entries,
            mileage_entries,
            equipment_entries,
            expense_entries,
            monthly_employer_expenses,
            default_commute,
            tax_rates,
            station_distance,
            employer_refund_settings,
        })
    }
}

fn convert_trip(trip: AppTrip, rates: &TaxRates) -> AppResult<TripEntry> {
    let start = date("trip.date", &trip.date)?;
    let end_date = match optional_text(trip.end_date) {
        Some(raw) => Some(date("trip.endDate", &raw)?).filter(|end| *end != start),
        None => None,
    };

    let input = TripInput {
        date: start,
        end_date,
        start_time: parse_time("trip.startTime", &trip.start_time)?,
        end_time: parse_time("trip.endTime", &trip.end_time)?,
        employer_expenses: money(&trip.employer_expenses, "trip.employerExpenses")?,
        receipt_file_name: optional_text(trip.receipt_file_name),
        note: optional_text(trip.note),
    };

    Ok(TripEntry::from_input(id_string(&trip.id), &input, rates)?)
}

fn convert_mileage(leg: AppMileage) -> AppResult<MileageEntry> {
    let distance = number(&leg.distance, "mileage.distance")?;
    let total_km = match &leg.total_km {
        Some(km) => km.to_f64("mileage.totalKm")?,
        None => distance,
    };
    let related = id_string(&leg.related_trip_id);

    Ok(MileageEntry {
        id: id_string(&leg.id),
        date: date("mileage.date", &leg.date)?,
        start_location: leg.start_location,
        end_location: leg.end_location,
        distance,
        total_km,
        allowance: money(&leg.allowance, "mileage.allowance")?,
        purpose: leg.purpose,
        vehicle_type: leg.vehicle_type.unwrap_or_default(),
        related_trip_id: Some(related).filter(|r| !r.is_empty()),
        receipt_file_name: optional_text(leg.receipt_file_name),
    })
}

// =============================================================================
// Native Layout
// =============================================================================

/// Native backup with its format marker.
#[derive(Debug, Serialize, Deserialize)]
struct NativeBackup {
    format: String,
    #[serde(flatten)]
    backup: Backup,
}

fn is_native(value: &Value) -> bool {
    value.get("format").and_then(Value::as_str) == Some(NATIVE_FORMAT)
}

// =============================================================================
// Public API
// =============================================================================

/// Parses backup JSON in either layout.
pub fn parse_backup(json: &str, settings: &Settings) -> AppResult<Backup> {
    let value: Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(AppError::Backup("top level must be a JSON object".into()));
    }

    if is_native(&value) {
        debug!("Reading native backup");
        let native: NativeBackup = serde_json::from_value(value)?;
        return Ok(native.backup);
    }

    debug!("Reading app export");
    let app: AppBackup = serde_json::from_value(value)?;
    app.into_backup(settings)
}

/// Builds a ledger from `settings` and the sections found in the backup.
pub fn ledger_from_json(json: &str, settings: Settings) -> AppResult<Ledger> {
    let backup = parse_backup(json, &settings)?;
    let mut ledger = Ledger::new(settings);
    ledger.import(backup)?;

    if ledger.trips.iter().any(|t| t.wrapped) {
        warn!("Backup contains overnight trips without an end date; 24h wrap applied");
    }

    info!(
        trips = ledger.trips.len(),
        mileage = ledger.mileage.len(),
        equipment = ledger.equipment.len(),
        "Ledger loaded"
    );
    Ok(ledger)
}

/// Reads a backup file into a ledger.
pub fn load_ledger(path: &Path, settings: Settings) -> AppResult<Ledger> {
    let json = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    ledger_from_json(&json, settings)
}

/// Native backup JSON of a ledger.
pub fn to_native_json(ledger: &Ledger) -> AppResult<String> {
    let native = NativeBackup {
        format: NATIVE_FORMAT.to_string(),
        backup: ledger.backup(),
    };
    Ok(serde_json::to_string_pretty(&native)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_EXPORT: &str = r#"{
        "mealEntries": [
            {
                "id": 1714550400000,
                "date": "2025-05-01",
                "endDate": "2025-05-02",
                "startTime": "08:00",
                "endTime": "09:00",
                "employerExpenses": "10",
                "duration": 25,
                "rate": 28,
                "deductible": 18
            },
            {
                "id": 1714550400001,
                "date": "2025-06-03",
                "endDate": "2025-06-03",
                "startTime": "22:00",
                "endTime": "06:30",
                "employerExpenses": 0
            }
        ],
        "mileageEntries": [
            {
                "id": 1714550400000.42,
                "date": "2025-05-01",
                "startLocation": "Zuhause",
                "endLocation": "Bahnhof",
                "distance": 5,
                "totalKm": 5,
                "allowance": 1.5,
                "purpose": "Fahrt zum Bahnhof (Dienstreise Beginn)",
                "relatedMealId": 1714550400000
            }
        ],
        "equipmentEntries": [
            { "id": 7, "name": "Laptop", "category": "IT", "date": "2024-03-01", "price": "3000", "receiptFileName": "" }
        ],
        "monthlyEmployerExpenses": [
            { "id": 9, "year": 2025, "month": 4, "amount": 5 }
        ],
        "defaultCommute": {
            "car": { "active": true, "distance": 0 },
            "public_transport": { "active": false, "cost": "" }
        },
        "taxRates": { "mealRate8h": 14.0, "mealRate24h": 28.0, "mileageRate": 0.3, "gwgLimit": 952.0 },
        "stationDistance": 5,
        "selectedYear": 2025
    }"#;

    #[test]
    fn test_app_export_converted() {
        let ledger = ledger_from_json(APP_EXPORT, Settings::default()).unwrap();

        assert_eq!(ledger.trips.len(), 2);
        let trip = &ledger.trips[0];
        assert_eq!(trip.id, "1714550400000");
        assert_eq!(trip.duration, 25.0);
        assert_eq!(trip.employer_expenses.cents(), 1000);
        assert_eq!(trip.deductible.cents(), 1800);

        // Same start and end date: read as single-day, wrap preserved
        let overnight = &ledger.trips[1];
        assert!(overnight.wrapped);
        assert_eq!(overnight.duration, 8.5);
        assert_eq!(overnight.deductible.cents(), 1400);

        let leg = &ledger.mileage[0];
        assert_eq!(leg.allowance.cents(), 150);
        assert_eq!(leg.related_trip_id.as_deref(), Some("1714550400000"));
        assert_eq!(leg.vehicle_type, VehicleType::Car);

        assert_eq!(ledger.equipment[0].price.cents(), 300_000);
        assert_eq!(ledger.equipment[0].receipt_file_name, None);
        assert_eq!(ledger.monthly_expenses[0].amount.cents(), 500);
        assert_eq!(ledger.settings.station_distance, 5.0);
        assert!(!ledger.settings.default_commute.public_transport.active);
    }

    #[test]
    fn test_app_export_rollup() {
        let ledger = ledger_from_json(APP_EXPORT, Settings::default()).unwrap();
        let rollup = ledger.rollup(2025);

        assert_eq!(rollup.total_trips.cents(), 1800 + 1400);
        assert_eq!(rollup.total_mileage.cents(), 150);
        assert_eq!(rollup.total_equipment.cents(), 100_000);
        assert_eq!(rollup.total_employer_reimbursement.cents(), 500);
    }

    #[test]
    fn test_missing_rates_fall_back_to_settings() {
        let mut settings = Settings::default();
        settings.tax_rates.mileage_rate_bike = Money::from_cents(7);

        let backup = parse_backup(r#"{ "taxRates": { "mealRate8h": 15 } }"#, &settings).unwrap();
        let rates = backup.tax_rates.unwrap();
        assert_eq!(rates.meal_rate_8h.cents(), 1500);
        assert_eq!(rates.mileage_rate_bike.cents(), 7);
        assert!(backup.trip_entries.is_none());
    }

    #[test]
    fn test_native_round_trip() {
        let ledger = ledger_from_json(APP_EXPORT, Settings::default()).unwrap();
        let json = to_native_json(&ledger).unwrap();
        assert!(json.contains("\"format\": \"pendler\""));

        let restored = ledger_from_json(&json, Settings::default()).unwrap();
        assert_eq!(restored.rollup(2025), ledger.rollup(2025));
        assert_eq!(restored.trips, ledger.trips);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            parse_backup("[1, 2]", &Settings::default()),
            Err(AppError::Backup(_))
        ));
        assert!(matches!(
            parse_backup("{ not json", &Settings::default()),
            Err(AppError::Json(_))
        ));

        let bad_amount = r#"{ "equipmentEntries": [ { "id": 1, "date": "2025-01-01", "price": "zwölf" } ] }"#;
        assert!(matches!(
            parse_backup(bad_amount, &Settings::default()),
            Err(AppError::Backup(_))
        ));

        let bad_time = r#"{ "mealEntries": [ { "date": "2025-01-01", "startTime": "8 Uhr", "endTime": "18:00" } ] }"#;
        assert!(matches!(
            parse_backup(bad_time, &Settings::default()),
            Err(AppError::Core(_))
        ));
    }
}
