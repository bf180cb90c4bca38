//! # Domain Types
//!
//! Entry types recorded by the user and the settings that drive the
//! calculators.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   TripEntry     │   │  MileageEntry   │   │ EquipmentEntry  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│ related_trip_id │   │  id             │       │
//! │  │  date..end_date │   │  date           │   │  date (bought)  │       │
//! │  │  start/end time │   │  distance, km   │   │  price          │       │
//! │  │  duration, rate │   │  allowance      │   │  name, category │       │
//! │  │  deductible     │   │  vehicle_type   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌────────────────────────┐                       │
//! │  │  ExpenseEntry   │   │ MonthlyEmployerExpense │                       │
//! │  │  (personal,     │   │  (year, month) unique  │                       │
//! │  │  not deducted)  │   │  amount = Spesen       │                       │
//! │  └─────────────────┘   └────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are opaque strings assigned by the caller. The ledger generates a
//! UUID v4 only for entries submitted without one. Station legs derive their
//! ids from the trip id so recomputation stays deterministic.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::rates::TaxRates;

// =============================================================================
// Vehicle Type
// =============================================================================

/// How a mileage leg was travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Car,
    Motorcycle,
    Bike,
    /// Flat ticket cost instead of a per-km rate.
    PublicTransport,
}

impl VehicleType {
    /// German label used in exports and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Car => "Auto",
            VehicleType::Motorcycle => "Motorrad",
            VehicleType::Bike => "Fahrrad",
            VehicleType::PublicTransport => "Andere",
        }
    }

    /// Stable key, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Bike => "bike",
            VehicleType::PublicTransport => "public_transport",
        }
    }
}

// =============================================================================
// Trip Entry
// =============================================================================

/// A work-related absence, possibly spanning several days.
///
/// `duration`, `rate` and `deductible` are derived by [`crate::meal`] and are
/// recomputed on every edit; they are stored so the export and the dashboard
/// read the same numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TripEntry {
    pub id: String,

    /// Start date of the absence.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Last day of the absence; equals `date` for single-day trips.
    #[ts(as = "String")]
    pub end_date: NaiveDate,

    #[serde(with = "hhmm")]
    #[ts(as = "String")]
    pub start_time: NaiveTime,

    #[serde(with = "hhmm")]
    #[ts(as = "String")]
    pub end_time: NaiveTime,

    /// Meal reimbursement paid by the employer for this trip.
    pub employer_expenses: Money,

    /// Absence duration in hours (may exceed 24).
    pub duration: f64,

    /// Applicable per-diem tier: 0, the 8h rate or the 24h rate.
    pub rate: Money,

    /// `max(0, rate - employer_expenses)`.
    pub deductible: Money,

    /// End time lay before start time without an end date, so 24 hours were
    /// added.
    #[serde(default)]
    pub wrapped: bool,

    #[serde(default)]
    pub receipt_file_name: Option<String>,

    #[serde(default)]
    pub note: Option<String>,
}

impl TripEntry {
    /// Returns true if the trip starts in the given year.
    pub fn is_in_year(&self, year: i32) -> bool {
        self.date.year() == year
    }

    /// Returns true if the absence spans more than one calendar day.
    pub fn is_multi_day(&self) -> bool {
        self.end_date != self.date
    }
}

// =============================================================================
// Mileage Entry
// =============================================================================

/// One directional leg of a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MileageEntry {
    pub id: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub start_location: String,
    pub end_location: String,

    /// One-way distance in km.
    pub distance: f64,

    /// Kilometres the allowance was computed on.
    pub total_km: f64,

    pub allowance: Money,
    pub purpose: String,

    #[serde(default)]
    pub vehicle_type: VehicleType,

    /// Trip this leg was generated for. Lookup only, never owning.
    #[serde(default, alias = "relatedMealId")]
    pub related_trip_id: Option<String>,

    #[serde(default)]
    pub receipt_file_name: Option<String>,
}

impl MileageEntry {
    /// Returns true if the leg falls in the given year.
    pub fn is_in_year(&self, year: i32) -> bool {
        self.date.year() == year
    }

    /// Returns true if the purpose marks the outbound leg of a trip.
    pub fn is_begin_leg(&self) -> bool {
        self.purpose.contains(crate::STATION_BEGIN_TAG)
    }

    /// Returns true if the purpose marks the return leg of a trip.
    pub fn is_end_leg(&self) -> bool {
        self.purpose.contains(crate::STATION_END_TAG)
    }
}

// =============================================================================
// Equipment Entry
// =============================================================================

/// A work-equipment purchase.
///
/// The deductible amount depends on the queried year and is computed by
/// [`crate::equipment`], never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentEntry {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Purchase date.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Gross purchase price.
    pub price: Money,

    #[serde(default)]
    pub receipt_file_name: Option<String>,
}

// =============================================================================
// Expense Entry
// =============================================================================

/// Personal spending. Not deductible; only reduces the dashboard's net total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    pub id: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub amount: Money,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub receipt_file_name: Option<String>,
}

impl ExpenseEntry {
    pub fn is_in_year(&self, year: i32) -> bool {
        self.date.year() == year
    }
}

// =============================================================================
// Monthly Employer Expense
// =============================================================================

/// Travel reimbursement (Spesen) paid by the employer for one month.
///
/// At most one record exists per `(year, month)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEmployerExpense {
    pub id: String,
    pub year: i32,
    /// 0 = January … 11 = December.
    pub month: u32,
    pub amount: Money,

    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Settings
// =============================================================================

/// Commute preset for a distance-based vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CommutePreset {
    pub active: bool,
    /// One-way distance to the station in km.
    pub distance: f64,
}

/// Commute preset for public transport: a flat ticket cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct PublicTransportPreset {
    pub active: bool,
    pub cost: Money,
}

/// How the user normally gets to the station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CommuteSettings {
    pub car: CommutePreset,
    pub motorcycle: CommutePreset,
    pub bike: CommutePreset,
    pub public_transport: PublicTransportPreset,
}

impl Default for CommuteSettings {
    fn default() -> Self {
        CommuteSettings {
            car: CommutePreset {
                active: true,
                distance: 0.0,
            },
            motorcycle: CommutePreset::default(),
            bike: CommutePreset::default(),
            public_transport: PublicTransportPreset::default(),
        }
    }
}

impl CommuteSettings {
    /// Distance-based presets in display order.
    pub fn distance_presets(&self) -> [(VehicleType, CommutePreset); 3] {
        [
            (VehicleType::Car, self.car),
            (VehicleType::Motorcycle, self.motorcycle),
            (VehicleType::Bike, self.bike),
        ]
    }
}

/// Automatic employer meal refund for long absences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployerRefundSettings {
    /// Minimum absence in hours before the refund applies.
    pub threshold_hours: f64,
    pub amount: Money,
}

/// Everything the calculators need besides the entries themselves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub tax_rates: TaxRates,
    pub default_commute: CommuteSettings,
    /// One-way distance home → station in km. 0 disables station legs.
    pub station_distance: f64,
    pub employer_refund: Option<EmployerRefundSettings>,
}

// =============================================================================
// HH:MM Serialization
// =============================================================================

/// Serializes times as `"HH:MM"`, the format the entry forms produce.
/// Accepts `"HH:MM:SS"` on input.
pub(crate) mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    /// `HH:MM`, or `HH:MM:SS` when the seconds are set so durations survive
    /// a round trip.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let format = if time.second() == 0 { "%H:%M" } else { "%H:%M:%S" };
        serializer.serialize_str(&time.format(format).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::validation::parse_time("time", &raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_serialization() {
        let json = serde_json::to_string(&VehicleType::PublicTransport).unwrap();
        assert_eq!(json, "\"public_transport\"");

        let parsed: VehicleType = serde_json::from_str("\"motorcycle\"").unwrap();
        assert_eq!(parsed, VehicleType::Motorcycle);
        assert_eq!(VehicleType::default(), VehicleType::Car);
    }

    #[test]
    fn test_related_meal_id_alias() {
        let json = r#"{
            "id": "m1",
            "date": "2025-05-01",
            "startLocation": "Zuhause",
            "endLocation": "Bahnhof",
            "distance": 5.0,
            "totalKm": 5.0,
            "allowance": 150,
            "purpose": "Fahrt zum Bahnhof (Dienstreise Beginn)",
            "relatedMealId": "t1"
        }"#;
        let leg: MileageEntry = serde_json::from_str(json).unwrap();
        assert_eq!(leg.related_trip_id.as_deref(), Some("t1"));
        assert_eq!(leg.vehicle_type, VehicleType::Car);
        assert!(leg.is_begin_leg());
        assert!(!leg.is_end_leg());
    }

    #[test]
    fn test_trip_times_serialize_as_hhmm() {
        let trip = TripEntry {
            id: "t1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            employer_expenses: Money::from_cents(1000),
            duration: 25.5,
            rate: Money::from_cents(2800),
            deductible: Money::from_cents(1800),
            wrapped: false,
            receipt_file_name: None,
            note: None,
        };

        let json = serde_json::to_value(&trip).unwrap();
        assert_eq!(json["startTime"], "08:00");
        assert_eq!(json["endTime"], "09:30");
        assert_eq!(json["endDate"], "2025-05-02");

        let back: TripEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, trip);
        assert!(back.is_multi_day());
        assert!(back.is_in_year(2025));
    }

    #[test]
    fn test_trip_times_keep_seconds() {
        let start = NaiveTime::from_hms_opt(8, 0, 30).unwrap();
        let json = serde_json::to_value(crate::meal::TripInput::new(
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            None,
            start,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            Money::zero(),
        ))
        .unwrap();
        assert_eq!(json["startTime"], "08:00:30");
        assert_eq!(json["endTime"], "16:00");

        let back: crate::meal::TripInput = serde_json::from_value(json).unwrap();
        assert_eq!(back.start_time, start);
    }

    #[test]
    fn test_default_commute() {
        let commute = CommuteSettings::default();
        assert!(commute.car.active);
        assert_eq!(commute.car.distance, 0.0);
        assert!(!commute.motorcycle.active);
        assert!(!commute.bike.active);
        assert!(!commute.public_transport.active);
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: Settings = serde_json::from_str(r#"{"stationDistance": 5.0}"#).unwrap();
        assert_eq!(settings.station_distance, 5.0);
        assert_eq!(settings.tax_rates, TaxRates::default());
        assert!(settings.employer_refund.is_none());
    }
}
