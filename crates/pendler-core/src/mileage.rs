//! # Mileage Allowance (Fahrtkosten)
//!
//! Allowances for individual legs, synthesis of the legs that belong to a
//! business trip, and lookup of a trip's legs for display.
//!
//! ## Trip Legs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   trip.date                                    trip.end_date            │
//! │      │                                              │                   │
//! │      ▼                                              ▼                   │
//! │   Zuhause ──► Bahnhof     ...absence...     Bahnhof ──► Zuhause         │
//! │   "Fahrt zum Bahnhof                        "Fahrt vom Bahnhof          │
//! │    (Dienstreise Beginn)"                     (Dienstreise Ende)"        │
//! │                                                                         │
//! │   allowance = distance × rate, rounded once to cents                    │
//! │   both legs carry related_trip_id = trip.id                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Legs come either from the active commute presets (car, motorcycle, bike,
//! public transport) or, when no preset yields a leg, from the plain station
//! distance at the generic mileage rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::rates::TaxRates;
use crate::types::{CommuteSettings, MileageEntry, Settings, TripEntry, VehicleType};
use crate::validation::{validate_amount, validate_distance, ValidationResult};

/// Purpose of the outbound station leg.
pub const PURPOSE_TO_STATION: &str = "Fahrt zum Bahnhof (Dienstreise Beginn)";

/// Purpose of the return station leg.
pub const PURPOSE_FROM_STATION: &str = "Fahrt vom Bahnhof (Dienstreise Ende)";

/// Purpose of a flat-cost public transport entry.
pub const PURPOSE_PUBLIC_TRANSPORT: &str = "Öffentliche Verkehrsmittel (Dienstreise)";

pub const LOCATION_HOME: &str = "Zuhause";
pub const LOCATION_STATION: &str = "Bahnhof";

// =============================================================================
// Allowance
// =============================================================================

/// Computes the allowance for a distance-based leg.
///
/// A round trip doubles the distance before the rate is applied, so the
/// result is rounded once.
///
/// ## Example
/// ```rust
/// use pendler_core::mileage::mileage_allowance;
/// use pendler_core::types::VehicleType;
/// use pendler_core::TaxRates;
///
/// let rates = TaxRates::default();
/// assert_eq!(mileage_allowance(5.0, VehicleType::Car, false, &rates).unwrap().cents(), 150);
/// assert_eq!(mileage_allowance(5.0, VehicleType::Car, true, &rates).unwrap().cents(), 300);
/// assert!(mileage_allowance(-1.0, VehicleType::Bike, false, &rates).is_err());
/// ```
pub fn mileage_allowance(
    distance_km: f64,
    vehicle: VehicleType,
    round_trip: bool,
    rates: &TaxRates,
) -> ValidationResult<Money> {
    validate_distance(distance_km)?;

    let rate = rates.rate_for(vehicle).ok_or_else(|| ValidationError::InvalidFormat {
        field: "vehicleType".to_string(),
        reason: "public transport is billed by ticket cost, not distance".to_string(),
    })?;

    let km = if round_trip { distance_km * 2.0 } else { distance_km };
    Ok(rate.per_km(km))
}

/// Returns the flat cost of a public transport leg after validation.
pub fn flat_cost_allowance(cost: Money) -> ValidationResult<Money> {
    validate_amount("cost", cost)?;
    Ok(cost)
}

// =============================================================================
// Manual Entry
// =============================================================================

/// User input for a manually recorded leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MileageInput {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub start_location: String,
    pub end_location: String,
    /// One-way distance in km.
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub round_trip: bool,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    /// Ticket cost, only for public transport.
    #[serde(default)]
    pub cost: Option<Money>,
    #[serde(default)]
    pub related_trip_id: Option<String>,
    #[serde(default)]
    pub receipt_file_name: Option<String>,
}

impl MileageEntry {
    /// Validates a manual leg and computes its allowance.
    pub fn new(id: impl Into<String>, input: &MileageInput, rates: &TaxRates) -> ValidationResult<Self> {
        validate_distance(input.distance)?;
        let total_km = if input.round_trip {
            input.distance * 2.0
        } else {
            input.distance
        };

        let allowance = match input.vehicle_type {
            VehicleType::PublicTransport => {
                let cost = input.cost.ok_or_else(|| ValidationError::Required {
                    field: "cost".to_string(),
                })?;
                flat_cost_allowance(cost)?
            }
            vehicle => mileage_allowance(input.distance, vehicle, input.round_trip, rates)?,
        };

        Ok(MileageEntry {
            id: id.into(),
            date: input.date,
            start_location: input.start_location.trim().to_string(),
            end_location: input.end_location.trim().to_string(),
            distance: input.distance,
            total_km,
            allowance,
            purpose: input.purpose.trim().to_string(),
            vehicle_type: input.vehicle_type,
            related_trip_id: input.related_trip_id.clone(),
            receipt_file_name: input.receipt_file_name.clone(),
        })
    }
}

// =============================================================================
// Leg Synthesis
// =============================================================================

fn leg(
    id: String,
    date: NaiveDate,
    outbound: bool,
    distance: f64,
    allowance: Money,
    vehicle: VehicleType,
    trip_id: &str,
) -> MileageEntry {
    let (start, end, purpose) = if outbound {
        (LOCATION_HOME, LOCATION_STATION, PURPOSE_TO_STATION)
    } else {
        (LOCATION_STATION, LOCATION_HOME, PURPOSE_FROM_STATION)
    };

    MileageEntry {
        id,
        date,
        start_location: start.to_string(),
        end_location: end.to_string(),
        distance,
        total_km: distance,
        allowance,
        purpose: purpose.to_string(),
        vehicle_type: vehicle,
        related_trip_id: Some(trip_id.to_string()),
        receipt_file_name: None,
    }
}

/// Builds the two station legs for a trip at the generic mileage rate.
///
/// Returns nothing when the station distance is zero (or not a usable
/// number).
///
/// ## Example
/// ```rust
/// use chrono::{NaiveDate, NaiveTime};
/// use pendler_core::meal::TripInput;
/// use pendler_core::mileage::station_legs;
/// use pendler_core::{Money, TaxRates, TripEntry};
///
/// let rates = TaxRates::default();
/// let input = TripInput::new(
///     NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
///     Some(NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()),
///     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     Money::zero(),
/// );
/// let trip = TripEntry::from_input("t1", &input, &rates).unwrap();
///
/// let legs = station_legs(&trip, 5.0, &rates);
/// assert_eq!(legs.len(), 2);
/// assert_eq!(legs[0].allowance.cents(), 150);
/// assert_eq!(legs[1].date, trip.end_date);
/// ```
pub fn station_legs(trip: &TripEntry, station_distance: f64, rates: &TaxRates) -> Vec<MileageEntry> {
    if !(station_distance.is_finite() && station_distance > 0.0) {
        return Vec::new();
    }

    let allowance = rates.mileage_rate.per_km(station_distance);
    vec![
        leg(
            format!("{}-beginn", trip.id),
            trip.date,
            true,
            station_distance,
            allowance,
            VehicleType::Car,
            &trip.id,
        ),
        leg(
            format!("{}-ende", trip.id),
            trip.end_date,
            false,
            station_distance,
            allowance,
            VehicleType::Car,
            &trip.id,
        ),
    ]
}

/// Builds legs from the active commute presets.
///
/// Every active car/motorcycle/bike preset with a distance yields a Beginn
/// and an Ende leg at its vehicle rate. An active public transport preset
/// with a cost yields one flat-cost entry on the start date.
pub fn commute_legs(trip: &TripEntry, commute: &CommuteSettings, rates: &TaxRates) -> Vec<MileageEntry> {
    let mut legs = Vec::new();

    for (vehicle, preset) in commute.distance_presets() {
        if !preset.active || !(preset.distance.is_finite() && preset.distance > 0.0) {
            continue;
        }
        let Some(rate) = rates.rate_for(vehicle) else {
            continue;
        };
        let allowance = rate.per_km(preset.distance);
        let key = vehicle.as_str();

        legs.push(leg(
            format!("{}-{}-beginn", trip.id, key),
            trip.date,
            true,
            preset.distance,
            allowance,
            vehicle,
            &trip.id,
        ));
        legs.push(leg(
            format!("{}-{}-ende", trip.id, key),
            trip.end_date,
            false,
            preset.distance,
            allowance,
            vehicle,
            &trip.id,
        ));
    }

    let public = commute.public_transport;
    if public.active && public.cost.is_positive() {
        legs.push(MileageEntry {
            id: format!("{}-{}", trip.id, VehicleType::PublicTransport.as_str()),
            date: trip.date,
            start_location: LOCATION_HOME.to_string(),
            end_location: LOCATION_STATION.to_string(),
            distance: 0.0,
            total_km: 0.0,
            allowance: public.cost,
            purpose: PURPOSE_PUBLIC_TRANSPORT.to_string(),
            vehicle_type: VehicleType::PublicTransport,
            related_trip_id: Some(trip.id.clone()),
            receipt_file_name: None,
        });
    }

    legs
}

/// Builds every leg a newly recorded trip gets.
///
/// Commute presets win; the plain station distance is the fallback when no
/// preset produces a leg.
pub fn generate_trip_legs(trip: &TripEntry, settings: &Settings) -> Vec<MileageEntry> {
    let legs = commute_legs(trip, &settings.default_commute, &settings.tax_rates);
    let legs = if legs.is_empty() {
        station_legs(trip, settings.station_distance, &settings.tax_rates)
    } else {
        legs
    };

    debug!(trip_id = %trip.id, legs = legs.len(), "Trip legs generated");
    legs
}

// =============================================================================
// Leg Lookup
// =============================================================================

/// Finds the legs that belong to a trip.
///
/// Legs linked by `related_trip_id` win. Only when none are linked does the
/// legacy match apply: unlinked legs dated on the trip's start or end date.
pub fn legs_for_trip<'a>(trip: &TripEntry, mileage: &'a [MileageEntry]) -> Vec<&'a MileageEntry> {
    let linked: Vec<&MileageEntry> = mileage
        .iter()
        .filter(|m| m.related_trip_id.as_deref() == Some(trip.id.as_str()))
        .collect();

    if !linked.is_empty() {
        return linked;
    }

    let legacy: Vec<&MileageEntry> = mileage
        .iter()
        .filter(|m| m.related_trip_id.is_none() && (m.date == trip.date || m.date == trip.end_date))
        .collect();

    if !legacy.is_empty() {
        warn!(
            trip_id = %trip.id,
            legs = legacy.len(),
            "Matched unlinked mileage legs by date"
        );
    }

    legacy
}

/// Legs an edit of `trip` regenerates.
///
/// Like [`legs_for_trip`], except that the legacy date match is limited to
/// legs tagged Beginn/Ende or booked as public transport. Other unlinked
/// entries on those dates are manual trips and stay untouched.
pub fn replaceable_legs_for_trip<'a>(trip: &TripEntry, mileage: &'a [MileageEntry]) -> Vec<&'a MileageEntry> {
    legs_for_trip(trip, mileage)
        .into_iter()
        .filter(|m| {
            m.related_trip_id.is_some()
                || m.is_begin_leg()
                || m.is_end_leg()
                || m.vehicle_type == VehicleType::PublicTransport
        })
        .collect()
}

/// A trip's legs grouped for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TripLegs<'a> {
    pub begin: Vec<&'a MileageEntry>,
    pub end: Vec<&'a MileageEntry>,
    pub public_transport: Vec<&'a MileageEntry>,
}

impl<'a> TripLegs<'a> {
    /// Allowance of the outbound legs.
    pub fn to_amount(&self) -> Money {
        self.begin.iter().map(|m| m.allowance).sum()
    }

    /// Allowance of the return legs.
    pub fn from_amount(&self) -> Money {
        self.end.iter().map(|m| m.allowance).sum()
    }

    pub fn public_transport_amount(&self) -> Money {
        self.public_transport.iter().map(|m| m.allowance).sum()
    }

    /// Per-diem plus every leg of the trip.
    pub fn trip_total(&self, trip: &TripEntry) -> Money {
        trip.deductible + self.to_amount() + self.from_amount() + self.public_transport_amount()
    }
}

/// Groups a trip's legs into Beginn, Ende and public transport.
pub fn station_legs_for_trip<'a>(trip: &TripEntry, mileage: &'a [MileageEntry]) -> TripLegs<'a> {
    let legs = legs_for_trip(trip, mileage);

    let mut grouped = TripLegs {
        begin: Vec::new(),
        end: Vec::new(),
        public_transport: Vec::new(),
    };

    for leg in legs {
        if leg.vehicle_type == VehicleType::PublicTransport {
            grouped.public_transport.push(leg);
        } else if leg.is_begin_leg() {
            grouped.begin.push(leg);
        } else if leg.is_end_leg() {
            grouped.end.push(leg);
        }
    }

    grouped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal::TripInput;
    use crate::types::{CommutePreset, PublicTransportPreset};
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trip(id: &str, start: NaiveDate, end: NaiveDate) -> TripEntry {
        let input = TripInput::new(
            start,
            Some(end),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            Money::zero(),
        );
        TripEntry::from_input(id, &input, &TaxRates::default()).unwrap()
    }

    fn manual(date: NaiveDate, related: Option<&str>, purpose: &str) -> MileageEntry {
        MileageEntry {
            id: format!("m-{}-{}", date, purpose),
            date,
            start_location: "A".to_string(),
            end_location: "B".to_string(),
            distance: 10.0,
            total_km: 10.0,
            allowance: Money::from_cents(300),
            purpose: purpose.to_string(),
            vehicle_type: VehicleType::Car,
            related_trip_id: related.map(str::to_string),
            receipt_file_name: None,
        }
    }

    #[test]
    fn test_allowance_per_vehicle() {
        let rates = TaxRates::default();
        assert_eq!(mileage_allowance(33.0, VehicleType::Car, false, &rates).unwrap().cents(), 990);
        assert_eq!(mileage_allowance(33.0, VehicleType::Motorcycle, false, &rates).unwrap().cents(), 660);
        assert_eq!(mileage_allowance(33.0, VehicleType::Bike, false, &rates).unwrap().cents(), 165);
        assert!(mileage_allowance(10.0, VehicleType::PublicTransport, false, &rates).is_err());
    }

    #[test]
    fn test_round_trip_rounds_once() {
        let rates = TaxRates::default();
        // 0.05 €/km × 2 × 0.3 km = 0.03 €; rounding each leg would give 0.04 €
        let once = mileage_allowance(0.3, VehicleType::Bike, true, &rates).unwrap();
        assert_eq!(once.cents(), 3);
    }

    #[test]
    fn test_manual_entry() {
        let rates = TaxRates::default();
        let input = MileageInput {
            date: date(2025, 2, 3),
            start_location: "Zuhause".to_string(),
            end_location: "Kunde".to_string(),
            distance: 12.5,
            round_trip: true,
            purpose: "Abholung".to_string(),
            vehicle_type: VehicleType::Car,
            cost: None,
            related_trip_id: None,
            receipt_file_name: None,
        };
        let entry = MileageEntry::new("m1", &input, &rates).unwrap();
        assert_eq!(entry.total_km, 25.0);
        assert_eq!(entry.allowance.cents(), 750);

        let ticket = MileageInput {
            vehicle_type: VehicleType::PublicTransport,
            cost: Some(Money::from_cents(490)),
            ..input.clone()
        };
        assert_eq!(MileageEntry::new("m2", &ticket, &rates).unwrap().allowance.cents(), 490);

        let no_cost = MileageInput {
            vehicle_type: VehicleType::PublicTransport,
            ..input.clone()
        };
        assert!(matches!(
            MileageEntry::new("m3", &no_cost, &rates),
            Err(ValidationError::Required { .. })
        ));

        let negative = MileageInput {
            distance: -3.0,
            ..input
        };
        assert!(MileageEntry::new("m4", &negative, &rates).is_err());
    }

    #[test]
    fn test_station_legs() {
        let rates = TaxRates::default();
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 2));

        let legs = station_legs(&t, 5.0, &rates);
        assert_eq!(legs.len(), 2);

        assert_eq!(legs[0].id, "t1-beginn");
        assert_eq!(legs[0].date, date(2025, 5, 1));
        assert_eq!(legs[0].start_location, "Zuhause");
        assert_eq!(legs[0].end_location, "Bahnhof");
        assert_eq!(legs[0].purpose, PURPOSE_TO_STATION);
        assert_eq!(legs[0].allowance.cents(), 150);

        assert_eq!(legs[1].id, "t1-ende");
        assert_eq!(legs[1].date, date(2025, 5, 2));
        assert_eq!(legs[1].purpose, PURPOSE_FROM_STATION);
        assert_eq!(legs[1].total_km, 5.0);
        assert!(legs.iter().all(|l| l.related_trip_id.as_deref() == Some("t1")));

        assert!(station_legs(&t, 0.0, &rates).is_empty());
    }

    #[test]
    fn test_commute_legs_from_presets() {
        let rates = TaxRates::default();
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 3));
        let commute = CommuteSettings {
            car: CommutePreset {
                active: false,
                distance: 7.0,
            },
            motorcycle: CommutePreset {
                active: true,
                distance: 10.0,
            },
            bike: CommutePreset {
                active: true,
                distance: 0.0,
            },
            public_transport: PublicTransportPreset {
                active: true,
                cost: Money::from_cents(350),
            },
        };

        let legs = commute_legs(&t, &commute, &rates);
        assert_eq!(legs.len(), 3);
        assert_eq!(legs[0].vehicle_type, VehicleType::Motorcycle);
        assert_eq!(legs[0].allowance.cents(), 200);
        assert!(legs[0].is_begin_leg());
        assert_eq!(legs[1].date, date(2025, 5, 3));
        assert!(legs[1].is_end_leg());
        assert_eq!(legs[2].vehicle_type, VehicleType::PublicTransport);
        assert_eq!(legs[2].allowance.cents(), 350);
        assert!(!legs[2].is_begin_leg() && !legs[2].is_end_leg());
    }

    #[test]
    fn test_generate_falls_back_to_station_distance() {
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 2));
        let settings = Settings {
            station_distance: 5.0,
            ..Settings::default()
        };
        // Default commute: car active with distance 0, so no preset leg
        let legs = generate_trip_legs(&t, &settings);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].id, "t1-beginn");

        assert!(generate_trip_legs(&t, &Settings::default()).is_empty());
    }

    #[test]
    fn test_legs_for_trip_prefers_linked() {
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 2));
        let mileage = vec![
            manual(date(2025, 5, 1), Some("t1"), PURPOSE_TO_STATION),
            manual(date(2025, 5, 1), None, PURPOSE_TO_STATION),
            manual(date(2025, 5, 9), Some("t2"), PURPOSE_FROM_STATION),
        ];

        let legs = legs_for_trip(&t, &mileage);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].related_trip_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_legs_for_trip_legacy_date_match() {
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 2));
        let mileage = vec![
            manual(date(2025, 5, 1), None, PURPOSE_TO_STATION),
            manual(date(2025, 5, 2), None, PURPOSE_FROM_STATION),
            manual(date(2025, 5, 2), Some("other"), PURPOSE_FROM_STATION),
            manual(date(2025, 5, 5), None, PURPOSE_FROM_STATION),
        ];

        let legs = legs_for_trip(&t, &mileage);
        assert_eq!(legs.len(), 2);
        assert!(legs.iter().all(|m| m.related_trip_id.is_none()));
    }

    #[test]
    fn test_station_legs_for_trip_total() {
        let rates = TaxRates::default();
        let t = trip("t1", date(2025, 5, 1), date(2025, 5, 2));
        let mut mileage = station_legs(&t, 5.0, &rates);
        mileage.push(MileageEntry {
            id: "pt".to_string(),
            vehicle_type: VehicleType::PublicTransport,
            allowance: Money::from_cents(290),
            purpose: PURPOSE_PUBLIC_TRANSPORT.to_string(),
            ..mileage[0].clone()
        });

        let grouped = station_legs_for_trip(&t, &mileage);
        assert_eq!(grouped.to_amount().cents(), 150);
        assert_eq!(grouped.from_amount().cents(), 150);
        assert_eq!(grouped.public_transport_amount().cents(), 290);
        // 14.00 per-diem + 1.50 + 1.50 + 2.90
        assert_eq!(grouped.trip_total(&t).cents(), 1400 + 150 + 150 + 290);
    }
}
