//! # Tax Rates
//!
//! The user-configurable constants every calculator reads: per-diem tiers,
//! mileage rates per vehicle and the GWG (low-value asset) limit.
//!
//! ## Defaults
//! ```text
//! ┌──────────────────────────────┬──────────┐
//! │ meal_rate_8h                 │  14.00 € │
//! │ meal_rate_24h                │  28.00 € │
//! │ mileage_rate (station legs)  │   0.30 € │
//! │ mileage_rate_car             │   0.30 € │
//! │ mileage_rate_motorcycle      │   0.20 € │
//! │ mileage_rate_bike            │   0.05 € │
//! │ gwg_limit                    │ 952.00 € │
//! └──────────────────────────────┴──────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::VehicleType;
use crate::validation::{validate_amount, ValidationResult};

/// Process-wide tax configuration.
///
/// Rates per kilometre are stored as cents per kilometre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxRates {
    /// Per-diem for absences of at least 8 hours.
    pub meal_rate_8h: Money,
    /// Per-diem for absences of at least 24 hours.
    pub meal_rate_24h: Money,
    /// Generic rate used for auto-generated station legs.
    pub mileage_rate: Money,
    pub mileage_rate_car: Money,
    pub mileage_rate_motorcycle: Money,
    pub mileage_rate_bike: Money,
    /// Assets priced at or below this are deducted in full (GWG).
    pub gwg_limit: Money,
}

impl Default for TaxRates {
    fn default() -> Self {
        TaxRates {
            meal_rate_8h: Money::from_cents(1400),
            meal_rate_24h: Money::from_cents(2800),
            mileage_rate: Money::from_cents(30),
            mileage_rate_car: Money::from_cents(30),
            mileage_rate_motorcycle: Money::from_cents(20),
            mileage_rate_bike: Money::from_cents(5),
            gwg_limit: Money::from_cents(95_200),
        }
    }
}

impl TaxRates {
    /// Returns the per-kilometre rate for a vehicle.
    ///
    /// Public transport has no distance rate: its allowance is the ticket
    /// cost the user entered, so this returns `None`.
    ///
    /// ## Example
    /// ```rust
    /// use pendler_core::rates::TaxRates;
    /// use pendler_core::types::VehicleType;
    ///
    /// let rates = TaxRates::default();
    /// assert_eq!(rates.rate_for(VehicleType::Motorcycle).unwrap().cents(), 20);
    /// assert!(rates.rate_for(VehicleType::PublicTransport).is_none());
    /// ```
    pub fn rate_for(&self, vehicle: VehicleType) -> Option<Money> {
        match vehicle {
            VehicleType::Car => Some(self.mileage_rate_car),
            VehicleType::Motorcycle => Some(self.mileage_rate_motorcycle),
            VehicleType::Bike => Some(self.mileage_rate_bike),
            VehicleType::PublicTransport => None,
        }
    }

    /// Rejects negative rates, a GWG limit of zero or less and an 8h tier
    /// above the 24h tier.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_amount("mealRate8h", self.meal_rate_8h)?;
        validate_amount("mealRate24h", self.meal_rate_24h)?;
        validate_amount("mileageRate", self.mileage_rate)?;
        validate_amount("mileageRateCar", self.mileage_rate_car)?;
        validate_amount("mileageRateMotorcycle", self.mileage_rate_motorcycle)?;
        validate_amount("mileageRateBike", self.mileage_rate_bike)?;
        if !self.gwg_limit.is_positive() {
            return Err(ValidationError::OutOfRange {
                field: "gwgLimit".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }

        if self.meal_rate_8h > self.meal_rate_24h {
            return Err(ValidationError::OutOfRange {
                field: "mealRate8h".to_string(),
                min: 0,
                max: self.meal_rate_24h.cents(),
            });
        }

        Ok(())
    }
}
