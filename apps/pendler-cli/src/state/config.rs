//! # CLI Configuration
//!
//! Default settings for a ledger, layered from several sources.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Load Order (later overrides earlier)                 │
//! │                                                                         │
//! │  1. Defaults (this file)                                                │
//! │  2. pendler.toml                                                        │
//! │     ~/.config/pendler/pendler.toml (Linux)                              │
//! │     ~/Library/Application Support/de.pendler.pendler/pendler.toml       │
//! │  3. Environment variables (PENDLER_*)                                   │
//! │  4. validate()                                                          │
//! │                                                                         │
//! │  Settings stored in a backup file take precedence over all of these.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts in the file are euros, as the user would type them.
//!
//! ```toml
//! # pendler.toml
//! [data]
//! backup_file = "/home/anna/pendler-backup.json"
//! default_year = 2025
//!
//! [rates]
//! meal_rate_8h = 14.0
//! meal_rate_24h = 28.0
//! mileage_rate = 0.30
//! gwg_limit = 952.0
//!
//! [travel]
//! station_distance = 5.0
//! refund_threshold_hours = 8.0
//! refund_amount = 10.0
//!
//! [commute]
//! car_km = 4.5
//! ```

use std::path::{Path, PathBuf};

use pendler_core::validation::validate_distance;
use pendler_core::{
    CommutePreset, CommuteSettings, EmployerRefundSettings, Money, PublicTransportPreset, Settings, TaxRates,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

pub const CONFIG_FILE_NAME: &str = "pendler.toml";

// =============================================================================
// Sections
// =============================================================================

/// Where the ledger data lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Backup JSON used when `--data` is not given.
    pub backup_file: Option<PathBuf>,

    /// Year used when `--year` is not given. Default: current year.
    pub default_year: Option<i32>,
}

/// Tax rates in euros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub meal_rate_8h: f64,
    pub meal_rate_24h: f64,
    /// Station legs.
    pub mileage_rate: f64,
    pub mileage_rate_car: f64,
    pub mileage_rate_motorcycle: f64,
    pub mileage_rate_bike: f64,
    pub gwg_limit: f64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        let rates = TaxRates::default();
        RatesConfig {
            meal_rate_8h: rates.meal_rate_8h.as_euros_f64(),
            meal_rate_24h: rates.meal_rate_24h.as_euros_f64(),
            mileage_rate: rates.mileage_rate.as_euros_f64(),
            mileage_rate_car: rates.mileage_rate_car.as_euros_f64(),
            mileage_rate_motorcycle: rates.mileage_rate_motorcycle.as_euros_f64(),
            mileage_rate_bike: rates.mileage_rate_bike.as_euros_f64(),
            gwg_limit: rates.gwg_limit.as_euros_f64(),
        }
    }
}

impl RatesConfig {
    pub fn to_tax_rates(&self) -> TaxRates {
        TaxRates {
            meal_rate_8h: Money::from_euros(self.meal_rate_8h),
            meal_rate_24h: Money::from_euros(self.meal_rate_24h),
            mileage_rate: Money::from_euros(self.mileage_rate),
            mileage_rate_car: Money::from_euros(self.mileage_rate_car),
            mileage_rate_motorcycle: Money::from_euros(self.mileage_rate_motorcycle),
            mileage_rate_bike: Money::from_euros(self.mileage_rate_bike),
            gwg_limit: Money::from_euros(self.gwg_limit),
        }
    }
}

/// Station distance and the employer's meal refund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelConfig {
    /// One-way km home → station. 0 disables station legs.
    pub station_distance: f64,
    pub refund_threshold_hours: Option<f64>,
    pub refund_amount: Option<f64>,
}

/// Commute presets; a distance or cost marks the mode active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommuteConfig {
    pub car_km: Option<f64>,
    pub motorcycle_km: Option<f64>,
    pub bike_km: Option<f64>,
    /// Flat ticket cost in euros.
    pub public_transport_cost: Option<f64>,
}

impl CommuteConfig {
    fn is_empty(&self) -> bool {
        self.car_km.is_none()
            && self.motorcycle_km.is_none()
            && self.bike_km.is_none()
            && self.public_transport_cost.is_none()
    }

    pub fn to_commute_settings(&self) -> CommuteSettings {
        if self.is_empty() {
            return CommuteSettings::default();
        }

        let preset = |km: Option<f64>| CommutePreset {
            active: km.is_some(),
            distance: km.unwrap_or(0.0),
        };

        CommuteSettings {
            car: preset(self.car_km),
            motorcycle: preset(self.motorcycle_km),
            bike: preset(self.bike_km),
            public_transport: PublicTransportPreset {
                active: self.public_transport_cost.is_some(),
                cost: Money::from_euros(self.public_transport_cost.unwrap_or(0.0)),
            },
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rates: RatesConfig,

    #[serde(default)]
    pub travel: TravelConfig,

    #[serde(default)]
    pub commute: CommuteConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicitly given path must exist; the default path may be absent.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() || explicit {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> AppResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| AppError::Config("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
        }

        std::fs::write(&path, self.to_toml()?).map_err(|e| AppError::io(&path, e))?;

        info!(?path, "Config saved");
        Ok(path)
    }

    pub fn to_toml(&self) -> AppResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        self.rates.to_tax_rates().validate()?;
        validate_distance(self.travel.station_distance)?;

        for km in [self.commute.car_km, self.commute.motorcycle_km, self.commute.bike_km]
            .into_iter()
            .flatten()
        {
            validate_distance(km)?;
        }

        if self.travel.refund_threshold_hours.is_some() != self.travel.refund_amount.is_some() {
            return Err(AppError::Config(
                "refund_threshold_hours and refund_amount must be set together".into(),
            ));
        }
        if let Some(hours) = self.travel.refund_threshold_hours {
            if !(0.0..=24.0 * 31.0).contains(&hours) {
                return Err(AppError::Config(format!(
                    "refund_threshold_hours must be between 0 and 744, got {}",
                    hours
                )));
            }
        }
        if self.travel.refund_amount.is_some_and(|a| a < 0.0) {
            return Err(AppError::Config("refund_amount must not be negative".into()));
        }

        Ok(())
    }

    /// Applies `PENDLER_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("PENDLER_DATA_FILE") {
            debug!(path = %path, "Overriding backup file from environment");
            self.data.backup_file = Some(PathBuf::from(path));
        }

        if let Some(year) = var("PENDLER_YEAR") {
            match year.parse::<i32>() {
                Ok(y) => self.data.default_year = Some(y),
                Err(_) => warn!(year = %year, "Ignoring invalid PENDLER_YEAR"),
            }
        }

        let float = |key: &str, target: &mut f64| {
            if let Some(raw) = var(key) {
                match raw.trim().replace(',', ".").parse::<f64>() {
                    Ok(value) => {
                        debug!(key, value, "Overriding from environment");
                        *target = value;
                    }
                    Err(_) => warn!(key, value = %raw, "Ignoring non-numeric environment value"),
                }
            }
        };

        float("PENDLER_STATION_DISTANCE", &mut self.travel.station_distance);
        float("PENDLER_MEAL_RATE_8H", &mut self.rates.meal_rate_8h);
        float("PENDLER_MEAL_RATE_24H", &mut self.rates.meal_rate_24h);
        float("PENDLER_MILEAGE_RATE", &mut self.rates.mileage_rate);
        float("PENDLER_GWG_LIMIT", &mut self.rates.gwg_limit);
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("de", "pendler", "pendler").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Ledger settings implied by this configuration.
    pub fn settings(&self) -> Settings {
        let employer_refund = match (self.travel.refund_threshold_hours, self.travel.refund_amount) {
            (Some(threshold_hours), Some(amount)) => Some(EmployerRefundSettings {
                threshold_hours,
                amount: Money::from_euros(amount),
            }),
            _ => None,
        };

        Settings {
            tax_rates: self.rates.to_tax_rates(),
            default_commute: self.commute.to_commute_settings(),
            station_distance: self.travel.station_distance,
            employer_refund,
        }
    }

    /// `--data` if given, else the configured backup file.
    pub fn backup_file(&self, cli_path: Option<PathBuf>) -> AppResult<PathBuf> {
        cli_path
            .or_else(|| self.data.backup_file.clone())
            .ok_or(AppError::MissingData)
    }

    /// `--year` if given, else the configured default, else `today_year`.
    pub fn year(&self, cli_year: Option<i32>, today_year: i32) -> i32 {
        cli_year.or(self.data.default_year).unwrap_or(today_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pendler-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_default_config_matches_core_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let settings = config.settings();
        assert_eq!(settings.tax_rates, TaxRates::default());
        assert_eq!(settings.default_commute, CommuteSettings::default());
        assert_eq!(settings.station_distance, 0.0);
        assert!(settings.employer_refund.is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let config: AppConfig = toml::from_str(
            r#"
            [rates]
            meal_rate_8h = 15.0

            [travel]
            station_distance = 5.0
            refund_threshold_hours = 8.0
            refund_amount = 10.0

            [commute]
            bike_km = 3.5
            "#,
        )
        .unwrap();

        let settings = config.settings();
        assert_eq!(settings.tax_rates.meal_rate_8h.cents(), 1500);
        assert_eq!(settings.tax_rates.meal_rate_24h.cents(), 2800);
        assert_eq!(settings.station_distance, 5.0);
        assert_eq!(settings.employer_refund.unwrap().amount.cents(), 1000);
        assert!(settings.default_commute.bike.active);
        assert!(!settings.default_commute.car.active);
        assert_eq!(settings.default_commute.bike.distance, 3.5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.travel.station_distance = -1.0;
        assert!(config.validate().is_err());
        config.travel.station_distance = 5.0;
        assert!(config.validate().is_ok());

        config.rates.meal_rate_8h = 30.0;
        assert!(config.validate().is_err());
        config.rates.meal_rate_8h = 14.0;

        config.travel.refund_amount = Some(10.0);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
        config.travel.refund_threshold_hours = Some(8.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PENDLER_DATA_FILE", "/tmp/backup.json"),
            ("PENDLER_YEAR", "2024"),
            ("PENDLER_STATION_DISTANCE", "7,5"),
            ("PENDLER_GWG_LIMIT", "800"),
            ("PENDLER_MEAL_RATE_8H", "abc"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.data.backup_file, Some(PathBuf::from("/tmp/backup.json")));
        assert_eq!(config.data.default_year, Some(2024));
        assert_eq!(config.travel.station_distance, 7.5);
        assert_eq!(config.rates.gwg_limit, 800.0);
        // Unparseable values are ignored
        assert_eq!(config.rates.meal_rate_8h, 14.0);
    }

    #[test]
    fn test_year_and_backup_precedence() {
        let mut config = AppConfig::default();
        assert_eq!(config.year(None, 2026), 2026);
        config.data.default_year = Some(2025);
        assert_eq!(config.year(None, 2026), 2025);
        assert_eq!(config.year(Some(2023), 2026), 2023);

        assert!(matches!(config.backup_file(None), Err(AppError::MissingData)));
        config.data.backup_file = Some(PathBuf::from("a.json"));
        assert_eq!(config.backup_file(None).unwrap(), PathBuf::from("a.json"));
        assert_eq!(config.backup_file(Some(PathBuf::from("b.json"))).unwrap(), PathBuf::from("b.json"));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("config.toml");
        let mut config = AppConfig::default();
        config.travel.station_distance = 12.0;
        config.commute.public_transport_cost = Some(4.9);

        config.save(Some(path.clone())).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.settings().default_commute.public_transport.cost.cents(), 490);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let err = AppConfig::load(Some(temp_path("missing.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
