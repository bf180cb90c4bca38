//! # State Module
//!
//! Everything the commands read: configuration and the ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Loading                                        │
//! │                                                                         │
//! │  ┌──────────────────┐      settings()      ┌──────────────────────┐    │
//! │  │    AppConfig     │ ───────────────────► │  Ledger::new(..)     │    │
//! │  │  defaults        │                      │                      │    │
//! │  │  pendler.toml    │                      │  + import(backup)    │    │
//! │  │  PENDLER_*       │                      │    (sections in the  │    │
//! │  └──────────────────┘                      │    backup win)       │    │
//! │                                            └──────────────────────┘    │
//! │  ┌──────────────────┐       parse_backup          ▲                    │
//! │  │  backup.json     │ ────────────────────────────┘                    │
//! │  │  (app or native) │                                                  │
//! │  └──────────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod backup;
mod config;

pub use backup::{ledger_from_json, load_ledger, parse_backup, to_native_json, NATIVE_FORMAT};
pub use config::{AppConfig, CommuteConfig, DataConfig, RatesConfig, TravelConfig, CONFIG_FILE_NAME};
