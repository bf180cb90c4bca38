//! # CLI Commands
//!
//! One module per subcommand. Each command is a plain function from the
//! loaded state to the text it prints, so it can be tested without a
//! terminal.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared formatting)
//! ├── summary.rs   ◄─── Yearly totals, balance sheet, recent activity
//! ├── months.rs    ◄─── Monthly breakdown table
//! ├── schedule.rs  ◄─── Equipment depreciation plans
//! ├── export.rs    ◄─── CSV text for the tax return
//! └── config.rs    ◄─── Effective configuration
//! ```
//!
//! All commands that print data accept `--json` and then emit the core DTOs
//! unchanged (money as integer cents).

pub mod config;
pub mod export;
pub mod months;
pub mod schedule;
pub mod summary;

use pendler_core::Money;
use serde::Serialize;

use crate::error::AppResult;

/// Right-aligned euro amount for tables.
pub(crate) fn eur(amount: Money) -> String {
    format!("{:>12}", amount.to_string())
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
