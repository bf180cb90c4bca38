//! # Export Command
//!
//! CSV text of one year, to stdout or a file.

use std::path::{Path, PathBuf};

use pendler_core::Ledger;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Builds the CSV. With `output`, writes it there and returns a short notice
/// instead.
pub fn run(ledger: &Ledger, year: i32, output: Option<&Path>) -> AppResult<String> {
    debug!(year, ?output, "export command");
    let csv = ledger.export_csv(year)?;

    match output {
        Some(path) => {
            std::fs::write(path, &csv).map_err(|e| AppError::io(path, e))?;
            info!(?path, bytes = csv.len(), "CSV export written");
            Ok(format!("Export {} gespeichert: {}\n", year, path.display()))
        }
        None => Ok(csv),
    }
}

/// Default export file name for `year`.
fn default_file_name(year: i32) -> String {
    format!("steuer_export_{}.csv", year)
}

/// Target of `--output`: absent prints to stdout, a bare flag writes
/// `steuer_export_<year>.csv` in the working directory.
pub fn output_path(year: i32, output: Option<Option<PathBuf>>) -> Option<PathBuf> {
    output.map(|path| path.unwrap_or_else(|| PathBuf::from(default_file_name(year))))
}
