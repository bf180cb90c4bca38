//! # Pendler CLI Entry Point
//!
//! ```text
//! pendler summary  --year 2025 --data backup.json
//! pendler months   --all
//! pendler schedule --id 1714550400000
//! pendler export   --output steuer_export_2025.csv
//! pendler config   --init
//! ```
//!
//! The actual setup is in lib.rs for testability.

use std::process::ExitCode;

fn main() -> ExitCode {
    pendler_cli::run()
}
