//! # Pendler CLI Library
//!
//! Command-line front end over `pendler-core`.
//!
//! ## Module Organization
//! ```text
//! pendler_cli/
//! ├── lib.rs          ◄─── You are here (argument parsing & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State exports
//! │   ├── config.rs   ◄─── Layered configuration
//! │   └── backup.rs   ◄─── Backup JSON → Ledger
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports, table formatting
//! │   ├── summary.rs  ◄─── Yearly dashboard
//! │   ├── months.rs   ◄─── Monthly breakdown
//! │   ├── schedule.rs ◄─── Depreciation plans
//! │   ├── export.rs   ◄─── CSV export
//! │   └── config.rs   ◄─── Effective configuration
//! └── error.rs        ◄─── AppError + ErrorCode
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use pendler_core::Ledger;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use error::AppResult;
use state::AppConfig;

/// Tax-deduction bookkeeping for mobile workers.
#[derive(Debug, Parser)]
#[command(name = "pendler", version, about)]
pub struct Cli {
    /// Tax year (default: config `data.default_year`, else the current year)
    #[arg(long, global = true)]
    pub year: Option<i32>,

    /// Backup JSON file (default: config `data.backup_file`)
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Config file (default: pendler.toml in the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Yearly totals, balance sheet and latest entries
    Summary {
        /// Number of recent entries to list
        #[arg(long, default_value_t = pendler_core::rollup::DEFAULT_RECENT_LIMIT)]
        recent: usize,
    },

    /// Deductions per month
    Months {
        /// Include months without entries
        #[arg(long)]
        all: bool,
    },

    /// Equipment depreciation plans
    Schedule {
        /// Only the item with this id
        #[arg(long)]
        id: Option<String>,
    },

    /// CSV export for the tax return
    Export {
        /// Write to this file instead of stdout (bare flag: steuer_export_<year>.csv)
        #[arg(long, short, value_name = "FILE", num_args = 0..=1)]
        output: Option<Option<PathBuf>>,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

/// Parses arguments, runs the command and maps failures to an exit code.
pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    match execute(cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let report = err.report();
            if json {
                match serde_json::to_string(&report) {
                    Ok(line) => println!("{}", line),
                    Err(_) => eprintln!("error: {}", report.message),
                }
            } else {
                eprintln!("error: {}", report.message);
            }
            ExitCode::from(report.code.exit_code())
        }
    }
}

/// Runs a parsed command and returns what it prints.
pub fn execute(cli: Cli) -> AppResult<String> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(Some(path.clone()))?,
        None => AppConfig::load_or_default(None),
    };
    let year = config.year(cli.year, chrono::Local::now().year());
    info!(year, command = ?cli.command, "Running command");

    match cli.command {
        Command::Config { init } => commands::config::run(&config, init, cli.config),
        Command::Summary { recent } => {
            let ledger = load(&config, cli.data)?;
            commands::summary::run(&ledger, year, recent, cli.json)
        }
        Command::Months { all } => {
            let ledger = load(&config, cli.data)?;
            commands::months::run(&ledger, year, all, cli.json)
        }
        Command::Schedule { id } => {
            let ledger = load(&config, cli.data)?;
            commands::schedule::run(&ledger, year, id.as_deref(), cli.json)
        }
        Command::Export { output } => {
            let ledger = load(&config, cli.data)?;
            let output = commands::export::output_path(year, output);
            commands::export::run(&ledger, year, output.as_deref())
        }
    }
}

fn load(config: &AppConfig, data: Option<PathBuf>) -> AppResult<Ledger> {
    let path = config.backup_file(data)?;
    debug!(?path, "Loading backup");
    state::load_ledger(&path, config.settings())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=pendler_core=trace` - Trace the calculation engine only
/// - Default: INFO, DEBUG for pendler crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pendler=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
