//! pricesync: fetch daily prices from the configured sources into SQLite.
//!
//! Commands:
//! - `ingest` (default): run one bounded ingestion cycle and print its summary
//! - `check`: per-symbol data-quality report for the stored prices

mod config;
mod main_lib;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use config::Config;
use main_lib::{init_tracing, print_report, print_summary, run_check, run_ingest};
use pricesync_core::ingest::cancel_channel;

/// Exit status when every attempted symbol failed.
const EXIT_ALL_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "pricesync", about = "Daily price ingestion into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion cycle over every configured symbol.
    Ingest {
        /// Print the cycle summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Report row counts, date ranges and data-quality issues per symbol.
    Check {
        /// Maximum number of issue rows to list.
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    match cli.command.unwrap_or(Commands::Ingest { json: false }) {
        Commands::Ingest { json } => {
            let (cancel_handle, cancel) = cancel_channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received; no new requests will be issued");
                    cancel_handle.cancel();
                }
            });

            let summary = run_ingest(&config, cancel).await?;
            print_summary(&summary, json)?;

            if summary.all_failed() {
                return Ok(ExitCode::from(EXIT_ALL_FAILED));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { limit } => {
            let report = run_check(&config, limit).await?;
            print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
    }
}
