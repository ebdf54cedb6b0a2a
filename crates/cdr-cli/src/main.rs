//! `cdr` — call-detail-record generation and CSV reports.
//!
//! # Usage
//!
//! ```text
//! cdr seed
//! cdr generate
//! cdr records --msisdn 79001112233 --csv
//! cdr report --msisdn 79001112233 --start 2025-03-01T00:00:00 --end 2025-03-31T23:59:59
//! cdr periodic --msisdn 79001112233 --period 1month
//! cdr batch --period 1week
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use cdr_store_sqlite::SqliteStore;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cdr", author, version, about = "Call detail records and CSV reports")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cdr.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Persist the configured subscriber population.
  Seed,

  /// Synthesize one year of call records for the stored subscribers.
  Generate,

  /// List stored call records, oldest first.
  Records {
    /// Only records where this MSISDN is caller or callee.
    #[arg(long)]
    msisdn: Option<String>,

    /// Print CDR lines instead of JSON.
    #[arg(long)]
    csv: bool,
  },

  /// Build a report over an explicit time range and wait for it.
  Report {
    #[arg(long)]
    msisdn: Option<String>,

    /// RFC 3339, or `YYYY-MM-DDTHH:MM:SS` taken as UTC.
    #[arg(long, value_parser = parse_timestamp)]
    start: Option<DateTime<Utc>>,

    /// RFC 3339, or `YYYY-MM-DDTHH:MM:SS` taken as UTC.
    #[arg(long, value_parser = parse_timestamp)]
    end: Option<DateTime<Utc>>,
  },

  /// Build a report over a recent period and wait for it.
  Periodic {
    #[arg(long)]
    msisdn: Option<String>,

    /// One of 6months, 3months, 1month, 1week.
    #[arg(long)]
    period: Option<String>,
  },

  /// Build a periodic report for every stored subscriber at once.
  Batch {
    /// One of 6months, 3months, 1month, 1week.
    #[arg(long)]
    period: String,
  },
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, cdr_core::call::CDR_TIMESTAMP_FORMAT)
    .map(|naive| naive.and_utc())
    .map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store_path = settings.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Seed => commands::seed(&store, &settings).await,
    Command::Generate => commands::generate(&store).await,
    Command::Records { msisdn, csv } => {
      commands::records(&store, msisdn.as_deref(), csv).await
    }
    Command::Report { msisdn, start, end } => {
      let request = cdr_core::report::ReportRequest { msisdn, start, end };
      commands::report(store, &settings, request).await
    }
    Command::Periodic { msisdn, period } => {
      let request = cdr_core::report::PeriodicReportRequest { msisdn, period };
      commands::periodic(store, &settings, request).await
    }
    Command::Batch { period } => commands::batch(store, &settings, &period).await,
  }
}
