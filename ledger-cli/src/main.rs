//! Metrics Ledger Command Line Interface
//!
//! Records test run metrics into the partitioned ledger and builds reports.
//!
//! # Commands
//!
//! - `metrics-ledger record` - Upsert metrics for one test
//! - `metrics-ledger import` - Upsert a `name,value` metrics file for one test
//! - `metrics-ledger render` - Regenerate a partition report
//! - `metrics-ledger partitions` - List labelled partitions
//! - `metrics-ledger compare` - Compare partitions and write the comparison report

mod record;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use metrics_ledger::{LedgerConfig, LedgerStore};
use tracing_subscriber::{fmt, EnvFilter};

/// Metrics Ledger - consolidated performance metrics for IDE test runs
#[derive(Parser)]
#[command(name = "metrics-ledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Reports root directory [default: $METRICS_LEDGER_DIR, else build/reports/metrics]
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record metrics for a test
    Record(record::RecordArgs),

    /// Import a name,value metrics file for a test
    Import(record::ImportArgs),

    /// Regenerate a partition's HTML report
    Render {
        /// Partition label (default partition when omitted)
        #[arg(short, long)]
        partition: Option<String>,
    },

    /// List labelled partitions
    Partitions {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compare partitions (all discovered partitions when none are given)
    Compare {
        /// Partition labels to compare
        labels: Vec<String>,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let store = LedgerStore::new(ledger_config(cli.reports_dir));

    match cli.command {
        Commands::Record(args) => record::run_record(&store, args),
        Commands::Import(args) => record::run_import(&store, args),
        Commands::Render { partition } => report::run_render(&store, partition.as_deref()),
        Commands::Partitions { format } => report::run_partitions(&store, &format),
        Commands::Compare { labels, format } => report::run_compare(&store, labels, &format),
    }
}

/// `--reports-dir` wins; otherwise the environment and built-in default apply.
fn ledger_config(reports_dir: Option<PathBuf>) -> LedgerConfig {
    match reports_dir {
        Some(dir) => LedgerConfig::new(dir),
        None => LedgerConfig::from_env(),
    }
}
