//! `record` and `import` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use metrics_ledger::import::{load_metric_pairs, typed_value};
use metrics_ledger::{LedgerStore, Metrics, UpsertOutcome};

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Test name the metrics belong to
    #[arg(short, long)]
    pub test: String,

    /// Partition label (default partition when omitted)
    #[arg(short, long)]
    pub partition: Option<String>,

    /// Metric as NAME=VALUE, repeatable
    #[arg(short, long = "metric", value_parser = parse_metric_arg)]
    pub metrics: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Headerless `name,value` CSV file
    pub file: PathBuf,

    /// Test name the metrics belong to
    #[arg(short, long)]
    pub test: String,

    /// Partition label (default partition when omitted)
    #[arg(short, long)]
    pub partition: Option<String>,
}

pub fn run_record(store: &LedgerStore, args: RecordArgs) -> Result<()> {
    let metrics = typed_metrics(&args.metrics);
    let outcome = store
        .upsert(args.partition.as_deref(), &args.test, &metrics)
        .with_context(|| format!("Failed to record metrics for {}", args.test))?;
    print_outcome(&args.test, metrics.len(), &outcome);
    Ok(())
}

pub fn run_import(store: &LedgerStore, args: ImportArgs) -> Result<()> {
    let metrics = load_metric_pairs(&args.file)
        .with_context(|| format!("Failed to read metrics from {:?}", args.file))?;
    if metrics.is_empty() {
        tracing::warn!("No metrics found in {:?}", args.file);
    }
    let outcome = store
        .upsert(args.partition.as_deref(), &args.test, &metrics)
        .with_context(|| format!("Failed to import metrics for {}", args.test))?;
    print_outcome(&args.test, metrics.len(), &outcome);
    Ok(())
}

fn typed_metrics(pairs: &[(String, String)]) -> Metrics {
    pairs
        .iter()
        .map(|(name, raw)| (name.clone(), typed_value(name, raw)))
        .collect()
}

fn print_outcome(test: &str, count: usize, outcome: &UpsertOutcome) {
    let action = if outcome.inserted { "Added" } else { "Updated" };
    println!(
        "{} {} ({} metric(s)) in {}",
        action,
        test,
        count - outcome.dropped.len(),
        outcome.partition_file.display()
    );
    if outcome.migrated {
        println!("Header migrated to the current metric set");
    }
    for name in &outcome.dropped {
        println!("  ignored unknown metric: {}", name);
    }
    for column in &outcome.lost_columns {
        println!("  discarded legacy column: {}", column);
    }
    match &outcome.report_file {
        Some(path) => println!("Report: {}", path.display()),
        None => println!("Report not written; run `metrics-ledger render` to retry"),
    }
}

fn parse_metric_arg(arg: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("metric name is empty in `{}`", arg));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use metrics_ledger::MetricValue;

    #[test]
    fn parse_metric_arg__name_value__then_split_and_trimmed() {
        assert_eq!(
            parse_metric_arg(" PeakMemoryMb = 812.5 ").unwrap(),
            ("PeakMemoryMb".to_string(), "812.5".to_string())
        );
        assert_eq!(
            parse_metric_arg("Note=a=b").unwrap(),
            ("Note".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn parse_metric_arg__missing_name__then_error() {
        assert!(parse_metric_arg("=10").is_err());
        assert!(parse_metric_arg("ExecutionTimeMs").is_err());
    }

    #[test]
    fn typed_metrics__registry_kinds__then_applied() {
        let metrics = typed_metrics(&[
            ("ExecutionTimeMs".to_string(), "48211".to_string()),
            ("CpuUsagePercent".to_string(), "37".to_string()),
        ]);
        assert_eq!(metrics["ExecutionTimeMs"], MetricValue::Integer(48211));
        assert_eq!(metrics["CpuUsagePercent"], MetricValue::Float(37.0));
    }

    #[test]
    fn run_record__new_test__then_row_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());
        let args = RecordArgs {
            test: "testOpenProject".to_string(),
            partition: Some("2025.1".to_string()),
            metrics: vec![("ProjectOpenTimeMs".to_string(), "2300".to_string())],
        };

        run_record(&store, args).unwrap();

        let table = store.load(Some("2025.1")).unwrap().unwrap();
        assert_eq!(table.cell("testOpenProject", "ProjectOpenTimeMs"), Some("2300"));
    }

    #[test]
    fn run_import__pairs_file__then_metrics_upserted() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("result.csv");
        std::fs::write(&file, "IndexingTimeMs,5400\nIndexedFilesCount,1200\n").unwrap();
        let store = LedgerStore::open(dir.path().join("reports"));
        let args = ImportArgs {
            file,
            test: "testIndexing".to_string(),
            partition: None,
        };

        run_import(&store, args).unwrap();

        let table = store.load(None).unwrap().unwrap();
        assert_eq!(table.cell("testIndexing", "IndexingTimeMs"), Some("5400"));
        assert_eq!(table.cell("testIndexing", "IndexedFilesCount"), Some("1200"));
    }
}
