//! `render`, `partitions` and `compare` commands.

use anyhow::{bail, Context, Result};
use metrics_ledger::compare::{self, Comparison};
use metrics_ledger::LedgerStore;
use serde::Serialize;

pub fn run_render(store: &LedgerStore, partition: Option<&str>) -> Result<()> {
    let path = store
        .render(partition)
        .with_context(|| format!("Failed to render partition {}", display_label(partition)))?;
    println!("{}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct PartitionEntry {
    label: String,
    tests: usize,
}

pub fn run_partitions(store: &LedgerStore, format: &str) -> Result<()> {
    let labels = store.partitions().context("Failed to list partitions")?;
    let mut entries = Vec::with_capacity(labels.len());
    for label in labels {
        let tests = match store.load(Some(&label)) {
            Ok(table) => table.map(|t| t.len()).unwrap_or(0),
            Err(err) => {
                tracing::warn!("Partition {} is unreadable: {}", label, err);
                0
            }
        };
        entries.push(PartitionEntry { label, tests });
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&entries)?;
            println!("{}", json);
        }
        _ => {
            if entries.is_empty() {
                println!("No partitions found.");
            } else {
                println!("{:<24} {:>8}", "PARTITION", "TESTS");
                println!("{}", "-".repeat(33));
                for entry in &entries {
                    println!("{:<24} {:>8}", entry.label, entry.tests);
                }
                println!("\nTotal: {} partition(s)", entries.len());
            }
        }
    }
    Ok(())
}

pub fn run_compare(store: &LedgerStore, labels: Vec<String>, format: &str) -> Result<()> {
    let labels = if labels.is_empty() {
        store.partitions().context("Failed to list partitions")?
    } else {
        labels
    };
    if labels.is_empty() {
        bail!(
            "No partitions found under {:?}",
            store.config().reports_root()
        );
    }

    let report = compare::write_comparison(store, labels.as_slice())
        .context("Failed to write comparison report")?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&report.comparison)?;
            println!("{}", json);
        }
        _ => {
            print!("{}", summary_text(&report.comparison));
            match &report.written_to {
                Some(path) => println!("\nReport: {}", path.display()),
                None => println!("\nAt least two partitions are needed for a comparison report."),
            }
        }
    }
    Ok(())
}

fn summary_text(comparison: &Comparison) -> String {
    let mut out = String::new();
    for skipped in &comparison.skipped {
        out.push_str(&format!("skipped {}: {}\n", skipped.label, skipped.reason));
    }

    out.push_str(&format!("{:<18}", "METRIC"));
    for label in &comparison.labels {
        out.push_str(&format!(" {:>14}", label));
    }
    out.push_str(&format!(" {:>22} {:<12}\n", "CHANGE", "STATUS"));

    for row in &comparison.summary {
        out.push_str(&format!("{:<18}", row.metric.as_str()));
        for value in &row.values {
            let cell = value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            out.push_str(&format!(" {:>14}", cell));
        }
        match &row.delta {
            Some(delta) => out.push_str(&format!(
                " {:>22} {:<12}\n",
                delta.to_string(),
                delta.trend.to_string()
            )),
            None => out.push_str(&format!(" {:>22} {:<12}\n", "N/A", "")),
        }
    }
    out
}

fn display_label(partition: Option<&str>) -> &str {
    partition.unwrap_or("(default)")
}
