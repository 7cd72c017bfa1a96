//! Cross-partition comparison.
//!
//! Loads several partitions (typically one per product version), lines their
//! values up side by side and derives deltas between the first and the last
//! label in ascending order. Reads are unlocked: a partition being written
//! concurrently is read in whatever state it is in.
//!
//! ## Summary policy
//!
//! For each key metric the value a partition contributes is taken from the
//! first row, in table order, that has a value for it. It is not an aggregate
//! over tests.

mod delta;
mod html;
mod view;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

pub use delta::{Delta, Trend};
pub use html::render_comparison;
pub use view::{ColumnKey, PartitionValues, TestValues, VersionView};

use crate::errors::Result;
use crate::schema::{MetricName, KEY_METRICS};
use crate::store::LedgerStore;
use crate::table::write_atomic;
use crate::value::MetricValue;

/// A partition that could not take part in the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPartition {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub metric: MetricName,
    /// One entry per label, `None` when the partition has no value.
    pub values: Vec<Option<MetricValue>>,
    pub delta: Option<Delta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub column: ColumnKey,
    pub values: Vec<Option<MetricValue>>,
    /// Only time and memory metrics get a delta.
    pub improvable: bool,
    pub delta: Option<Delta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailTable {
    pub test_name: String,
    pub rows: Vec<DetailRow>,
}

/// Bar chart input for one key metric; absent values plot as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: MetricName,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub generated_at: String,
    /// Labels that loaded, ascending.
    pub labels: Vec<String>,
    pub skipped: Vec<SkippedPartition>,
    pub summary: Vec<SummaryRow>,
    pub details: Vec<DetailTable>,
    pub charts: Vec<ChartSeries>,
}

/// Result of [`write_comparison`].
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub comparison: Comparison,
    /// Where the HTML report went; `None` when fewer than two partitions loaded.
    pub written_to: Option<PathBuf>,
}

fn owned(values: Vec<Option<&MetricValue>>) -> Vec<Option<MetricValue>> {
    values.into_iter().map(|value| value.cloned()).collect()
}

/// Load every named partition into a [`VersionView`]. Partitions that are
/// missing, unreadable or malformed are skipped with a warning.
pub fn load_view<S: AsRef<str>>(
    store: &LedgerStore,
    labels: &[S],
) -> (VersionView, Vec<SkippedPartition>) {
    let unique: BTreeSet<&str> = labels.iter().map(|label| label.as_ref()).collect();
    let mut partitions = Vec::with_capacity(unique.len());
    let mut skipped = Vec::new();

    for label in unique {
        let reason = match store.load(Some(label)) {
            Ok(Some(table)) => {
                partitions.push(PartitionValues::from_table(label, &table));
                continue;
            }
            Ok(None) => "no metrics table".to_string(),
            Err(err) => err.to_string(),
        };
        tracing::warn!("Skipping partition {:?} in comparison: {}", label, reason);
        skipped.push(SkippedPartition {
            label: label.to_string(),
            reason,
        });
    }

    (VersionView::new(partitions), skipped)
}

/// Build the comparison of `labels`.
pub fn compare<S: AsRef<str>>(store: &LedgerStore, labels: &[S]) -> Comparison {
    let (view, skipped) = load_view(store, labels);
    build(&view, skipped)
}

/// Build a comparison from an already loaded view.
pub fn build(view: &VersionView, skipped: Vec<SkippedPartition>) -> Comparison {
    let labels = view.labels();

    let summary = KEY_METRICS
        .iter()
        .map(|&metric| {
            let values = view.first_values(&ColumnKey::Known(metric));
            let delta = Delta::across(&values);
            SummaryRow {
                metric,
                values: owned(values),
                delta,
            }
        })
        .collect();

    let details = view
        .test_names()
        .into_iter()
        .map(|test_name| {
            let rows = view
                .columns_for(test_name)
                .into_iter()
                .map(|column| {
                    let values = view.values(test_name, column);
                    let improvable = column.is_improvable();
                    let delta = if improvable {
                        Delta::across(&values)
                    } else {
                        None
                    };
                    DetailRow {
                        column: column.clone(),
                        values: owned(values),
                        improvable,
                        delta,
                    }
                })
                .collect();
            DetailTable {
                test_name: test_name.to_string(),
                rows,
            }
        })
        .collect();

    let charts = KEY_METRICS
        .iter()
        .map(|&metric| ChartSeries {
            metric,
            labels: labels.clone(),
            values: view
                .first_values(&ColumnKey::Known(metric))
                .into_iter()
                .map(|value| value.and_then(MetricValue::as_f64).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    Comparison {
        generated_at: chrono::Utc::now().to_rfc3339(),
        labels,
        skipped,
        summary,
        details,
        charts,
    }
}

/// Compare `labels` and write `metrics_comparison.html` at the reports root
/// when at least two partitions loaded.
pub fn write_comparison<S: AsRef<str>>(
    store: &LedgerStore,
    labels: &[S],
) -> Result<ComparisonReport> {
    let comparison = compare(store, labels);
    if comparison.labels.len() < 2 {
        tracing::info!(
            "Comparison needs at least two partitions, found {}; report not written",
            comparison.labels.len()
        );
        return Ok(ComparisonReport {
            comparison,
            written_to: None,
        });
    }

    let root = store.config().reports_root();
    std::fs::create_dir_all(root).map_err(|err| crate::errors::LedgerError::io(root, err))?;
    let path = store.config().comparison_path();
    write_atomic(&path, render_comparison(&comparison).as_bytes())?;
    tracing::info!(
        "Comparison of {} partition(s) written to {:?}",
        comparison.labels.len(),
        path
    );

    Ok(ComparisonReport {
        comparison,
        written_to: Some(path),
    })
}
