//! Import of `name,value` metric files.
//!
//! The IDE telemetry collector dumps one metric per line, without a header:
//!
//! ```text
//! ExecutionTimeMs,48211
//! PeakMemoryMb,812.5
//! ```

use std::fs;
use std::path::Path;

use crate::errors::{LedgerError, Result};
use crate::schema::MetricName;
use crate::value::{MetricValue, Metrics};

/// Type a raw value by its metric's registry kind; unknown names fall back
/// to shape inference and are left for the store to drop.
pub fn typed_value(name: &str, raw: &str) -> MetricValue {
    match MetricName::lookup(name) {
        Some(metric) => MetricValue::for_metric(metric, raw),
        None => MetricValue::infer(raw),
    }
}

pub fn parse_metric_pairs(bytes: &[u8], origin: &Path) -> Result<Metrics> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut metrics = Metrics::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| LedgerError::csv(origin, err))?;
        let name = record.get(0).unwrap_or_default().trim();
        let value = record.get(1).map(str::trim).unwrap_or_default();
        if name.is_empty() || value.is_empty() {
            tracing::warn!("Ignoring line {} of {:?}: expected name,value", idx + 1, origin);
            continue;
        }
        if record.len() > 2 {
            tracing::warn!(
                "Line {} of {:?} has {} fields; only the first two are used",
                idx + 1,
                origin,
                record.len()
            );
        }
        metrics.insert(name.to_string(), typed_value(name, value));
    }
    Ok(metrics)
}

pub fn load_metric_pairs(path: &Path) -> Result<Metrics> {
    let bytes = fs::read(path).map_err(|err| LedgerError::io(path, err))?;
    parse_metric_pairs(&bytes, path)
}
