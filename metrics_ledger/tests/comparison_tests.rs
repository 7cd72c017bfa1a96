use std::fs;

use metrics_ledger::compare::{self, ColumnKey, Trend};
use metrics_ledger::{LedgerStore, MetricName, MetricValue, Metrics, KEY_METRICS};
use tempfile::TempDir;

fn metrics(pairs: &[(&str, MetricValue)]) -> Metrics {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn summary_row(comparison: &compare::Comparison, metric: MetricName) -> &compare::SummaryRow {
    comparison
        .summary
        .iter()
        .find(|row| row.metric == metric)
        .expect("summary row")
}

#[test]
fn comparison_reports_regression_between_versions() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    store
        .upsert(Some("v1"), "X", &metrics(&[("ExecutionTimeMs", 100i64.into())]))
        .unwrap();
    store
        .upsert(Some("v2"), "X", &metrics(&[("ExecutionTimeMs", 150i64.into())]))
        .unwrap();

    let comparison = compare::compare(&store, &["v2", "v1"]);

    assert_eq!(comparison.labels, vec!["v1", "v2"]);
    let row = summary_row(&comparison, MetricName::ExecutionTimeMs);
    let delta = row.delta.expect("delta");
    assert_eq!(delta.to_string(), "+50.00 (+50.00%)");
    assert_eq!(delta.trend, Trend::Regression);
    assert_eq!(comparison.summary.len(), KEY_METRICS.len());
}

#[test]
fn comparison_zero_baseline_has_no_percent() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    store
        .upsert(Some("a"), "X", &metrics(&[("StartupTimeMs", 0i64.into())]))
        .unwrap();
    store
        .upsert(Some("b"), "X", &metrics(&[("StartupTimeMs", 10i64.into())]))
        .unwrap();

    let comparison = compare::compare(&store, &["a", "b"]);
    let delta = summary_row(&comparison, MetricName::StartupTimeMs)
        .delta
        .expect("delta");

    assert_eq!(delta.change, 10.0);
    assert_eq!(delta.percent, None);
    assert_eq!(delta.trend, Trend::Regression);
    assert_eq!(delta.to_string(), "+10.00 (N/A)");
}

#[test]
fn comparison_summary_takes_first_row_with_value() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    // In v1 the first row has no execution time, so the second row is used.
    store
        .upsert(Some("v1"), "First", &metrics(&[("StartupTimeMs", 900i64.into())]))
        .unwrap();
    store
        .upsert(Some("v1"), "Second", &metrics(&[("ExecutionTimeMs", 200i64.into())]))
        .unwrap();
    store
        .upsert(Some("v1"), "Third", &metrics(&[("ExecutionTimeMs", 999i64.into())]))
        .unwrap();
    store
        .upsert(Some("v2"), "Third", &metrics(&[("ExecutionTimeMs", 150i64.into())]))
        .unwrap();

    let comparison = compare::compare(&store, &["v1", "v2"]);
    let row = summary_row(&comparison, MetricName::ExecutionTimeMs);

    assert_eq!(
        row.values,
        vec![Some(MetricValue::Integer(200)), Some(MetricValue::Integer(150))]
    );
    let delta = row.delta.expect("delta");
    assert_eq!(delta.trend, Trend::Improvement);
    assert_eq!(delta.to_string(), "-50.00 (-25.00%)");
}

#[test]
fn comparison_missing_side_is_not_available() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    store
        .upsert(Some("v1"), "X", &metrics(&[("PeakMemoryMb", 700.0.into())]))
        .unwrap();
    store
        .upsert(Some("v2"), "X", &metrics(&[("ExecutionTimeMs", 10i64.into())]))
        .unwrap();

    let comparison = compare::compare(&store, &["v1", "v2"]);

    let peak = summary_row(&comparison, MetricName::PeakMemoryMb);
    assert_eq!(peak.values, vec![Some(MetricValue::Float(700.0)), None]);
    assert!(peak.delta.is_none());

    let chart = comparison
        .charts
        .iter()
        .find(|chart| chart.metric == MetricName::PeakMemoryMb)
        .unwrap();
    assert_eq!(chart.values, vec![700.0, 0.0]);
}

#[test]
fn comparison_unparseable_cell_is_shown_raw_without_delta() {
    let dir = TempDir::new().unwrap();
    for (label, value) in [("v1", "timeout"), ("v2", "1500")] {
        let part = dir.path().join(label);
        fs::create_dir_all(&part).unwrap();
        fs::write(
            part.join("test_metrics.csv"),
            format!("TestName,IndexingTimeMs\nX,{}\n", value),
        )
        .unwrap();
    }
    let store = LedgerStore::open(dir.path());

    let comparison = compare::compare(&store, &["v1", "v2"]);

    let detail = &comparison.details[0];
    assert_eq!(detail.test_name, "X");
    let row = &detail.rows[0];
    assert_eq!(row.column, ColumnKey::Known(MetricName::IndexingTimeMs));
    assert_eq!(row.values[0], Some(MetricValue::Text("timeout".into())));
    assert!(row.improvable);
    assert!(row.delta.is_none());
}

#[test]
fn comparison_detail_rows_cover_every_observed_metric() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    store
        .upsert(
            Some("v1"),
            "X",
            &metrics(&[
                ("ExecutionTimeMs", 100i64.into()),
                ("IndexedFilesCount", 5000i64.into()),
            ]),
        )
        .unwrap();
    store
        .upsert(
            Some("v2"),
            "X",
            &metrics(&[
                ("ExecutionTimeMs", 80i64.into()),
                ("UsedMemoryMb", 640.0.into()),
            ]),
        )
        .unwrap();
    store
        .upsert(Some("v2"), "Y", &metrics(&[("UiFreezeCount", 1i64.into())]))
        .unwrap();

    let comparison = compare::compare(&store, &["v1", "v2"]);

    let names: Vec<_> = comparison.details.iter().map(|d| d.test_name.as_str()).collect();
    assert_eq!(names, vec!["X", "Y"]);
    let x_columns: Vec<_> = comparison.details[0]
        .rows
        .iter()
        .map(|row| row.column.name().to_string())
        .collect();
    assert_eq!(
        x_columns,
        vec!["ExecutionTimeMs", "UsedMemoryMb", "IndexedFilesCount"]
    );

    let exec = &comparison.details[0].rows[0];
    assert_eq!(exec.delta.map(|d| d.trend), Some(Trend::Improvement));
    let files = &comparison.details[0].rows[2];
    assert!(!files.improvable);
    assert!(files.delta.is_none());
}

#[test]
fn comparison_skips_missing_partition_and_writes_nothing_for_one() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    store
        .upsert(Some("v1"), "X", &metrics(&[("ExecutionTimeMs", 1i64.into())]))
        .unwrap();

    let report = compare::write_comparison(&store, &["v1", "ghost", "../up"]).unwrap();

    assert_eq!(report.comparison.labels, vec!["v1"]);
    assert_eq!(report.comparison.skipped.len(), 2);
    assert!(report.written_to.is_none());
    assert!(!dir.path().join("metrics_comparison.html").exists());
}

#[test]
fn comparison_writes_report_for_two_partitions() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path());
    for (label, ms) in [("2024.3", 100i64), ("2025.1", 150)] {
        store
            .upsert(Some(label), "X", &metrics(&[("ExecutionTimeMs", ms.into())]))
            .unwrap();
    }
    let labels = store.partitions().unwrap();

    let report = compare::write_comparison(&store, labels.as_slice()).unwrap();

    let path = report.written_to.expect("report path");
    assert_eq!(path, dir.path().join("metrics_comparison.html"));
    let html = fs::read_to_string(path).unwrap();
    assert!(html.contains("+50.00 (+50.00%)"));
    assert_eq!(html.matches("<canvas").count(), KEY_METRICS.len());

    let json = serde_json::to_value(&report.comparison).unwrap();
    assert_eq!(json["summary"][0]["metric"], "ExecutionTimeMs");
    assert_eq!(json["summary"][0]["delta"]["trend"], "regression");
}
