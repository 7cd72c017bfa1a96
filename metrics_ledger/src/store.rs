//! Partitioned metrics ledger.
//!
//! Each partition is a directory holding `test_metrics.csv` and its rendered
//! `metrics.html`. The default partition lives directly in the reports root;
//! a labelled partition (usually a product version) lives in
//! `<root>/<label>/`.
//!
//! Every mutation runs read-modify-write-render under the partition's lock
//! (see [`crate::lock`]). Locks are per process only.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::{LedgerConfig, REPORT_FILE, TABLE_FILE};
use crate::errors::{LedgerError, Result};
use crate::lock::{self, PartitionLocks};
use crate::render::render_table;
use crate::schema::MetricName;
use crate::table::{write_atomic, Table};
use crate::value::Metrics;

/// What an upsert did, for callers that want to report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub partition_file: PathBuf,
    /// `None` when the table was saved but its report could not be written.
    pub report_file: Option<PathBuf>,
    /// A new row was appended rather than merged.
    pub inserted: bool,
    /// The header was rebuilt before merging.
    pub migrated: bool,
    /// Incoming metric names unknown to the registry.
    pub dropped: Vec<String>,
    /// Legacy columns discarded by the migration, with their stored values.
    pub lost_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    config: LedgerConfig,
    locks: &'static PartitionLocks,
}

impl LedgerStore {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            locks: lock::global(),
        }
    }

    pub fn open(reports_root: impl Into<PathBuf>) -> Self {
        Self::new(LedgerConfig::new(reports_root))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Directory of a partition, without touching the filesystem.
    pub fn partition_dir(&self, partition: Option<&str>) -> Result<PathBuf> {
        match partition {
            None => Ok(self.config.reports_root.clone()),
            Some(label) => {
                validate_label(label)?;
                Ok(self.config.reports_root.join(label))
            }
        }
    }

    pub fn table_path(&self, partition: Option<&str>) -> Result<PathBuf> {
        Ok(self.partition_dir(partition)?.join(TABLE_FILE))
    }

    pub fn report_path(&self, partition: Option<&str>) -> Result<PathBuf> {
        Ok(self.partition_dir(partition)?.join(REPORT_FILE))
    }

    /// Create the partition directory and return the canonical path of its
    /// table file, which keys the partition lock.
    fn resolve_table_path(&self, partition: Option<&str>) -> Result<PathBuf> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir).map_err(|err| LedgerError::io(&dir, err))?;
        let dir = fs::canonicalize(&dir).map_err(|err| LedgerError::io(&dir, err))?;
        Ok(dir.join(TABLE_FILE))
    }

    /// Insert or merge the row for `test_name` in `partition`, then re-render
    /// the partition report.
    ///
    /// The row key is `test_name` with surrounding whitespace removed, the
    /// same form table loading uses, so `" A"` and `"A"` address one row.
    ///
    /// Names absent from the registry are logged and dropped. When a known
    /// name is missing from the file's header, the header is rebuilt from the
    /// registry, moving existing values by column name, and saved together
    /// with the merge in one write.
    ///
    /// The table file is the commit point: any error before it is saved
    /// leaves the file as it was. A report that fails to render afterwards
    /// is logged and surfaces as `report_file: None`.
    pub fn upsert(
        &self,
        partition: Option<&str>,
        test_name: &str,
        metrics: &Metrics,
    ) -> Result<UpsertOutcome> {
        let test_name = test_name.trim();
        if test_name.is_empty() {
            return Err(LedgerError::EmptyTestName);
        }
        let table_path = self.resolve_table_path(partition)?;
        let _guard = self.locks.acquire(&table_path);

        let mut table = Table::load(&table_path)?.unwrap_or_default();

        let mut known: Vec<(MetricName, String)> = Vec::with_capacity(metrics.len());
        let mut dropped = Vec::new();
        for (name, value) in metrics {
            match MetricName::lookup(name.trim()) {
                Some(metric) => known.push((metric, value.to_cell())),
                None => {
                    tracing::warn!(
                        "Dropping unknown metric {:?} for {:?} in {:?}",
                        name,
                        test_name,
                        table_path
                    );
                    dropped.push(name.clone());
                }
            }
        }

        let migrated = known
            .iter()
            .any(|(metric, _)| table.column_index(metric.as_str()).is_none());
        let mut lost_columns = Vec::new();
        if migrated {
            lost_columns = table.migrate_to_canonical();
            if !lost_columns.is_empty() {
                tracing::warn!(
                    "Migration of {:?} dropped non-canonical columns {:?}",
                    table_path,
                    lost_columns
                );
            }
            tracing::info!("Migrating {:?} to the canonical header", table_path);
        }

        let updates: Vec<(usize, String)> = known
            .into_iter()
            .filter_map(|(metric, text)| {
                table
                    .column_index(metric.as_str())
                    .map(|idx| (idx, text))
            })
            .collect();
        let inserted = table.upsert(test_name, &updates);
        table.save(&table_path)?;

        let report_file = match self.write_report(&table_path, &table, partition) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(
                    "Saved {:?} but could not write its report: {}",
                    table_path,
                    err
                );
                None
            }
        };
        tracing::debug!(
            "{} {:?} in {:?} ({} metric(s))",
            if inserted { "Inserted" } else { "Updated" },
            test_name,
            table_path,
            updates.len()
        );

        Ok(UpsertOutcome {
            partition_file: table_path,
            report_file,
            inserted,
            migrated,
            dropped,
            lost_columns,
        })
    }

    /// Regenerate a partition's report from its current table.
    pub fn render(&self, partition: Option<&str>) -> Result<PathBuf> {
        let table_path = self.resolve_table_path(partition)?;
        let _guard = self.locks.acquire(&table_path);
        let table = Table::load(&table_path)?.unwrap_or_default();
        self.write_report(&table_path, &table, partition)
    }

    fn write_report(
        &self,
        table_path: &Path,
        table: &Table,
        partition: Option<&str>,
    ) -> Result<PathBuf> {
        let report_path = table_path.with_file_name(REPORT_FILE);
        let title = match partition {
            Some(label) => format!("Test Metrics - {}", label),
            None => "Test Metrics".to_string(),
        };
        write_atomic(&report_path, render_table(table, &title).as_bytes())?;
        Ok(report_path)
    }

    /// Current table of a partition, read without locking.
    pub fn load(&self, partition: Option<&str>) -> Result<Option<Table>> {
        Table::load(&self.table_path(partition)?)
    }

    /// Labels of all partitions under the root that hold a table, sorted.
    pub fn partitions(&self) -> Result<Vec<String>> {
        let root = &self.config.reports_root;
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut labels = Vec::new();
        for entry in fs::read_dir(root).map_err(|err| LedgerError::io(root, err))? {
            let entry = entry.map_err(|err| LedgerError::io(root, err))?;
            let path = entry.path();
            if !path.is_dir() || !path.join(TABLE_FILE).is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(label) => labels.push(label),
                Err(name) => tracing::warn!("Skipping non UTF-8 partition directory {:?}", name),
            }
        }
        labels.sort();
        Ok(labels)
    }
}

/// A label must name exactly one directory below the reports root.
fn validate_label(label: &str) -> Result<()> {
    let invalid = || LedgerError::InvalidPartition(label.to_string());
    if label.trim().is_empty() || label != label.trim() || label.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(label).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::value::MetricValue;
    use tempfile::TempDir;

    fn metrics(pairs: &[(&str, MetricValue)]) -> Metrics {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn store__labels__then_validated() {
        assert!(validate_label("2024.3").is_ok());
        assert!(validate_label("IC-243.21565").is_ok());
        for bad in ["", " ", "..", ".", "a/b", "a\\b", "/abs", " v1"] {
            assert!(
                matches!(validate_label(bad), Err(LedgerError::InvalidPartition(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn store__partition_dir__then_default_is_root() {
        let store = LedgerStore::open("/data/reports");
        assert_eq!(store.partition_dir(None).unwrap(), PathBuf::from("/data/reports"));
        assert_eq!(
            store.table_path(Some("2024.3")).unwrap(),
            PathBuf::from("/data/reports/2024.3/test_metrics.csv")
        );
    }

    #[test]
    fn store__empty_test_name__then_rejected_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());
        let err = store
            .upsert(None, "  ", &metrics(&[("ExecutionTimeMs", 1i64.into())]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyTestName));
        assert!(!dir.path().join(TABLE_FILE).exists());
    }

    #[test]
    fn store__padded_test_name__then_same_row_as_trimmed() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());

        store
            .upsert(None, "A", &metrics(&[("ExecutionTimeMs", 1i64.into())]))
            .unwrap();
        let outcome = store
            .upsert(None, "  A ", &metrics(&[("StartupTimeMs", 2i64.into())]))
            .unwrap();

        assert!(!outcome.inserted);
        let table = store.load(None).unwrap().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].test_name, "A");
        assert_eq!(table.cell("A", "StartupTimeMs"), Some("2"));
    }

    #[test]
    fn store__unknown_metric__then_dropped_and_reported() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());

        let outcome = store
            .upsert(
                None,
                "testOpenProject",
                &metrics(&[
                    ("ExecutionTimeMs", 1200i64.into()),
                    ("GcPauseMs", 15i64.into()),
                ]),
            )
            .unwrap();

        assert_eq!(outcome.dropped, vec!["GcPauseMs".to_string()]);
        assert!(outcome.inserted);
        assert!(!outcome.migrated);
        let table = store.load(None).unwrap().unwrap();
        assert!(table.is_canonical());
        assert_eq!(table.cell("testOpenProject", "ExecutionTimeMs"), Some("1200"));
    }

    #[test]
    fn store__partitions__then_sorted_dirs_with_tables_only() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());
        let m = metrics(&[("ExecutionTimeMs", 1i64.into())]);
        store.upsert(Some("2025.1"), "A", &m).unwrap();
        store.upsert(Some("2024.3"), "A", &m).unwrap();
        store.upsert(None, "A", &m).unwrap();
        fs::create_dir_all(dir.path().join("scratch")).unwrap();

        assert_eq!(store.partitions().unwrap(), vec!["2024.3", "2025.1"]);
    }

    #[test]
    fn store__partitions_missing_root__then_empty() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path().join("nope"));
        assert!(store.partitions().unwrap().is_empty());
    }
}
