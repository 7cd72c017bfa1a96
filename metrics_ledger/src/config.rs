//! Reports directory configuration.

use std::path::{Path, PathBuf};

/// Environment variable overriding the reports root.
pub const REPORTS_DIR_ENV: &str = "METRICS_LEDGER_DIR";

/// Reports root used when nothing else is configured, relative to the
/// working directory of the test runner.
pub const DEFAULT_REPORTS_DIR: &str = "build/reports/metrics";

/// Per-partition table file name.
pub const TABLE_FILE: &str = "test_metrics.csv";

/// Per-partition HTML report file name.
pub const REPORT_FILE: &str = "metrics.html";

/// Cross-partition report file name, written at the reports root.
pub const COMPARISON_FILE: &str = "metrics_comparison.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub reports_root: PathBuf,
}

impl LedgerConfig {
    pub fn new(reports_root: impl Into<PathBuf>) -> Self {
        Self {
            reports_root: reports_root.into(),
        }
    }

    /// `$METRICS_LEDGER_DIR` when set and non-empty, else the default root.
    pub fn from_env() -> Self {
        match std::env::var(REPORTS_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::default(),
        }
    }

    pub fn comparison_path(&self) -> PathBuf {
        self.reports_root.join(COMPARISON_FILE)
    }

    pub fn reports_root(&self) -> &Path {
        &self.reports_root
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPORTS_DIR)
    }
}
