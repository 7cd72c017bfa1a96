//! Metrics ledger for IDE automation test runs.
//!
//! Test harnesses hand in `(test name, metrics, partition)` after each run.
//! The ledger keeps one CSV table per partition (usually one per product
//! version), keyed by test name, re-renders the partition's HTML report on
//! every write, and can compare partitions against each other.
//!
//! ```no_run
//! use metrics_ledger::{LedgerStore, MetricValue, Metrics};
//!
//! let store = LedgerStore::open("build/reports/metrics");
//! let metrics = Metrics::from([("ExecutionTimeMs".to_string(), MetricValue::Integer(48_211))]);
//! store.upsert(Some("2024.3"), "testCreateDataClassFile", &metrics)?;
//! metrics_ledger::compare::write_comparison(&store, &["2024.3", "2025.1"])?;
//! # Ok::<(), metrics_ledger::LedgerError>(())
//! ```

pub mod compare;
pub mod config;
pub mod errors;
pub mod import;
pub mod lock;
pub mod recorder;
pub mod render;
pub mod schema;
pub mod store;
pub mod table;
pub mod value;

pub use config::LedgerConfig;
pub use errors::{LedgerError, Result};
pub use recorder::{record_best_effort, TestTimer};
pub use schema::{MetricKind, MetricName, CANONICAL_METRICS, KEY_METRICS};
pub use store::{LedgerStore, UpsertOutcome};
pub use table::{Row, Table};
pub use value::{MetricValue, Metrics};

#[doc(hidden)]
pub mod test_utils {
    use std::sync::Mutex;
    /// Global mutex for tests that mutate environment variables.
    pub static ENV_MUTEX: Mutex<()> = Mutex::new(());
}
