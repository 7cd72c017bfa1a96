//! Helpers for test harnesses.
//!
//! A metrics write must never decide whether a test passed. Everything here
//! logs failures and returns `None` instead of propagating them.

use chrono::{DateTime, Utc};

use crate::schema::MetricName;
use crate::store::{LedgerStore, UpsertOutcome};
use crate::value::{MetricValue, Metrics};

/// Start/end bookkeeping for one test.
#[derive(Debug, Clone)]
pub struct TestTimer {
    test_name: String,
    started_at: DateTime<Utc>,
}

impl TestTimer {
    pub fn start(test_name: impl Into<String>) -> Self {
        Self::started_at(test_name, Utc::now())
    }

    pub fn started_at(test_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            test_name: test_name.into(),
            started_at,
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Stop now and record timing plus `extra` metrics.
    pub fn finish(
        self,
        store: &LedgerStore,
        partition: Option<&str>,
        extra: Metrics,
    ) -> Option<UpsertOutcome> {
        self.finish_at(store, partition, extra, Utc::now())
    }

    pub fn finish_at(
        self,
        store: &LedgerStore,
        partition: Option<&str>,
        extra: Metrics,
        ended_at: DateTime<Utc>,
    ) -> Option<UpsertOutcome> {
        let mut metrics = extra;
        metrics.extend(timing_metrics(self.started_at, ended_at));
        record_best_effort(store, partition, &self.test_name, &metrics)
    }
}

/// `ExecutionTimeMs`, `TestStartTime` and `TestEndTime` for a run.
pub fn timing_metrics(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Metrics {
    let elapsed_ms = (ended_at - started_at).num_milliseconds();
    Metrics::from([
        (
            MetricName::ExecutionTimeMs.to_string(),
            MetricValue::Integer(elapsed_ms),
        ),
        (
            MetricName::TestStartTime.to_string(),
            MetricValue::timestamp(started_at),
        ),
        (
            MetricName::TestEndTime.to_string(),
            MetricValue::timestamp(ended_at),
        ),
    ])
}

/// Upsert and swallow any error after logging it.
pub fn record_best_effort(
    store: &LedgerStore,
    partition: Option<&str>,
    test_name: &str,
    metrics: &Metrics,
) -> Option<UpsertOutcome> {
    match store.upsert(partition, test_name, metrics) {
        Ok(outcome) => {
            tracing::info!(
                "Metrics for {:?} written to {:?}",
                test_name,
                outcome.partition_file
            );
            Some(outcome)
        }
        Err(err) => {
            tracing::error!(
                "Failed to record metrics for {:?} (partition {:?}): {}",
                test_name,
                partition,
                err
            );
            None
        }
    }
}
