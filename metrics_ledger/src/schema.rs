//! Canonical metric registry.
//!
//! The registry is the single source of truth for the ledger's column order
//! and width. Every metric also declares the kind of value it carries, so
//! readers never have to guess a number from the shape of its text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the key column that identifies a row.
pub const TEST_NAME_COLUMN: &str = "TestName";

/// Kind of value a metric column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Integer,
    Float,
    Text,
    Timestamp,
}

impl MetricKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, MetricKind::Integer | MetricKind::Float)
    }
}

/// A recognized metric. Declaration order is the canonical column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MetricName {
    ExecutionTimeMs,
    UsedMemoryMb,
    TotalMemoryMb,
    PeakMemoryMb,
    CpuUsagePercent,
    IndexingTimeMs,
    IndexedFilesCount,
    StartupTimeMs,
    AppInitTimeMs,
    ProjectOpenTimeMs,
    GitCloneTimeMs,
    UiFreezeTimeMs,
    UiFreezeCount,
    TestStartTime,
    TestEndTime,
}

/// Canonical metric order.
pub const CANONICAL_METRICS: [MetricName; 15] = [
    MetricName::ExecutionTimeMs,
    MetricName::UsedMemoryMb,
    MetricName::TotalMemoryMb,
    MetricName::PeakMemoryMb,
    MetricName::CpuUsagePercent,
    MetricName::IndexingTimeMs,
    MetricName::IndexedFilesCount,
    MetricName::StartupTimeMs,
    MetricName::AppInitTimeMs,
    MetricName::ProjectOpenTimeMs,
    MetricName::GitCloneTimeMs,
    MetricName::UiFreezeTimeMs,
    MetricName::UiFreezeCount,
    MetricName::TestStartTime,
    MetricName::TestEndTime,
];

/// Curated subset shown in the comparison summary and charts.
pub const KEY_METRICS: [MetricName; 5] = [
    MetricName::ExecutionTimeMs,
    MetricName::StartupTimeMs,
    MetricName::GitCloneTimeMs,
    MetricName::IndexingTimeMs,
    MetricName::PeakMemoryMb,
];

const IMPROVABLE_TOKENS: [&str; 4] = ["Time", "Ms", "Duration", "Memory"];

impl MetricName {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::ExecutionTimeMs => "ExecutionTimeMs",
            MetricName::UsedMemoryMb => "UsedMemoryMb",
            MetricName::TotalMemoryMb => "TotalMemoryMb",
            MetricName::PeakMemoryMb => "PeakMemoryMb",
            MetricName::CpuUsagePercent => "CpuUsagePercent",
            MetricName::IndexingTimeMs => "IndexingTimeMs",
            MetricName::IndexedFilesCount => "IndexedFilesCount",
            MetricName::StartupTimeMs => "StartupTimeMs",
            MetricName::AppInitTimeMs => "AppInitTimeMs",
            MetricName::ProjectOpenTimeMs => "ProjectOpenTimeMs",
            MetricName::GitCloneTimeMs => "GitCloneTimeMs",
            MetricName::UiFreezeTimeMs => "UiFreezeTimeMs",
            MetricName::UiFreezeCount => "UiFreezeCount",
            MetricName::TestStartTime => "TestStartTime",
            MetricName::TestEndTime => "TestEndTime",
        }
    }

    pub fn kind(self) -> MetricKind {
        match self {
            MetricName::UsedMemoryMb
            | MetricName::TotalMemoryMb
            | MetricName::PeakMemoryMb
            | MetricName::CpuUsagePercent => MetricKind::Float,
            MetricName::TestStartTime | MetricName::TestEndTime => MetricKind::Timestamp,
            _ => MetricKind::Integer,
        }
    }

    /// Position of this metric's cell within a canonical row (key excluded).
    pub fn column_index(self) -> usize {
        self as usize
    }

    pub fn lookup(name: &str) -> Option<MetricName> {
        CANONICAL_METRICS
            .iter()
            .copied()
            .find(|metric| metric.as_str() == name)
    }

    pub fn is_key_metric(self) -> bool {
        KEY_METRICS.contains(&self)
    }

    /// Numeric metric whose name marks it as a duration or a memory figure.
    /// Lower is better for all of them.
    pub fn is_improvable(self) -> bool {
        self.kind().is_numeric() && is_improvable_name(self.as_str())
    }
}

/// Name-only half of [`MetricName::is_improvable`], also used for columns the
/// registry does not know.
pub fn is_improvable_name(name: &str) -> bool {
    IMPROVABLE_TOKENS.iter().any(|token| name.contains(token))
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::lookup(s.trim()).ok_or_else(|| format!("unknown metric name: {}", s))
    }
}

/// `["TestName"]` followed by every canonical metric name.
pub fn canonical_header() -> Vec<String> {
    std::iter::once(TEST_NAME_COLUMN.to_string())
        .chain(CANONICAL_METRICS.iter().map(|m| m.as_str().to_string()))
        .collect()
}
