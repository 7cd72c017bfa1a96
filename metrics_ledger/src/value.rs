//! Typed metric values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::schema::{MetricKind, MetricName};

/// Metrics handed to the ledger for one test, keyed by metric name.
///
/// Keys are plain strings so that names unknown to the registry can still be
/// reported back to the caller instead of being rejected at compile time.
pub type Metrics = BTreeMap<String, MetricValue>;

/// A single measurement. Stored in the ledger as its textual form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// RFC 3339 text.
    Timestamp(String),
}

impl MetricValue {
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        MetricValue::Timestamp(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Interpret stored text using the kind the registry declares for the column.
    ///
    /// Text that does not fit a numeric kind is kept verbatim as `Text`.
    pub fn parse_as(kind: MetricKind, raw: &str) -> Self {
        let trimmed = raw.trim();
        match kind {
            MetricKind::Integer => {
                if let Ok(value) = trimmed.parse::<i64>() {
                    MetricValue::Integer(value)
                } else if let Some(value) = parse_finite(trimmed) {
                    MetricValue::Float(value)
                } else {
                    MetricValue::Text(raw.to_string())
                }
            }
            MetricKind::Float => match parse_finite(trimmed) {
                Some(value) => MetricValue::Float(value),
                None => MetricValue::Text(raw.to_string()),
            },
            MetricKind::Timestamp => MetricValue::Timestamp(trimmed.to_string()),
            MetricKind::Text => MetricValue::Text(raw.to_string()),
        }
    }

    /// Value for `metric`, typed by the registry.
    pub fn for_metric(metric: MetricName, raw: &str) -> Self {
        Self::parse_as(metric.kind(), raw)
    }

    /// Shape-based fallback for columns the registry does not describe:
    /// a decimal point means float, otherwise integer, otherwise text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.contains('.') {
            if let Some(value) = parse_finite(trimmed) {
                return MetricValue::Float(value);
            }
        } else if let Ok(value) = trimmed.parse::<i64>() {
            return MetricValue::Integer(value);
        }
        MetricValue::Text(raw.to_string())
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Integer(_) => MetricKind::Integer,
            MetricValue::Float(_) => MetricKind::Float,
            MetricValue::Text(_) => MetricKind::Text,
            MetricValue::Timestamp(_) => MetricKind::Timestamp,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(value) => Some(*value as f64),
            MetricValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_cell(&self) -> String {
        self.to_string()
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(value) => write!(f, "{}", value),
            MetricValue::Float(value) => write!(f, "{}", value),
            MetricValue::Text(value) | MetricValue::Timestamp(value) => f.write_str(value),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

impl From<DateTime<Utc>> for MetricValue {
    fn from(value: DateTime<Utc>) -> Self {
        MetricValue::timestamp(value)
    }
}
