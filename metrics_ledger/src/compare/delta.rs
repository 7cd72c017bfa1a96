use std::fmt;

use serde::Serialize;

use crate::value::MetricValue;

/// Direction of a change. Lower is better for every compared metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improvement,
    Regression,
    Neutral,
}

impl Trend {
    pub fn css_class(self) -> &'static str {
        match self {
            Trend::Improvement => "improvement",
            Trend::Regression => "regression",
            Trend::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// Change from the first partition's value to the last one's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
    pub first: f64,
    pub last: f64,
    pub change: f64,
    /// `None` when the first value is zero.
    pub percent: Option<f64>,
    pub trend: Trend,
}

impl Delta {
    pub fn between(first: f64, last: f64) -> Self {
        let change = last - first;
        let percent = if first == 0.0 {
            None
        } else {
            Some(change / first * 100.0)
        };
        let trend = if change < 0.0 {
            Trend::Improvement
        } else if change > 0.0 {
            Trend::Regression
        } else {
            Trend::Neutral
        };
        Self {
            first,
            last,
            change,
            percent,
            trend,
        }
    }

    /// Delta between the first and last entries. Unavailable when either end
    /// is missing or not a number.
    pub fn across(values: &[Option<&MetricValue>]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let first = values.first()?.as_ref()?.as_f64()?;
        let last = values.last()?.as_ref()?.as_f64()?;
        Some(Self::between(first, last))
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent {
            Some(percent) => write!(f, "{:+.2} ({:+.2}%)", self.change, percent),
            None => write!(f, "{:+.2} (N/A)", self.change),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn delta__increase__then_regression_with_percent() {
        let delta = Delta::between(100.0, 150.0);
        assert_eq!(delta.trend, Trend::Regression);
        assert_eq!(delta.to_string(), "+50.00 (+50.00%)");
    }

    #[test]
    fn delta__decrease__then_improvement() {
        let delta = Delta::between(200.0, 150.0);
        assert_eq!(delta.trend, Trend::Improvement);
        assert_eq!(delta.to_string(), "-50.00 (-25.00%)");
    }

    #[test]
    fn delta__unchanged__then_neutral() {
        let delta = Delta::between(42.0, 42.0);
        assert_eq!(delta.trend, Trend::Neutral);
        assert_eq!(delta.to_string(), "+0.00 (+0.00%)");
    }

    #[test]
    fn delta__first_zero__then_percent_unavailable() {
        let delta = Delta::between(0.0, 10.0);
        assert_eq!(delta.change, 10.0);
        assert!(delta.percent.is_none());
        assert_eq!(delta.trend, Trend::Regression);
        assert_eq!(delta.to_string(), "+10.00 (N/A)");
    }

    #[test]
    fn delta__across_missing_or_text_end__then_none() {
        let hundred = MetricValue::Integer(100);
        let text = MetricValue::Text("timeout".into());

        assert!(Delta::across(&[None, Some(&hundred)]).is_none());
        assert!(Delta::across(&[Some(&hundred), None]).is_none());
        assert!(Delta::across(&[Some(&text), Some(&hundred)]).is_none());
        assert!(Delta::across(&[Some(&hundred)]).is_none());

        let middle_missing = Delta::across(&[Some(&hundred), None, Some(&hundred)]).unwrap();
        assert_eq!(middle_missing.trend, Trend::Neutral);
    }
}
