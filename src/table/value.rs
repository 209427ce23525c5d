//! Cell values and per-column aggregation functions.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn zero() -> Self {
        Value::Number(0.0)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::zero()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// How several cells of one column collapse into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    #[default]
    Sum,
    Mean,
    Min,
    Max,
    /// Representative value: the first row wins
    First,
    Count,
}

impl AggFn {
    /// Collapse `values` (in row order)
    ///
    /// Numeric functions fall back to `First` when the column holds no
    /// numbers (e.g. a text column aggregated with the metric default).
    pub fn apply(self, values: &[&Value]) -> Value {
        let first = || values.first().map(|v| (*v).clone()).unwrap_or_default();
        let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
        let result = match self {
            AggFn::First => return first(),
            AggFn::Count => values.len() as f64,
            _ if numbers.is_empty() => return first(),
            AggFn::Sum => numbers.iter().sum(),
            AggFn::Mean => numbers.iter().sum::<f64>() / numbers.len() as f64,
            AggFn::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
            AggFn::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Value::Number(result)
    }
}

/// Per-column choice of [`AggFn`] used when rows collapse
///
/// Metric columns default to `metric_default` (sum), every other column to
/// `other_default` (first value wins). `overrides` pins individual columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPolicy {
    #[serde(default)]
    pub metric_default: AggFn,

    #[serde(default = "default_other")]
    pub other_default: AggFn,

    #[serde(default)]
    pub overrides: HashMap<String, AggFn>,
}

fn default_other() -> AggFn {
    AggFn::First
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        Self {
            metric_default: AggFn::Sum,
            other_default: AggFn::First,
            overrides: HashMap::new(),
        }
    }
}

impl ColumnPolicy {
    pub fn new(metric_default: AggFn) -> Self {
        Self {
            metric_default,
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: impl Into<String>, agg: AggFn) -> Self {
        self.overrides.insert(column.into(), agg);
        self
    }

    pub fn resolve(&self, column: &str, is_metric: bool) -> AggFn {
        if let Some(agg) = self.overrides.get(column) {
            return *agg;
        }
        if is_metric {
            self.metric_default
        } else {
            self.other_default
        }
    }

    /// Resolve one function per column, in column order
    pub fn resolve_all(&self, columns: &[String], metrics: &[String]) -> Vec<AggFn> {
        let metrics: HashSet<&str> = metrics.iter().map(String::as_str).collect();
        columns
            .iter()
            .map(|c| self.resolve(c, metrics.contains(c.as_str())))
            .collect()
    }
}
