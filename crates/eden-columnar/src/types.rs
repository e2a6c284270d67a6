#![forbid(unsafe_code)]

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable identity of a column within a table.
///
/// Ids survive renames and reorders; positional indices do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(u32);

impl ColumnId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    #[default]
    Double,
    Temporal,
    Categorical,
    /// A derived pair of numeric values (x, y).
    Bivariate,
}

impl ColumnType {
    /// Double and temporal columns have a continuous numeric axis.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Double | Self::Temporal)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Double(f64),
    Temporal(NaiveDateTime),
    Category(Arc<str>),
    Pair(f64, f64),
    Missing,
}

impl Value {
    /// `Missing` and NaN doubles are both treated as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Double(v) => v.is_nan(),
            Value::Pair(x, y) => x.is_nan() || y.is_nan(),
            _ => false,
        }
    }

    /// Position of the value on a numeric axis, if it has one.
    pub fn as_axis(&self) -> Option<f64> {
        match self {
            Value::Double(v) if !v.is_nan() => Some(*v),
            Value::Temporal(t) => Some(temporal_to_axis(*t)),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Value::Category(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Temporal(_) => "temporal",
            Value::Category(_) => "category",
            Value::Pair(..) => "pair",
            Value::Missing => "missing",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Temporal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Category(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Category(Arc::from(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{v}"),
            Value::Temporal(t) => write!(f, "{t}"),
            Value::Category(s) => f.write_str(s),
            Value::Pair(x, y) => write!(f, "({x}, {y})"),
            Value::Missing => f.write_str("<missing>"),
        }
    }
}

/// Map a timestamp onto the numeric axis used for binning and summaries (UTC epoch millis).
pub fn temporal_to_axis(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp_millis() as f64
}

/// Inverse of [`temporal_to_axis`]; fractional milliseconds are truncated.
pub fn axis_to_temporal(axis: f64) -> Option<NaiveDateTime> {
    if !axis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(axis as i64).map(|dt| dt.naive_utc())
}
