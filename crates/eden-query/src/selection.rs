use crate::error::{TableError, TableResult};
use chrono::NaiveDateTime;
use eden_columnar::{BitVec, Column, ColumnId, ColumnType, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The constraint a brush places on its column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionBounds {
    /// Inclusive `[min, max]` on a double column.
    DoubleRange { min: f64, max: f64 },
    /// Inclusive `[start, end]` on a temporal column.
    TemporalRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Set of selected categories on a categorical column. An empty set matches nothing.
    Categories(BTreeSet<String>),
}

impl SelectionBounds {
    fn kind_name(&self) -> &'static str {
        match self {
            SelectionBounds::DoubleRange { .. } => "double",
            SelectionBounds::TemporalRange { .. } => "temporal",
            SelectionBounds::Categories(_) => "categorical",
        }
    }
}

/// A brush on one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    column: ColumnId,
    bounds: SelectionBounds,
}

impl ColumnSelection {
    pub fn new(column: ColumnId, bounds: SelectionBounds) -> Self {
        Self { column, bounds }
    }

    pub fn double_range(column: ColumnId, min: f64, max: f64) -> Self {
        Self::new(column, SelectionBounds::DoubleRange { min, max })
    }

    pub fn temporal_range(column: ColumnId, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(column, SelectionBounds::TemporalRange { start, end })
    }

    pub fn categories<I, S>(column: ColumnId, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = categories.into_iter().map(Into::into).collect();
        Self::new(column, SelectionBounds::Categories(set))
    }

    pub fn column(&self) -> ColumnId {
        self.column
    }

    pub fn bounds(&self) -> &SelectionBounds {
        &self.bounds
    }

    /// Whether a single value satisfies this brush. Missing values never do.
    pub fn contains(&self, value: &Value) -> bool {
        match (&self.bounds, value) {
            (SelectionBounds::DoubleRange { min, max }, Value::Double(v)) => {
                *min <= *v && *v <= *max
            }
            (SelectionBounds::TemporalRange { start, end }, Value::Temporal(t)) => {
                start <= t && t <= end
            }
            (SelectionBounds::Categories(set), Value::Category(c)) => set.contains(c.as_ref()),
            _ => false,
        }
    }

    /// Check this selection against its column and clamp ranges to the column's values.
    pub(crate) fn validated(self, column: &Column) -> TableResult<ColumnSelection> {
        if !column.is_enabled() {
            return Err(TableError::ColumnDisabled {
                column: column.name().to_string(),
            });
        }
        let expected = match &self.bounds {
            SelectionBounds::DoubleRange { .. } => ColumnType::Double,
            SelectionBounds::TemporalRange { .. } => ColumnType::Temporal,
            SelectionBounds::Categories(_) => ColumnType::Categorical,
        };
        if column.column_type() != expected {
            return Err(TableError::TypeMismatch {
                column: column.name().to_string(),
                expected: self.bounds.kind_name(),
                actual: column.column_type(),
            });
        }

        let domain = column
            .statistics()
            .as_numeric()
            .and_then(|stats| stats.range());
        let bounds = match self.bounds {
            SelectionBounds::DoubleRange { min, max } => {
                let (lo, hi) = clamp_range(column, min, max, domain)?;
                SelectionBounds::DoubleRange { min: lo, max: hi }
            }
            SelectionBounds::TemporalRange { start, end } => {
                let (s, e) = (
                    eden_columnar::temporal_to_axis(start),
                    eden_columnar::temporal_to_axis(end),
                );
                if start > end {
                    return Err(TableError::InvalidRange {
                        column: column.name().to_string(),
                        min: s,
                        max: e,
                    });
                }
                // The millisecond axis truncates, so check and narrow against the stored
                // timestamps instead.
                match temporal_extent(column) {
                    Some((lo, hi)) if end >= lo && start <= hi => {
                        SelectionBounds::TemporalRange {
                            start: start.max(lo),
                            end: end.min(hi),
                        }
                    }
                    _ => {
                        return Err(TableError::RangeOutsideDomain {
                            column: column.name().to_string(),
                            min: s,
                            max: e,
                        })
                    }
                }
            }
            SelectionBounds::Categories(set) => {
                if set.is_empty() {
                    return Err(TableError::EmptyCategorySelection {
                        column: column.name().to_string(),
                    });
                }
                if let Some(unknown) = set.iter().find(|c| column.category_index(c).is_none()) {
                    return Err(TableError::UnknownCategory {
                        column: column.name().to_string(),
                        category: unknown.clone(),
                    });
                }
                SelectionBounds::Categories(set)
            }
        };

        Ok(ColumnSelection {
            column: self.column,
            bounds,
        })
    }

    /// One bit per tuple: set where the column's value satisfies this brush.
    pub(crate) fn membership(&self, column: &Column) -> BitVec {
        let len = column.len();
        match &self.bounds {
            SelectionBounds::DoubleRange { min, max } => BitVec::from_fn(len, |row| {
                column
                    .axis_value(row)
                    .is_some_and(|v| *min <= v && v <= *max)
            }),
            SelectionBounds::TemporalRange { start, end } => BitVec::from_fn(len, |row| {
                column
                    .temporal_value(row)
                    .is_some_and(|t| *start <= t && t <= *end)
            }),
            SelectionBounds::Categories(set) => {
                let allowed: Vec<bool> = column
                    .categories()
                    .iter()
                    .map(|c| set.contains(c.as_ref()))
                    .collect();
                BitVec::from_fn(len, |row| {
                    column
                        .category_code(row)
                        .is_some_and(|code| allowed.get(code as usize).copied().unwrap_or(false))
                })
            }
        }
    }
}

/// Earliest and latest stored timestamp of a temporal column.
fn temporal_extent(column: &Column) -> Option<(NaiveDateTime, NaiveDateTime)> {
    (0..column.len())
        .filter_map(|row| column.temporal_value(row))
        .fold(None, |extent, t| match extent {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
}

/// Order-check a numeric range and narrow it to the column's overall `[min, max]`.
fn clamp_range(
    column: &Column,
    min: f64,
    max: f64,
    domain: Option<(f64, f64)>,
) -> TableResult<(f64, f64)> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(TableError::InvalidRange {
            column: column.name().to_string(),
            min,
            max,
        });
    }
    let outside = TableError::RangeOutsideDomain {
        column: column.name().to_string(),
        min,
        max,
    };
    let Some((lo, hi)) = domain else {
        return Err(outside);
    };
    if max < lo || min > hi {
        return Err(outside);
    }
    Ok((min.max(lo), max.min(hi)))
}
