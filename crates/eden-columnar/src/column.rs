#![forbid(unsafe_code)]

use crate::bitmap::{scope_rows, BitVec};
use crate::error::{ColumnError, ColumnResult};
use crate::histogram::{Binning, Histogram};
use crate::stats::{CategoricalStatistics, ColumnStatistics, NumericStatistics};
use crate::types::{temporal_to_axis, ColumnId, ColumnType, Value};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Dictionary-encoded categorical storage. Categories keep first-appearance order.
#[derive(Clone, Debug, Default)]
struct Dictionary {
    categories: Vec<Arc<str>>,
    lookup: HashMap<Arc<str>, u32>,
    codes: Vec<Option<u32>>,
}

impl Dictionary {
    fn intern(&mut self, category: &Arc<str>) -> u32 {
        if let Some(&code) = self.lookup.get(category) {
            return code;
        }
        let code = self.categories.len() as u32;
        self.categories.push(category.clone());
        self.lookup.insert(category.clone(), code);
        code
    }
}

#[derive(Clone, Debug)]
enum ColumnValues {
    /// NaN marks a missing value.
    Double(Vec<f64>),
    Temporal(Vec<Option<NaiveDateTime>>),
    Categorical(Dictionary),
    Bivariate {
        x: Vec<f64>,
        y: Vec<f64>,
        sources: Option<[ColumnId; 2]>,
    },
}

impl ColumnValues {
    fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Double => Self::Double(Vec::new()),
            ColumnType::Temporal => Self::Temporal(Vec::new()),
            ColumnType::Categorical => Self::Categorical(Dictionary::default()),
            ColumnType::Bivariate => Self::Bivariate {
                x: Vec::new(),
                y: Vec::new(),
                sources: None,
            },
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Double(v) => v.len(),
            Self::Temporal(v) => v.len(),
            Self::Categorical(d) => d.codes.len(),
            Self::Bivariate { x, .. } => x.len(),
        }
    }
}

/// One variable of the table: its values for every tuple, its enabled flag and its overall
/// statistics.
///
/// The overall statistics also fix the binning used for every scoped histogram of this
/// column, so they must be refreshed whenever the value set changes.
#[derive(Clone, Debug)]
pub struct Column {
    id: ColumnId,
    name: String,
    column_type: ColumnType,
    values: ColumnValues,
    enabled: bool,
    num_bins: usize,
    statistics: ColumnStatistics,
}

impl Column {
    pub fn builder(id: ColumnId, schema: ColumnSchema) -> ColumnBuilder {
        ColumnBuilder {
            id,
            values: ColumnValues::empty(schema.column_type),
            schema,
        }
    }

    /// Derive a bivariate column pairing the numeric axes of `x` and `y` row by row.
    pub fn bivariate(
        id: ColumnId,
        name: impl Into<String>,
        x: &Column,
        y: &Column,
        num_bins: usize,
    ) -> ColumnResult<Column> {
        let name = name.into();
        for source in [x, y] {
            if !source.column_type.is_numeric() {
                return Err(ColumnError::TypeMismatch {
                    column: source.name.clone(),
                    expected: ColumnType::Double,
                    found: "non-numeric column",
                });
            }
        }
        if x.len() != y.len() {
            return Err(ColumnError::LengthMismatch {
                column: y.name.clone(),
                expected: x.len(),
                actual: y.len(),
            });
        }

        let axis = |c: &Column| -> Vec<f64> {
            (0..c.len())
                .map(|row| c.axis_value(row).unwrap_or(f64::NAN))
                .collect()
        };
        let values = ColumnValues::Bivariate {
            x: axis(x),
            y: axis(y),
            sources: Some([x.id, y.id]),
        };
        Column::finish(
            id,
            ColumnSchema::new(name, ColumnType::Bivariate),
            values,
            num_bins,
        )
    }

    fn finish(
        id: ColumnId,
        schema: ColumnSchema,
        values: ColumnValues,
        num_bins: usize,
    ) -> ColumnResult<Column> {
        if num_bins == 0 {
            return Err(ColumnError::InvalidBinCount);
        }
        let statistics = overall_statistics(&values, num_bins);
        Ok(Column {
            id,
            name: schema.name,
            column_type: schema.column_type,
            values,
            enabled: true,
            num_bins,
            statistics,
        })
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename without any uniqueness check; the owning table validates names.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn schema(&self) -> ColumnSchema {
        ColumnSchema::new(self.name.clone(), self.column_type)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Source columns of a derived bivariate column.
    pub fn bivariate_sources(&self) -> Option<[ColumnId; 2]> {
        match &self.values {
            ColumnValues::Bivariate { sources, .. } => *sources,
            _ => None,
        }
    }

    /// Overall statistics across every tuple.
    pub fn statistics(&self) -> &ColumnStatistics {
        &self.statistics
    }

    pub fn value(&self, row: usize) -> Option<Value> {
        if row >= self.len() {
            return None;
        }
        let value = match &self.values {
            ColumnValues::Double(v) if v[row].is_nan() => Value::Missing,
            ColumnValues::Double(v) => Value::Double(v[row]),
            ColumnValues::Temporal(v) => v[row].map(Value::Temporal).unwrap_or(Value::Missing),
            ColumnValues::Categorical(d) => d.codes[row]
                .map(|code| Value::Category(d.categories[code as usize].clone()))
                .unwrap_or(Value::Missing),
            ColumnValues::Bivariate { x, y, .. } if x[row].is_nan() || y[row].is_nan() => {
                Value::Missing
            }
            ColumnValues::Bivariate { x, y, .. } => Value::Pair(x[row], y[row]),
        };
        Some(value)
    }

    /// Position of a row on this column's numeric axis (double or temporal columns only).
    pub fn axis_value(&self, row: usize) -> Option<f64> {
        match &self.values {
            ColumnValues::Double(v) => v.get(row).copied().filter(|v| !v.is_nan()),
            ColumnValues::Temporal(v) => v.get(row).copied().flatten().map(temporal_to_axis),
            _ => None,
        }
    }

    pub fn temporal_value(&self, row: usize) -> Option<NaiveDateTime> {
        match &self.values {
            ColumnValues::Temporal(v) => v.get(row).copied().flatten(),
            _ => None,
        }
    }

    pub fn category_code(&self, row: usize) -> Option<u32> {
        match &self.values {
            ColumnValues::Categorical(d) => d.codes.get(row).copied().flatten(),
            _ => None,
        }
    }

    /// Known categories in insertion order; empty for non-categorical columns.
    pub fn categories(&self) -> &[Arc<str>] {
        match &self.values {
            ColumnValues::Categorical(d) => &d.categories,
            _ => &[],
        }
    }

    pub fn category_index(&self, category: &str) -> Option<u32> {
        match &self.values {
            ColumnValues::Categorical(d) => d.lookup.get(category).copied(),
            _ => None,
        }
    }

    pub fn pair(&self, row: usize) -> Option<(f64, f64)> {
        match &self.values {
            ColumnValues::Bivariate { x, y, .. } => {
                let (x, y) = (*x.get(row)?, *y.get(row)?);
                (!x.is_nan() && !y.is_nan()).then_some((x, y))
            }
            _ => None,
        }
    }

    /// Binning of this column for `bins` equal-width bins, derived from the overall range.
    ///
    /// Categorical columns always bin by category and ignore `bins`.
    pub fn binning_with(&self, bins: usize) -> ColumnResult<Binning> {
        if bins == 0 {
            return Err(ColumnError::InvalidBinCount);
        }
        match &self.statistics {
            ColumnStatistics::Double(s) | ColumnStatistics::Temporal(s) => {
                Ok(Binning::EqualWidth {
                    range: s.range(),
                    bins,
                })
            }
            ColumnStatistics::Categorical(s) => Ok(Binning::Categorical {
                categories: s.categories().len(),
            }),
            ColumnStatistics::Bivariate { .. } => Err(ColumnError::NotAnAxis {
                column: self.name.clone(),
            }),
        }
    }

    /// Binning under the column's configured bin count.
    pub fn binning(&self) -> ColumnResult<Binning> {
        self.binning_with(self.num_bins)
    }

    /// Bin of `row` under `binning`, or `None` if the row is missing on this axis.
    pub fn bin_of(&self, row: usize, binning: &Binning) -> Option<usize> {
        match &self.values {
            ColumnValues::Categorical(d) => {
                d.codes.get(row).copied().flatten().map(|c| c as usize)
            }
            _ => self.axis_value(row).map(|v| binning.bin_index(v)),
        }
    }

    /// Statistics of the rows selected by `scope` (all rows when `None`).
    ///
    /// Histogram bins follow the overall column range so that results for different scopes
    /// are directly comparable.
    pub fn compute_statistics(&self, scope: Option<&BitVec>) -> ColumnStatistics {
        let len = self.len();
        match (&self.values, &self.statistics) {
            (ColumnValues::Double(v), ColumnStatistics::Double(overall)) => {
                let binning = equal_width(overall, self.num_bins);
                let (values, missing) = collect_axis(scope_rows(len, scope).map(|r| v[r]));
                ColumnStatistics::Double(NumericStatistics::compute(values, missing, binning))
            }
            (ColumnValues::Temporal(v), ColumnStatistics::Temporal(overall)) => {
                let binning = equal_width(overall, self.num_bins);
                let axis = scope_rows(len, scope).map(|r| v[r].map_or(f64::NAN, temporal_to_axis));
                let (values, missing) = collect_axis(axis);
                ColumnStatistics::Temporal(NumericStatistics::compute(values, missing, binning))
            }
            (ColumnValues::Categorical(d), _) => {
                let codes = scope_rows(len, scope).map(|r| d.codes[r]);
                ColumnStatistics::Categorical(CategoricalStatistics::compute(&d.categories, codes))
            }
            (
                ColumnValues::Bivariate { x, y, .. },
                ColumnStatistics::Bivariate {
                    x: overall_x,
                    y: overall_y,
                },
            ) => {
                let (xs, x_missing) = collect_axis(scope_rows(len, scope).map(|r| x[r]));
                let (ys, y_missing) = collect_axis(scope_rows(len, scope).map(|r| y[r]));
                let (bins_x, bins_y) = (
                    equal_width(overall_x, self.num_bins),
                    equal_width(overall_y, self.num_bins),
                );
                ColumnStatistics::Bivariate {
                    x: NumericStatistics::compute(xs, x_missing, bins_x),
                    y: NumericStatistics::compute(ys, y_missing, bins_y),
                }
            }
            // Overall statistics are always built from the same storage variant.
            _ => overall_statistics(&self.values, self.num_bins),
        }
    }

    /// Recompute the overall statistics (and therefore the binning) from the current values.
    pub fn refresh_statistics(&mut self, num_bins: usize) -> ColumnResult<()> {
        if num_bins == 0 {
            return Err(ColumnError::InvalidBinCount);
        }
        self.num_bins = num_bins;
        self.statistics = overall_statistics(&self.values, num_bins);
        log::trace!(
            "refreshed statistics for column {} ({} rows, {} bins)",
            self.name,
            self.len(),
            num_bins
        );
        Ok(())
    }

    /// Change the bin count, rebuilding only the histograms.
    pub fn rebin(&mut self, num_bins: usize) -> ColumnResult<()> {
        if num_bins == 0 {
            return Err(ColumnError::InvalidBinCount);
        }
        self.num_bins = num_bins;
        let rebinned = |stats: &NumericStatistics, values: &mut dyn Iterator<Item = f64>| {
            let mut histogram = Histogram::empty(equal_width(stats, num_bins));
            for v in values.filter(|v| !v.is_nan()) {
                let bin = histogram.binning().bin_index(v);
                histogram.increment(bin);
            }
            stats.with_histogram(histogram)
        };
        self.statistics = match (&self.values, &self.statistics) {
            (ColumnValues::Double(v), ColumnStatistics::Double(s)) => {
                ColumnStatistics::Double(rebinned(s, &mut v.iter().copied()))
            }
            (ColumnValues::Temporal(v), ColumnStatistics::Temporal(s)) => {
                let mut axis = v.iter().map(|t| t.map_or(f64::NAN, temporal_to_axis));
                ColumnStatistics::Temporal(rebinned(s, &mut axis))
            }
            (
                ColumnValues::Bivariate { x, y, .. },
                ColumnStatistics::Bivariate { x: sx, y: sy },
            ) => ColumnStatistics::Bivariate {
                x: rebinned(sx, &mut x.iter().copied()),
                y: rebinned(sy, &mut y.iter().copied()),
            },
            (_, stats) => stats.clone(),
        };
        Ok(())
    }

    /// Check that `value` can be stored in this column without modifying it.
    pub fn check_value(&self, value: &Value) -> ColumnResult<()> {
        check_value(&self.name, self.column_type, value)
    }

    /// Append one value. Overall statistics are stale until [`Column::refresh_statistics`].
    pub fn push_value(&mut self, value: &Value) -> ColumnResult<()> {
        self.check_value(value)?;
        push_value(&mut self.values, value);
        Ok(())
    }

    /// Keep only rows whose bit is set in `keep`. Statistics are stale afterwards.
    pub fn retain_rows(&mut self, keep: &BitVec) {
        debug_assert_eq!(keep.len(), self.len(), "retain mask length mismatch");
        fn retain<T>(values: &mut Vec<T>, keep: &BitVec) {
            let mut row = 0;
            values.retain(|_| {
                let kept = keep.get(row);
                row += 1;
                kept
            });
        }
        match &mut self.values {
            ColumnValues::Double(v) => retain(v, keep),
            ColumnValues::Temporal(v) => retain(v, keep),
            ColumnValues::Categorical(d) => retain(&mut d.codes, keep),
            ColumnValues::Bivariate { x, y, .. } => {
                retain(x, keep);
                retain(y, keep);
            }
        }
    }
}

/// Incrementally builds a [`Column`] from row values.
#[derive(Debug)]
pub struct ColumnBuilder {
    id: ColumnId,
    schema: ColumnSchema,
    values: ColumnValues,
}

impl ColumnBuilder {
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append(&mut self, value: &Value) -> ColumnResult<()> {
        check_value(&self.schema.name, self.schema.column_type, value)?;
        push_value(&mut self.values, value);
        Ok(())
    }

    pub fn finish(self, num_bins: usize) -> ColumnResult<Column> {
        Column::finish(self.id, self.schema, self.values, num_bins)
    }
}

fn check_value(column: &str, column_type: ColumnType, value: &Value) -> ColumnResult<()> {
    let ok = matches!(
        (column_type, value),
        (_, Value::Missing)
            | (ColumnType::Double, Value::Double(_))
            | (ColumnType::Temporal, Value::Temporal(_))
            | (ColumnType::Categorical, Value::Category(_))
            | (ColumnType::Bivariate, Value::Pair(..))
    );
    if !ok {
        return Err(ColumnError::TypeMismatch {
            column: column.to_string(),
            expected: column_type,
            found: value.kind_name(),
        });
    }
    // NaN stays a missing marker; infinities have no place on a binned axis.
    let infinite = match value {
        Value::Double(v) => Some(*v).filter(|v| v.is_infinite()),
        Value::Pair(a, b) => [*a, *b].into_iter().find(|v| v.is_infinite()),
        _ => None,
    };
    match infinite {
        Some(value) => Err(ColumnError::NonFiniteValue {
            column: column.to_string(),
            value,
        }),
        None => Ok(()),
    }
}

/// Callers must have run [`check_value`] first.
fn push_value(values: &mut ColumnValues, value: &Value) {
    match (values, value) {
        (ColumnValues::Double(v), Value::Double(x)) => v.push(*x),
        (ColumnValues::Double(v), _) => v.push(f64::NAN),
        (ColumnValues::Temporal(v), Value::Temporal(t)) => v.push(Some(*t)),
        (ColumnValues::Temporal(v), _) => v.push(None),
        (ColumnValues::Categorical(d), Value::Category(s)) => {
            let code = d.intern(s);
            d.codes.push(Some(code));
        }
        (ColumnValues::Categorical(d), _) => d.codes.push(None),
        (ColumnValues::Bivariate { x, y, .. }, Value::Pair(a, b)) => {
            x.push(*a);
            y.push(*b);
        }
        (ColumnValues::Bivariate { x, y, .. }, _) => {
            x.push(f64::NAN);
            y.push(f64::NAN);
        }
    }
}

fn equal_width(overall: &NumericStatistics, bins: usize) -> Binning {
    Binning::EqualWidth {
        range: overall.range(),
        bins,
    }
}

/// Split an axis stream into its non-missing values and a missing count.
fn collect_axis(values: impl Iterator<Item = f64>) -> (Vec<f64>, usize) {
    let mut out = Vec::new();
    let mut missing = 0;
    for v in values {
        if v.is_nan() {
            missing += 1;
        } else {
            out.push(v);
        }
    }
    (out, missing)
}

fn range_of(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn overall_numeric(values: impl Iterator<Item = f64>, bins: usize) -> NumericStatistics {
    let (values, missing) = collect_axis(values);
    let binning = Binning::EqualWidth {
        range: range_of(&values),
        bins,
    };
    NumericStatistics::compute(values, missing, binning)
}

fn overall_statistics(values: &ColumnValues, bins: usize) -> ColumnStatistics {
    match values {
        ColumnValues::Double(v) => {
            ColumnStatistics::Double(overall_numeric(v.iter().copied(), bins))
        }
        ColumnValues::Temporal(v) => ColumnStatistics::Temporal(overall_numeric(
            v.iter().map(|t| t.map_or(f64::NAN, temporal_to_axis)),
            bins,
        )),
        ColumnValues::Categorical(d) => ColumnStatistics::Categorical(
            CategoricalStatistics::compute(&d.categories, d.codes.iter().copied()),
        ),
        ColumnValues::Bivariate { x, y, .. } => ColumnStatistics::Bivariate {
            x: overall_numeric(x.iter().copied(), bins),
            y: overall_numeric(y.iter().copied(), bins),
        },
    }
}
