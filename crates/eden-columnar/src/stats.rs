#![forbid(unsafe_code)]

use crate::histogram::{Binning, Histogram};
use crate::types::ColumnType;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Summary of the non-missing values of a numeric (or temporal) column within one scope.
///
/// Only exists when the scope has at least one value; an empty scope has no summary rather
/// than a summary full of NaNs. Temporal columns are summarized on their epoch-millisecond
/// axis (see [`crate::axis_to_temporal`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    pub std_dev: f64,
    /// `None` when the variance is zero.
    pub skewness: Option<f64>,
    /// Excess kurtosis; `None` when the variance is zero.
    pub kurtosis: Option<f64>,
    pub median: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub iqr: f64,
    /// Smallest value within `percentile25 - 1.5 * iqr`.
    pub lower_whisker: f64,
    /// Largest value within `percentile75 + 1.5 * iqr`.
    pub upper_whisker: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    count: usize,
    missing_count: usize,
    summary: Option<NumericSummary>,
    histogram: Histogram,
}

impl NumericStatistics {
    /// `values` holds the non-missing values in scope, in any order.
    pub(crate) fn compute(mut values: Vec<f64>, missing_count: usize, binning: Binning) -> Self {
        let mut histogram = Histogram::empty(binning);
        for &v in &values {
            let bin = histogram.binning().bin_index(v);
            histogram.increment(bin);
        }

        values.sort_unstable_by_key(|v| OrderedFloat(*v));
        Self {
            count: values.len(),
            missing_count,
            summary: summarize_sorted(&values),
            histogram,
        }
    }

    /// Recompute only the histogram under a new binning, keeping the summary.
    pub(crate) fn with_histogram(&self, histogram: Histogram) -> Self {
        Self {
            histogram,
            ..self.clone()
        }
    }

    /// Number of non-missing values in scope.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn missing_count(&self) -> usize {
        self.missing_count
    }

    pub fn summary(&self) -> Option<&NumericSummary> {
        self.summary.as_ref()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn min(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.max)
    }

    pub fn mean(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.mean)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.std_dev)
    }

    pub fn median(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.median)
    }

    pub fn percentile25(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.percentile25)
    }

    pub fn percentile75(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.percentile75)
    }

    pub fn iqr(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.iqr)
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.summary.as_ref().map(|s| (s.min, s.max))
    }
}

/// Linearly interpolated percentile at rank `p * (n - 1)` of an ascending slice.
///
/// Returns `None` for an empty slice or a `p` outside `[0, 1]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    if lo == hi {
        return Some(a);
    }
    let v = a + (b - a) * (rank - lo as f64);
    Some(v.clamp(a, b))
}

fn summarize_sorted(sorted: &[f64]) -> Option<NumericSummary> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let n = sorted.len() as f64;

    // A constant column has exactly zero spread, whatever rounding does to the mean.
    let constant = min == max;
    let mean = if constant {
        min
    } else {
        sorted.iter().sum::<f64>() / n
    };
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    if !constant {
        for &v in sorted {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
    }
    let variance = m2 / n;
    let (skewness, kurtosis) = if variance > 0.0 {
        (
            Some((m3 / n) / variance.powf(1.5)),
            Some((m4 / n) / (variance * variance) - 3.0),
        )
    } else {
        (None, None)
    };

    let percentile25 = percentile(sorted, 0.25)?;
    let median = percentile(sorted, 0.5)?;
    let percentile75 = percentile(sorted, 0.75)?;
    let iqr = percentile75 - percentile25;

    let lower_fence = percentile25 - 1.5 * iqr;
    let upper_fence = percentile75 + 1.5 * iqr;
    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|v| *v >= lower_fence)
        .unwrap_or(min);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= upper_fence)
        .unwrap_or(max);

    Some(NumericSummary {
        min,
        max,
        // Rounding in the running sum can push the mean a hair outside the data range.
        mean: mean.clamp(min, max),
        variance,
        std_dev: variance.sqrt(),
        skewness,
        kurtosis,
        median,
        percentile25,
        percentile75,
        iqr,
        lower_whisker,
        upper_whisker,
    })
}

/// Per-category counts of a categorical column within one scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStatistics {
    count: usize,
    missing_count: usize,
    categories: Vec<Arc<str>>,
    histogram: Histogram,
}

impl CategoricalStatistics {
    pub(crate) fn compute(
        categories: &[Arc<str>],
        codes: impl Iterator<Item = Option<u32>>,
    ) -> Self {
        let mut histogram = Histogram::empty(Binning::Categorical {
            categories: categories.len(),
        });
        let mut count = 0;
        let mut missing_count = 0;
        for code in codes {
            match code {
                Some(code) => {
                    histogram.increment(code as usize);
                    count += 1;
                }
                None => missing_count += 1,
            }
        }
        Self {
            count,
            missing_count,
            categories: categories.to_vec(),
            histogram,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn missing_count(&self) -> usize {
        self.missing_count
    }

    /// Distinct categories in insertion order, including ones with no rows in scope.
    pub fn categories(&self) -> &[Arc<str>] {
        &self.categories
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn count_for(&self, category: &str) -> Option<u64> {
        let idx = self.categories.iter().position(|c| c.as_ref() == category)?;
        self.histogram.count(idx)
    }

    /// Most frequent category; ties resolve to the earliest category.
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<(usize, u64)> = None;
        for (idx, &c) in self.histogram.counts().iter().enumerate() {
            if c > 0 && best.map_or(true, |(_, b)| c > b) {
                best = Some((idx, c));
            }
        }
        best.map(|(idx, _)| self.categories[idx].as_ref())
    }
}

/// Statistics of one column in one scope (overall, query or non-query).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnStatistics {
    Double(NumericStatistics),
    Temporal(NumericStatistics),
    Categorical(CategoricalStatistics),
    Bivariate {
        x: NumericStatistics,
        y: NumericStatistics,
    },
}

impl ColumnStatistics {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnStatistics::Double(_) => ColumnType::Double,
            ColumnStatistics::Temporal(_) => ColumnType::Temporal,
            ColumnStatistics::Categorical(_) => ColumnType::Categorical,
            ColumnStatistics::Bivariate { .. } => ColumnType::Bivariate,
        }
    }

    /// Numeric statistics of a double or temporal column.
    pub fn as_numeric(&self) -> Option<&NumericStatistics> {
        match self {
            ColumnStatistics::Double(s) | ColumnStatistics::Temporal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalStatistics> {
        match self {
            ColumnStatistics::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// The 1D histogram; bivariate columns have none.
    pub fn histogram(&self) -> Option<&Histogram> {
        match self {
            ColumnStatistics::Double(s) | ColumnStatistics::Temporal(s) => Some(s.histogram()),
            ColumnStatistics::Categorical(s) => Some(s.histogram()),
            ColumnStatistics::Bivariate { .. } => None,
        }
    }

    /// Number of non-missing values in scope.
    pub fn count(&self) -> usize {
        match self {
            ColumnStatistics::Double(s) | ColumnStatistics::Temporal(s) => s.count(),
            ColumnStatistics::Categorical(s) => s.count(),
            ColumnStatistics::Bivariate { x, .. } => x.count(),
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnStatistics::Double(s) | ColumnStatistics::Temporal(s) => s.missing_count(),
            ColumnStatistics::Categorical(s) => s.missing_count(),
            ColumnStatistics::Bivariate { x, .. } => x.missing_count(),
        }
    }
}
