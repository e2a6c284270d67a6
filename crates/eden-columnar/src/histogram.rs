#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// How values of one column map onto histogram bins.
///
/// A binning is always derived from the *overall* column, never from a subset, so histograms
/// computed over different scopes (all rows, query, non-query) line up bin for bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Binning {
    /// Equal-width bins spanning the overall `[min, max]` range of a numeric or temporal column.
    ///
    /// `range` is `None` when the column holds no non-missing values.
    EqualWidth {
        range: Option<(f64, f64)>,
        bins: usize,
    },
    /// One bin per category, in the column's stored category order.
    Categorical { categories: usize },
}

impl Binning {
    pub fn bin_count(&self) -> usize {
        match self {
            Binning::EqualWidth { bins, .. } => *bins,
            Binning::Categorical { categories } => *categories,
        }
    }

    /// Bin index for a numeric value: `floor((v - min) / (max - min) * bins)` clamped to
    /// `[0, bins - 1]`, so `v == max` lands in the last bin.
    ///
    /// A degenerate range (`min == max`) puts every value into bin 0.
    pub fn bin_index(&self, v: f64) -> usize {
        let Binning::EqualWidth { range, bins } = self else {
            return 0;
        };
        let Some((min, max)) = *range else {
            return 0;
        };
        let last = bins.saturating_sub(1);
        if max <= min {
            return 0;
        }
        let idx = ((v - min) / (max - min) * *bins as f64).floor();
        // Float to int casts saturate, so anything below `min` ends up in bin 0.
        (idx as usize).min(last)
    }

    /// Lower and upper edge of an equal-width bin.
    pub fn bin_bounds(&self, bin: usize) -> Option<(f64, f64)> {
        let Binning::EqualWidth {
            range: Some((min, max)),
            bins,
        } = *self
        else {
            return None;
        };
        if bin >= bins {
            return None;
        }
        let width = (max - min) / bins as f64;
        Some((min + width * bin as f64, min + width * (bin + 1) as f64))
    }
}

/// Binned counts of the non-missing values of one column in some scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    binning: Binning,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn empty(binning: Binning) -> Self {
        let counts = vec![0; binning.bin_count()];
        Self { binning, counts }
    }

    pub(crate) fn increment(&mut self, bin: usize) {
        if let Some(c) = self.counts.get_mut(bin) {
            *c += 1;
        }
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, bin: usize) -> Option<u64> {
        self.counts.get(bin).copied()
    }

    /// Total mass; equals the number of non-missing values in scope.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}
