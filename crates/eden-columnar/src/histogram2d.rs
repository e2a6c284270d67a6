#![forbid(unsafe_code)]

use crate::bitmap::{scope_rows, BitVec};
use crate::column::Column;
use crate::error::{ColumnError, ColumnResult};
use crate::histogram::Binning;
use crate::types::ColumnId;
use serde::{Deserialize, Serialize};

/// Joint bin counts of two columns over one scope.
///
/// Each axis is binned with its own overall-column binning, so matrices built over the full
/// table and over the queried subset line up cell for cell. Views use these matrices to draw
/// density-shaded bands instead of one polyline per row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    column_a: ColumnId,
    column_b: ColumnId,
    binning_a: Binning,
    binning_b: Binning,
    /// Row-major: `counts[a * bins_b + b]`.
    counts: Vec<u64>,
    max_bin_count: u64,
}

impl Histogram2D {
    /// Count rows of `scope` (all rows when `None`) that are non-missing on both axes.
    ///
    /// `bins_a` / `bins_b` apply to numeric and temporal axes; a categorical axis always has
    /// one bin per category.
    pub fn build(
        a: &Column,
        b: &Column,
        scope: Option<&BitVec>,
        bins_a: usize,
        bins_b: usize,
    ) -> ColumnResult<Self> {
        if a.len() != b.len() {
            return Err(ColumnError::LengthMismatch {
                column: b.name().to_string(),
                expected: a.len(),
                actual: b.len(),
            });
        }
        let binning_a = a.binning_with(bins_a)?;
        let binning_b = b.binning_with(bins_b)?;
        let (rows, cols) = (binning_a.bin_count(), binning_b.bin_count());

        let mut counts = vec![0u64; rows * cols];
        for row in scope_rows(a.len(), scope) {
            let (Some(i), Some(j)) = (a.bin_of(row, &binning_a), b.bin_of(row, &binning_b))
            else {
                continue;
            };
            if let Some(cell) = counts.get_mut(i * cols + j) {
                *cell += 1;
            }
        }
        let max_bin_count = counts.iter().copied().max().unwrap_or(0);

        Ok(Self {
            column_a: a.id(),
            column_b: b.id(),
            binning_a,
            binning_b,
            counts,
            max_bin_count,
        })
    }

    pub fn column_a(&self) -> ColumnId {
        self.column_a
    }

    pub fn column_b(&self) -> ColumnId {
        self.column_b
    }

    pub fn binning_a(&self) -> &Binning {
        &self.binning_a
    }

    pub fn binning_b(&self) -> &Binning {
        &self.binning_b
    }

    pub fn bins_a(&self) -> usize {
        self.binning_a.bin_count()
    }

    pub fn bins_b(&self) -> usize {
        self.binning_b.bin_count()
    }

    pub fn count(&self, a: usize, b: usize) -> Option<u64> {
        if a >= self.bins_a() || b >= self.bins_b() {
            return None;
        }
        self.counts.get(a * self.bins_b() + b).copied()
    }

    /// Counts for bin `a` of the first axis across every bin of the second axis.
    pub fn row(&self, a: usize) -> Option<&[u64]> {
        let cols = self.bins_b();
        self.counts.get(a * cols..(a + 1) * cols)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest cell count, used to scale color intensity.
    pub fn max_bin_count(&self) -> u64 {
        self.max_bin_count
    }
}
