use crate::error::{TableError, TableResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Session-level settings that control how much derived data a [`crate::DataTable`] keeps.
///
/// Missing fields deserialize to their defaults, so a settings file only needs to name the
/// values it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Bin count for every numeric and temporal histogram, 1D and 2D.
    pub num_histogram_bins: usize,
    /// Maintain per-column statistics of the queried tuples.
    pub calculate_query_statistics: bool,
    /// Maintain per-column statistics of the non-queried tuples. Large tables may turn this
    /// off to halve the cost of each query update.
    pub calculate_non_query_statistics: bool,
    /// Maintain joint histograms for every pair of adjacent enabled columns.
    pub compute_pair_histograms: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            num_histogram_bins: DEFAULT_HISTOGRAM_BINS,
            calculate_query_statistics: true,
            calculate_non_query_statistics: true,
            compute_pair_histograms: true,
        }
    }
}

impl TableOptions {
    pub fn validate(&self) -> TableResult<()> {
        if self.num_histogram_bins == 0 {
            return Err(TableError::InvalidBinCount {
                bins: self.num_histogram_bins,
            });
        }
        Ok(())
    }
}
