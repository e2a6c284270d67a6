use crate::options::TableOptions;
use crate::selection::ColumnSelection;
use eden_columnar::{BitVec, Column, ColumnId, ColumnStatistics, ColumnType, Histogram2D};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryState {
    /// No selections: every tuple counts as queried.
    Empty,
    Active,
}

/// Which tuples an aggregate covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,
    Queried,
    NonQueried,
}

#[derive(Clone, Debug)]
struct ActiveSelection {
    selection: ColumnSelection,
    /// Rows satisfying this selection alone.
    mask: BitVec,
}

/// The conjunction of all active column selections and everything derived from it.
///
/// Each selection keeps its own membership mask. Changing one selection re-evaluates that
/// mask only; the queried set is the word-wise AND of all masks. Query and non-query
/// statistics are keyed by column and only exist for enabled columns.
#[derive(Clone, Debug, Default)]
pub struct Query {
    selections: Vec<ActiveSelection>,
    queried: BitVec,
    queried_count: usize,
    query_statistics: HashMap<ColumnId, ColumnStatistics>,
    non_query_statistics: HashMap<ColumnId, ColumnStatistics>,
    histograms: Vec<Histogram2D>,
    max_histogram2d_bin_count: u64,
    aggregates_pending: bool,
}

impl Query {
    pub(crate) fn new(tuple_count: usize) -> Self {
        Self {
            queried: BitVec::with_len_all_true(tuple_count),
            queried_count: tuple_count,
            ..Self::default()
        }
    }

    pub fn state(&self) -> QueryState {
        if self.selections.is_empty() {
            QueryState::Empty
        } else {
            QueryState::Active
        }
    }

    /// Whether at least one selection splits the tuples into queried and non-queried.
    pub fn is_partitioned(&self) -> bool {
        self.state() == QueryState::Active
    }

    /// Active selections in the order they were added.
    pub fn selections(&self) -> impl Iterator<Item = &ColumnSelection> + '_ {
        self.selections.iter().map(|s| &s.selection)
    }

    pub fn selection_count(&self) -> usize {
        self.selections.len()
    }

    pub fn selection(&self, column: ColumnId) -> Option<&ColumnSelection> {
        self.position(column).map(|i| &self.selections[i].selection)
    }

    pub fn has_selection(&self, column: ColumnId) -> bool {
        self.position(column).is_some()
    }

    /// One bit per tuple, set for queried tuples.
    pub fn queried_rows(&self) -> &BitVec {
        &self.queried
    }

    pub fn queried_tuple_count(&self) -> usize {
        self.queried_count
    }

    pub fn non_queried_tuple_count(&self) -> usize {
        self.queried.len() - self.queried_count
    }

    pub fn is_queried(&self, row: usize) -> bool {
        row < self.queried.len() && self.queried.get(row)
    }

    /// Statistics of the queried tuples for an enabled column.
    pub fn query_statistics(&self, column: ColumnId) -> Option<&ColumnStatistics> {
        self.query_statistics.get(&column)
    }

    /// Statistics of the non-queried tuples for an enabled column.
    pub fn non_query_statistics(&self, column: ColumnId) -> Option<&ColumnStatistics> {
        self.non_query_statistics.get(&column)
    }

    /// Queried-subset joint histogram of an adjacent enabled pair, in either order.
    pub fn histogram2d(&self, a: ColumnId, b: ColumnId) -> Option<&Histogram2D> {
        self.histograms.iter().find(|h| {
            (h.column_a() == a && h.column_b() == b) || (h.column_a() == b && h.column_b() == a)
        })
    }

    pub fn histograms2d(&self) -> &[Histogram2D] {
        &self.histograms
    }

    pub fn max_histogram2d_bin_count(&self) -> u64 {
        self.max_histogram2d_bin_count
    }

    /// True while a selection drag defers the statistics and histogram refresh.
    pub fn aggregates_pending(&self) -> bool {
        self.aggregates_pending
    }

    /// Rows covered by `scope`; `None` means every row.
    pub fn scope_mask(&self, scope: Scope) -> Option<BitVec> {
        match scope {
            Scope::All => None,
            Scope::Queried => Some(self.queried.clone()),
            Scope::NonQueried => Some(self.queried.negated()),
        }
    }

    fn position(&self, column: ColumnId) -> Option<usize> {
        self.selections
            .iter()
            .position(|s| s.selection.column() == column)
    }

    /// Insert or replace the selection on its column. Returns true if one was replaced.
    pub(crate) fn upsert(&mut self, selection: ColumnSelection, column: &Column) -> bool {
        let mask = selection.membership(column);
        let entry = ActiveSelection { selection, mask };
        match self.position(entry.selection.column()) {
            Some(i) => {
                self.selections[i] = entry;
                true
            }
            None => {
                self.selections.push(entry);
                false
            }
        }
    }

    pub(crate) fn remove(&mut self, column: ColumnId) -> Option<ColumnSelection> {
        let i = self.position(column)?;
        Some(self.selections.remove(i).selection)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.selections.len();
        self.selections.clear();
        removed
    }

    /// Forget a column entirely: its selection and its scoped statistics.
    pub(crate) fn drop_column(&mut self, column: ColumnId) -> Option<ColumnSelection> {
        self.query_statistics.remove(&column);
        self.non_query_statistics.remove(&column);
        self.remove(column)
    }

    pub(crate) fn set_aggregates_pending(&mut self, pending: bool) {
        self.aggregates_pending = pending;
    }

    /// Re-evaluate every selection mask, e.g. after tuples were added or removed.
    pub(crate) fn rebuild_masks(&mut self, columns: &[Column]) {
        for entry in &mut self.selections {
            if let Some(column) = columns.iter().find(|c| c.id() == entry.selection.column()) {
                entry.mask = entry.selection.membership(column);
            }
        }
    }

    /// Recompute the queried set as the AND of all selection masks.
    pub(crate) fn repartition(&mut self, tuple_count: usize) {
        let mut queried = BitVec::with_len_all_true(tuple_count);
        for entry in &self.selections {
            queried.and_inplace(&entry.mask);
        }
        self.queried_count = queried.count_ones();
        self.queried = queried;
        log::trace!(
            "query partition: {} queried, {} non-queried, {} selections",
            self.queried_count,
            self.non_queried_tuple_count(),
            self.selections.len()
        );
    }

    /// Rebuild scoped statistics and joint histograms for the enabled columns.
    pub(crate) fn recompute_aggregates(&mut self, columns: &[Column], options: &TableOptions) {
        let started = Instant::now();
        let non_queried = self.queried.negated();
        self.query_statistics.clear();
        self.non_query_statistics.clear();
        for column in columns.iter().filter(|c| c.is_enabled()) {
            if options.calculate_query_statistics {
                self.query_statistics
                    .insert(column.id(), column.compute_statistics(Some(&self.queried)));
            }
            if options.calculate_non_query_statistics {
                self.non_query_statistics
                    .insert(column.id(), column.compute_statistics(Some(&non_queried)));
            }
        }

        self.histograms = if options.compute_pair_histograms {
            pair_histograms(columns, Some(&self.queried), options.num_histogram_bins)
        } else {
            Vec::new()
        };
        self.max_histogram2d_bin_count = self
            .histograms
            .iter()
            .map(Histogram2D::max_bin_count)
            .max()
            .unwrap_or(0);
        self.aggregates_pending = false;
        log::trace!(
            "query aggregates recomputed for {} columns in {:?}",
            self.query_statistics.len().max(self.non_query_statistics.len()),
            started.elapsed()
        );
    }
}

/// Columns that can be histogram axes, in display order.
pub(crate) fn axis_columns(columns: &[Column]) -> impl Iterator<Item = &Column> + '_ {
    columns
        .iter()
        .filter(|c| c.is_enabled() && c.column_type() != ColumnType::Bivariate)
}

/// Joint histograms of every adjacent pair of enabled axis columns.
pub(crate) fn pair_histograms(
    columns: &[Column],
    scope: Option<&BitVec>,
    bins: usize,
) -> Vec<Histogram2D> {
    let axes: Vec<&Column> = axis_columns(columns).collect();
    axes.windows(2)
        .filter_map(|pair| match Histogram2D::build(pair[0], pair[1], scope, bins, bins) {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                log::warn!(
                    "skipping joint histogram {} x {}: {err}",
                    pair[0].name(),
                    pair[1].name()
                );
                None
            }
        })
        .collect()
}
