use crate::error::{TableError, TableResult};
use crate::event::{ListenerId, TableEvent, TableListener};
use crate::options::TableOptions;
use crate::query::{pair_histograms, Query, Scope};
use crate::selection::{ColumnSelection, SelectionBounds};
use crate::tuple::TupleRef;
use eden_columnar::{BitVec, Column, ColumnId, ColumnSchema, ColumnType, Histogram2D, Value};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

/// An in-memory multivariate table with a live brushing query.
///
/// The table owns its columns, the active [`Query`] and every derived aggregate. All
/// mutations go through `&mut self`, validate their input before touching any state and
/// publish exactly one [`TableEvent`] once the aggregates are consistent again.
///
/// Columns are addressed either by display position (`column(i)`) or by stable
/// [`ColumnId`]. Ids are never reused, so an id kept across [`DataTable::set_data`] or
/// [`DataTable::remove_column`] reports [`TableError::StaleColumn`].
pub struct DataTable {
    columns: Vec<Column>,
    tuple_count: usize,
    next_column_id: u32,
    query: Query,
    options: TableOptions,
    pair_histograms: Vec<Histogram2D>,
    max_pair_histogram_bin_count: u64,
    listeners: Vec<(ListenerId, Box<dyn TableListener>)>,
    next_listener_id: u64,
    drag: Option<Drag>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Drag {
    /// Last column updated while the drag was open.
    column: Option<ColumnId>,
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.columns)
            .field("tuple_count", &self.tuple_count)
            .field("query", &self.query)
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl DataTable {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            tuple_count: 0,
            next_column_id: 0,
            query: Query::new(0),
            options: TableOptions::default(),
            pair_histograms: Vec::new(),
            max_pair_histogram_bin_count: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            drag: None,
        }
    }

    pub fn with_options(options: TableOptions) -> TableResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            ..Self::new()
        })
    }

    // --- reads -----------------------------------------------------------------------------

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn enabled_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|c| c.is_enabled())
    }

    /// Column at display position `index`.
    pub fn column(&self, index: usize) -> TableResult<&Column> {
        self.columns
            .get(index)
            .ok_or(TableError::ColumnIndexOutOfBounds {
                index,
                len: self.columns.len(),
            })
    }

    pub fn column_by_id(&self, id: ColumnId) -> TableResult<&Column> {
        let index = self.column_index(id)?;
        Ok(&self.columns[index])
    }

    /// Look up by name, preferring an enabled column when a disabled one shares the name.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.enabled_columns()
            .find(|c| c.name() == name)
            .or_else(|| self.columns.iter().find(|c| c.name() == name))
    }

    /// Display position of a column.
    pub fn column_index(&self, id: ColumnId) -> TableResult<usize> {
        self.columns
            .iter()
            .position(|c| c.id() == id)
            .ok_or(TableError::StaleColumn(id))
    }

    pub fn tuple_count(&self) -> usize {
        self.tuple_count
    }

    pub fn tuple(&self, row: usize) -> TableResult<TupleRef<'_>> {
        if row >= self.tuple_count {
            return Err(TableError::RowOutOfBounds {
                row,
                len: self.tuple_count,
            });
        }
        Ok(TupleRef::new(self, row))
    }

    pub fn tuples(&self) -> impl Iterator<Item = TupleRef<'_>> + '_ {
        (0..self.tuple_count).map(move |row| TupleRef::new(self, row))
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Overall-scope joint histograms of every adjacent pair of enabled axis columns.
    pub fn pair_histograms(&self) -> &[Histogram2D] {
        &self.pair_histograms
    }

    pub fn max_pair_histogram_bin_count(&self) -> u64 {
        self.max_pair_histogram_bin_count
    }

    /// Joint histogram of any two enabled axis columns over `scope`.
    pub fn histogram2d(&self, a: ColumnId, b: ColumnId, scope: Scope) -> TableResult<Histogram2D> {
        let a = self.axis_column(a)?;
        let b = self.axis_column(b)?;
        let mask = self.query.scope_mask(scope);
        let bins = self.options.num_histogram_bins;
        Ok(Histogram2D::build(a, b, mask.as_ref(), bins, bins)?)
    }

    fn axis_column(&self, id: ColumnId) -> TableResult<&Column> {
        let column = self.column_by_id(id)?;
        if !column.is_enabled() {
            return Err(TableError::ColumnDisabled {
                column: column.name().to_string(),
            });
        }
        if column.column_type() == ColumnType::Bivariate {
            return Err(TableError::TypeMismatch {
                column: column.name().to_string(),
                expected: "double, temporal or categorical",
                actual: column.column_type(),
            });
        }
        Ok(column)
    }

    // --- listeners -------------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: impl TableListener + 'static) -> ListenerId {
        let id = ListenerId::new(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: TableEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener.on_event(self, &event);
        }
        self.listeners = listeners;
    }

    // --- loading ---------------------------------------------------------------------------

    /// Replace the whole table. Nothing changes unless every row matches `schema`.
    pub fn set_data<I>(&mut self, schema: Vec<ColumnSchema>, rows: I) -> TableResult<()>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        {
            let mut seen = HashSet::new();
            for column in &schema {
                if !seen.insert(column.name.as_str()) {
                    return Err(TableError::DuplicateColumnName {
                        name: column.name.clone(),
                    });
                }
            }
        }

        let first_id = self.next_column_id;
        let mut builders: Vec<_> = schema
            .into_iter()
            .enumerate()
            .map(|(i, schema)| Column::builder(ColumnId::new(first_id + i as u32), schema))
            .collect();
        let mut tuple_count = 0;
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != builders.len() {
                return Err(TableError::SchemaMismatch {
                    row,
                    expected: builders.len(),
                    actual: values.len(),
                });
            }
            for (builder, value) in builders.iter_mut().zip(&values) {
                builder.append(value)?;
            }
            tuple_count += 1;
        }
        let bins = self.options.num_histogram_bins;
        let columns = builders
            .into_iter()
            .map(|builder| builder.finish(bins))
            .collect::<Result<Vec<_>, _>>()?;

        self.next_column_id = first_id + columns.len() as u32;
        self.columns = columns;
        self.tuple_count = tuple_count;
        self.query = Query::new(tuple_count);
        self.drag = None;
        self.recompute_all();
        log::debug!(
            "table reset: {} columns, {} tuples",
            self.columns.len(),
            self.tuple_count
        );
        self.notify(TableEvent::Reset);
        Ok(())
    }

    /// Drop every column and tuple.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.tuple_count = 0;
        self.query = Query::new(0);
        self.drag = None;
        self.pair_histograms.clear();
        self.max_pair_histogram_bin_count = 0;
        log::debug!("table cleared");
        self.notify(TableEvent::Reset);
    }

    /// Append rows with one value per column, in display order. Returns the number appended.
    ///
    /// A derived bivariate column still takes a pair (or missing) value in each row, but the
    /// stored pair is rebuilt from its source columns.
    pub fn append_tuples<I>(&mut self, rows: I) -> TableResult<usize>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let rows: Vec<Vec<Value>> = rows.into_iter().collect();
        for (offset, values) in rows.iter().enumerate() {
            if values.len() != self.columns.len() {
                return Err(TableError::SchemaMismatch {
                    row: self.tuple_count + offset,
                    expected: self.columns.len(),
                    actual: values.len(),
                });
            }
            for (column, value) in self.columns.iter().zip(values) {
                column.check_value(value)?;
            }
        }
        if rows.is_empty() {
            return Ok(0);
        }

        let derived: Vec<Option<[usize; 2]>> = self
            .columns
            .iter()
            .map(|c| {
                let [x, y] = c.bivariate_sources()?;
                Some([self.column_index(x).ok()?, self.column_index(y).ok()?])
            })
            .collect();
        for values in &rows {
            for (i, value) in values.iter().enumerate() {
                if derived[i].is_none() {
                    self.columns[i].push_value(value)?;
                }
            }
        }
        let (start, end) = (self.tuple_count, self.tuple_count + rows.len());
        for (i, sources) in derived.iter().enumerate() {
            let Some([x, y]) = *sources else {
                continue;
            };
            let pairs: Vec<Value> = (start..end)
                .map(|row| {
                    match (self.columns[x].axis_value(row), self.columns[y].axis_value(row)) {
                        (Some(a), Some(b)) => Value::Pair(a, b),
                        _ => Value::Missing,
                    }
                })
                .collect();
            for pair in &pairs {
                self.columns[i].push_value(pair)?;
            }
        }

        self.tuple_count = end;
        self.refresh_column_statistics()?;
        self.query.rebuild_masks(&self.columns);
        self.recompute_all();
        log::debug!("appended {} tuples ({} total)", rows.len(), self.tuple_count);
        self.notify(TableEvent::TuplesAdded { count: rows.len() });
        Ok(rows.len())
    }

    // --- columns ---------------------------------------------------------------------------

    pub fn enable_column(&mut self, id: ColumnId) -> TableResult<()> {
        let index = self.column_index(id)?;
        let column = &self.columns[index];
        if column.is_enabled() {
            return Ok(());
        }
        self.ensure_unique_name(column.name(), Some(id))?;

        self.columns[index].set_enabled(true);
        self.recompute_all();
        log::debug!("enabled column {}", self.columns[index].name());
        self.notify(TableEvent::ColumnEnabled { column: id });
        Ok(())
    }

    /// Exclude a column from every aggregate. Its selection, if any, is dropped.
    pub fn disable_column(&mut self, id: ColumnId) -> TableResult<()> {
        let index = self.column_index(id)?;
        let column = &self.columns[index];
        if !column.is_enabled() {
            return Ok(());
        }
        if self.enabled_columns().count() == 1 {
            return Err(TableError::LastEnabledColumn {
                column: column.name().to_string(),
            });
        }

        self.columns[index].set_enabled(false);
        self.query.drop_column(id);
        self.recompute_all();
        log::debug!("disabled column {}", self.columns[index].name());
        self.notify(TableEvent::ColumnDisabled { column: id });
        Ok(())
    }

    pub fn rename_column(&mut self, id: ColumnId, name: impl Into<String>) -> TableResult<()> {
        let name = name.into();
        let index = self.column_index(id)?;
        let column = &self.columns[index];
        if column.name() == name {
            return Ok(());
        }
        if column.is_enabled() {
            self.ensure_unique_name(&name, Some(id))?;
        }

        let old_name = self.columns[index].name().to_string();
        self.columns[index].set_name(name);
        log::debug!("renamed column {old_name} to {}", self.columns[index].name());
        self.notify(TableEvent::ColumnRenamed {
            column: id,
            old_name,
        });
        Ok(())
    }

    /// Move the column at display position `from` to position `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> TableResult<()> {
        let len = self.columns.len();
        for index in [from, to] {
            if index >= len {
                return Err(TableError::ColumnIndexOutOfBounds { index, len });
            }
        }
        if from == to {
            return Ok(());
        }

        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        self.after_reorder();
        Ok(())
    }

    /// Reorder columns; `order` must list every column id exactly once.
    pub fn set_column_order(&mut self, order: &[ColumnId]) -> TableResult<()> {
        let unique: HashSet<ColumnId> = order.iter().copied().collect();
        if order.len() != self.columns.len() || unique.len() != order.len() {
            return Err(TableError::InvalidColumnOrder);
        }
        let mut positions = Vec::with_capacity(order.len());
        for id in order {
            positions.push(self.column_index(*id).map_err(|_| TableError::InvalidColumnOrder)?);
        }
        if positions.iter().enumerate().all(|(i, &p)| i == p) {
            return Ok(());
        }

        let mut old: Vec<Option<Column>> = std::mem::take(&mut self.columns)
            .into_iter()
            .map(Some)
            .collect();
        self.columns = positions
            .into_iter()
            .filter_map(|p| old[p].take())
            .collect();
        self.after_reorder();
        Ok(())
    }

    fn after_reorder(&mut self) {
        self.refresh_pair_histograms();
        self.query.recompute_aggregates(&self.columns, &self.options);
        log::debug!(
            "columns reordered: {}",
            self.columns
                .iter()
                .map(Column::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.notify(TableEvent::ColumnsReordered);
    }

    /// Add a column pairing the values of two numeric columns. Returns its id.
    pub fn add_bivariate_column(
        &mut self,
        name: impl Into<String>,
        x: ColumnId,
        y: ColumnId,
    ) -> TableResult<ColumnId> {
        let name = name.into();
        self.ensure_unique_name(&name, None)?;
        let id = ColumnId::new(self.next_column_id);
        let column = Column::bivariate(
            id,
            name,
            self.column_by_id(x)?,
            self.column_by_id(y)?,
            self.options.num_histogram_bins,
        )?;

        self.next_column_id += 1;
        self.columns.push(column);
        self.query.recompute_aggregates(&self.columns, &self.options);
        log::debug!("added bivariate column {id} from {x} and {y}");
        self.notify(TableEvent::ColumnAdded { column: id });
        Ok(id)
    }

    pub fn remove_column(&mut self, id: ColumnId) -> TableResult<()> {
        let index = self.column_index(id)?;
        let column = &self.columns[index];
        if column.is_enabled() && self.enabled_columns().count() == 1 {
            return Err(TableError::LastEnabledColumn {
                column: column.name().to_string(),
            });
        }

        let removed = self.columns.remove(index);
        self.query.drop_column(id);
        self.recompute_all();
        log::debug!("removed column {}", removed.name());
        self.notify(TableEvent::ColumnRemoved { column: id });
        Ok(())
    }

    fn ensure_unique_name(&self, name: &str, except: Option<ColumnId>) -> TableResult<()> {
        let clash = self
            .enabled_columns()
            .any(|c| Some(c.id()) != except && c.name() == name);
        if clash {
            return Err(TableError::DuplicateColumnName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    // --- selections ------------------------------------------------------------------------

    /// Add a selection, replacing any existing selection on the same column.
    ///
    /// Ranges are narrowed to the column's values; a range that misses them entirely is
    /// rejected.
    pub fn add_selection(&mut self, selection: ColumnSelection) -> TableResult<()> {
        let id = selection.column();
        let index = self.column_index(id)?;
        let selection = selection.validated(&self.columns[index])?;

        let replaced = self.query.upsert(selection, &self.columns[index]);
        self.refresh_query();
        log::debug!(
            "{} selection on column {}",
            if replaced { "replaced" } else { "added" },
            self.columns[index].name()
        );
        self.notify(if replaced {
            TableEvent::SelectionChanged { column: id }
        } else {
            TableEvent::SelectionAdded { column: id }
        });
        Ok(())
    }

    /// Change the bounds of an existing selection.
    ///
    /// An empty category set removes the selection instead. Inside
    /// [`DataTable::begin_selection_drag`] only the partition is refreshed.
    pub fn update_selection(
        &mut self,
        column: ColumnId,
        bounds: SelectionBounds,
    ) -> TableResult<()> {
        let index = self.column_index(column)?;
        if !self.query.has_selection(column) {
            return Err(TableError::NoSelection {
                column: self.columns[index].name().to_string(),
            });
        }

        if matches!(&bounds, SelectionBounds::Categories(set) if set.is_empty()) {
            let actual = self.columns[index].column_type();
            if actual != ColumnType::Categorical {
                return Err(TableError::TypeMismatch {
                    column: self.columns[index].name().to_string(),
                    expected: "categorical",
                    actual,
                });
            }
            self.query.remove(column);
            self.refresh_query();
            log::warn!(
                "empty category set on column {}; selection removed",
                self.columns[index].name()
            );
            self.notify(TableEvent::SelectionRemoved { column });
            return Ok(());
        }

        let selection = ColumnSelection::new(column, bounds).validated(&self.columns[index])?;
        self.query.upsert(selection, &self.columns[index]);
        if let Some(drag) = self.drag.as_mut() {
            drag.column = Some(column);
            self.query.repartition(self.tuple_count);
            self.query.set_aggregates_pending(true);
            self.notify(TableEvent::SelectionDragged { column });
        } else {
            self.refresh_query();
            self.notify(TableEvent::SelectionChanged { column });
        }
        Ok(())
    }

    pub fn remove_selection(&mut self, column: ColumnId) -> TableResult<ColumnSelection> {
        let index = self.column_index(column)?;
        let Some(removed) = self.query.remove(column) else {
            return Err(TableError::NoSelection {
                column: self.columns[index].name().to_string(),
            });
        };
        self.refresh_query();
        log::debug!("removed selection on column {}", self.columns[index].name());
        self.notify(TableEvent::SelectionRemoved { column });
        Ok(removed)
    }

    /// Remove whatever selection `column` has. Returns how many were removed (0 or 1).
    pub fn remove_all_selections_for_column(&mut self, column: ColumnId) -> TableResult<usize> {
        self.column_index(column)?;
        if !self.query.has_selection(column) {
            return Ok(0);
        }
        self.remove_selection(column)?;
        Ok(1)
    }

    /// Remove every selection. Returns how many were removed.
    pub fn remove_all_selections(&mut self) -> usize {
        let removed = self.query.clear();
        if removed == 0 {
            return 0;
        }
        self.refresh_query();
        log::debug!("cleared {removed} selections");
        self.notify(TableEvent::SelectionsCleared);
        removed
    }

    /// Start coalescing selection updates: statistics and joint histograms wait for
    /// [`DataTable::end_selection_drag`].
    pub fn begin_selection_drag(&mut self) {
        self.drag.get_or_insert_with(Drag::default);
    }

    /// Finish a drag. Returns true if deferred aggregates were recomputed.
    pub fn end_selection_drag(&mut self) -> bool {
        let Some(column) = self.drag.take().and_then(|drag| drag.column) else {
            return false;
        };
        if !self.query.aggregates_pending() {
            return false;
        }
        self.query.recompute_aggregates(&self.columns, &self.options);
        self.notify(TableEvent::SelectionChanged { column });
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // --- tuples ----------------------------------------------------------------------------

    /// Delete the queried tuples. Without an active query nothing is removed.
    pub fn remove_selected_tuples(&mut self) -> TableResult<usize> {
        if !self.query.is_partitioned() {
            return Ok(0);
        }
        let keep = self.query.queried_rows().negated();
        self.retain_tuples(&keep)
    }

    /// Delete the non-queried tuples. Without an active query nothing is removed.
    pub fn remove_unselected_tuples(&mut self) -> TableResult<usize> {
        if !self.query.is_partitioned() {
            return Ok(0);
        }
        let keep = self.query.queried_rows().clone();
        self.retain_tuples(&keep)
    }

    fn retain_tuples(&mut self, keep: &BitVec) -> TableResult<usize> {
        let removed = keep.count_zeros();
        if removed == 0 {
            return Ok(0);
        }
        for column in &mut self.columns {
            column.retain_rows(keep);
        }
        self.tuple_count = keep.count_ones();
        self.refresh_column_statistics()?;
        self.query.rebuild_masks(&self.columns);
        self.recompute_all();
        log::debug!("removed {removed} tuples ({} left)", self.tuple_count);
        self.notify(TableEvent::TuplesRemoved { count: removed });
        Ok(removed)
    }

    // --- settings --------------------------------------------------------------------------

    /// Rebin every histogram, 1D and 2D, overall and scoped.
    pub fn set_num_histogram_bins(&mut self, bins: usize) -> TableResult<()> {
        if bins == 0 {
            return Err(TableError::InvalidBinCount { bins });
        }
        if bins == self.options.num_histogram_bins {
            return Ok(());
        }

        for column in &mut self.columns {
            column.rebin(bins)?;
        }
        self.options.num_histogram_bins = bins;
        self.refresh_pair_histograms();
        self.query.recompute_aggregates(&self.columns, &self.options);
        log::debug!("histogram bin count set to {bins}");
        self.notify(TableEvent::HistogramBinCountChanged { bins });
        Ok(())
    }

    pub fn set_calculate_query_statistics(&mut self, enabled: bool) {
        if self.options.calculate_query_statistics == enabled {
            return;
        }
        self.options.calculate_query_statistics = enabled;
        self.query.recompute_aggregates(&self.columns, &self.options);
        self.notify(TableEvent::StatisticsSettingsChanged);
    }

    pub fn set_calculate_non_query_statistics(&mut self, enabled: bool) {
        if self.options.calculate_non_query_statistics == enabled {
            return;
        }
        self.options.calculate_non_query_statistics = enabled;
        self.query.recompute_aggregates(&self.columns, &self.options);
        self.notify(TableEvent::StatisticsSettingsChanged);
    }

    // --- recomputation ---------------------------------------------------------------------

    fn refresh_column_statistics(&mut self) -> TableResult<()> {
        let bins = self.options.num_histogram_bins;
        for column in &mut self.columns {
            column.refresh_statistics(bins)?;
        }
        Ok(())
    }

    fn refresh_pair_histograms(&mut self) {
        self.pair_histograms = if self.options.compute_pair_histograms {
            pair_histograms(&self.columns, None, self.options.num_histogram_bins)
        } else {
            Vec::new()
        };
        self.max_pair_histogram_bin_count = self
            .pair_histograms
            .iter()
            .map(Histogram2D::max_bin_count)
            .max()
            .unwrap_or(0);
    }

    /// Re-partition and rebuild the query aggregates.
    fn refresh_query(&mut self) {
        self.query.repartition(self.tuple_count);
        self.query.recompute_aggregates(&self.columns, &self.options);
    }

    fn recompute_all(&mut self) {
        let started = Instant::now();
        self.refresh_pair_histograms();
        self.refresh_query();
        log::trace!(
            "table aggregates recomputed in {:?} ({} columns, {} tuples)",
            started.elapsed(),
            self.columns.len(),
            self.tuple_count
        );
    }
}
