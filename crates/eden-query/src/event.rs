use crate::table::DataTable;
use eden_columnar::ColumnId;
use serde::{Deserialize, Serialize};

/// A completed mutation of a [`DataTable`].
///
/// Events are published once per successful mutation, after every derived aggregate is
/// consistent again. Failed mutations publish nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableEvent {
    /// The whole table was replaced or cleared.
    Reset,
    SelectionAdded { column: ColumnId },
    SelectionRemoved { column: ColumnId },
    /// Bounds of an existing selection changed and all aggregates were refreshed.
    SelectionChanged { column: ColumnId },
    /// Bounds changed during a drag; only the partition is current.
    SelectionDragged { column: ColumnId },
    SelectionsCleared,
    ColumnEnabled { column: ColumnId },
    ColumnDisabled { column: ColumnId },
    ColumnRenamed { column: ColumnId, old_name: String },
    ColumnsReordered,
    ColumnAdded { column: ColumnId },
    ColumnRemoved { column: ColumnId },
    TuplesAdded { count: usize },
    TuplesRemoved { count: usize },
    HistogramBinCountChanged { bins: usize },
    StatisticsSettingsChanged,
}

impl TableEvent {
    /// Whether the queried/non-queried partition may differ after this event.
    pub fn changes_partition(&self) -> bool {
        !matches!(
            self,
            TableEvent::ColumnRenamed { .. }
                | TableEvent::ColumnsReordered
                | TableEvent::HistogramBinCountChanged { .. }
                | TableEvent::StatisticsSettingsChanged
        )
    }
}

/// Receives [`TableEvent`]s together with a read-only view of the table.
pub trait TableListener {
    fn on_event(&mut self, table: &DataTable, event: &TableEvent);
}

impl<F> TableListener for F
where
    F: FnMut(&DataTable, &TableEvent),
{
    fn on_event(&mut self, table: &DataTable, event: &TableEvent) {
        self(table, event)
    }
}

/// Handle returned by [`DataTable::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}
