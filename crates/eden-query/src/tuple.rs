use crate::error::{TableError, TableResult};
use crate::table::DataTable;
use eden_columnar::{ColumnId, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Borrowed view of one row. Values follow the table's current column order.
#[derive(Clone, Copy)]
pub struct TupleRef<'a> {
    table: &'a DataTable,
    row: usize,
}

impl<'a> TupleRef<'a> {
    pub(crate) fn new(table: &'a DataTable, row: usize) -> Self {
        Self { table, row }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Number of values, one per column (enabled or not).
    pub fn len(&self) -> usize {
        self.table.column_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_queried(&self) -> bool {
        self.table.query().is_queried(self.row)
    }

    /// Value of the column at display position `index`.
    pub fn value(&self, index: usize) -> TableResult<Value> {
        let column = self.table.column(index)?;
        column.value(self.row).ok_or(TableError::RowOutOfBounds {
            row: self.row,
            len: self.table.tuple_count(),
        })
    }

    pub fn value_for(&self, column: ColumnId) -> TableResult<Value> {
        let column = self.table.column_by_id(column)?;
        column.value(self.row).ok_or(TableError::RowOutOfBounds {
            row: self.row,
            len: self.table.tuple_count(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + 'a {
        let row = self.row;
        self.table
            .columns()
            .iter()
            .map(move |c| c.value(row).unwrap_or(Value::Missing))
    }

    /// Owned copy of this row.
    pub fn values(&self) -> Tuple {
        Tuple {
            values: self.iter().collect(),
            queried: self.is_queried(),
        }
    }
}

impl fmt::Debug for TupleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleRef")
            .field("row", &self.row)
            .field("queried", &self.is_queried())
            .finish()
    }
}

/// Owned row snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub values: Vec<Value>,
    pub queried: bool,
}
