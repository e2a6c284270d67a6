use eden_columnar::{ColumnError, ColumnId, ColumnType};

pub type TableResult<T> = Result<T, TableError>;

/// Errors returned by table and query mutations.
///
/// Every mutation validates before it changes anything, so an error always leaves the table
/// exactly as it was. Two families matter to callers:
/// - domain violations (bad bounds, unknown categories, disabling the last column, ...) are
///   input errors and should be reported to the user;
/// - inconsistent indices (a stale [`ColumnId`] or an out-of-range position) are programming
///   errors in the caller.
///
/// Statistics over an empty scope are not errors; they come back as `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("invalid range on {column}: min {min} is greater than max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },

    #[error("range [{min}, {max}] lies outside the values of {column}")]
    RangeOutsideDomain { column: String, min: f64, max: f64 },

    #[error("categorical selection on {column} must contain at least one category")]
    EmptyCategorySelection { column: String },

    #[error("unknown category {category:?} in column {column}")]
    UnknownCategory { column: String, category: String },

    #[error("column {column} has no active selection")]
    NoSelection { column: String },

    #[error("cannot disable or remove {column}: it is the last enabled column")]
    LastEnabledColumn { column: String },

    #[error("duplicate column name: {name}")]
    DuplicateColumnName { name: String },

    #[error("column {column} is disabled")]
    ColumnDisabled { column: String },

    #[error("column {column} has type {actual:?}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: ColumnType,
    },

    #[error("row {row} has {actual} values, expected {expected}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("histogram bin count must be at least 1, got {bins}")]
    InvalidBinCount { bins: usize },

    #[error("column order must list every column exactly once")]
    InvalidColumnOrder,

    #[error("column index {index} is out of bounds for {len} columns")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    #[error("row {row} is out of bounds for {len} tuples")]
    RowOutOfBounds { row: usize, len: usize },

    #[error("column {0} is not part of this table")]
    StaleColumn(ColumnId),

    #[error(transparent)]
    Column(#[from] ColumnError),
}

impl TableError {
    /// Lookups through a stale id or index. These indicate a bug in the caller.
    pub fn is_inconsistent_index(&self) -> bool {
        matches!(
            self,
            TableError::ColumnIndexOutOfBounds { .. }
                | TableError::RowOutOfBounds { .. }
                | TableError::StaleColumn(_)
        )
    }

    /// Input rejected because it violates the data model.
    pub fn is_domain_violation(&self) -> bool {
        !self.is_inconsistent_index()
    }
}
