//! The EDEN data table and its live brushing query.
//!
//! A [`DataTable`] owns typed columns, the active [`Query`] (a conjunction of per-column
//! [`ColumnSelection`]s) and the aggregates views draw from: query / non-query statistics,
//! joint histograms and, on request, correlations via [`CorrelationEngine`].

mod correlation;
mod error;
mod event;
mod options;
mod query;
mod selection;
mod table;
mod tuple;

pub use crate::correlation::{CorrelationEngine, CorrelationMatrix};
pub use crate::event::{ListenerId, TableEvent, TableListener};
pub use crate::options::{TableOptions, DEFAULT_HISTOGRAM_BINS};
pub use crate::query::{Query, QueryState, Scope};
pub use crate::selection::{ColumnSelection, SelectionBounds};
pub use crate::table::DataTable;
pub use crate::tuple::{Tuple, TupleRef};

pub use crate::error::{TableError, TableResult};

pub use eden_columnar::{
    BitVec, Binning, CategoricalStatistics, Column, ColumnError, ColumnId, ColumnSchema,
    ColumnStatistics, ColumnType, Histogram, Histogram2D, NumericStatistics, Value,
};
