//! Typed in-memory columns for EDEN tables.
//!
//! This crate focuses on:
//! - Column storage for double, temporal, categorical and derived bivariate variables.
//! - Row masks ([`BitVec`]) used to describe query / non-query scopes.
//! - Summary statistics and histograms whose bins are aligned across scopes.
//! - Joint (2D) histograms for density rendering of column pairs.

#![forbid(unsafe_code)]

mod bitmap;
mod column;
mod error;
mod histogram;
mod histogram2d;
mod stats;
mod types;

pub use crate::bitmap::{BitVec, IterOnes};
pub use crate::column::{Column, ColumnBuilder, ColumnSchema};
pub use crate::error::{ColumnError, ColumnResult};
pub use crate::histogram::{Binning, Histogram};
pub use crate::histogram2d::Histogram2D;
pub use crate::stats::{
    percentile, CategoricalStatistics, ColumnStatistics, NumericStatistics, NumericSummary,
};
pub use crate::types::{axis_to_temporal, temporal_to_axis, ColumnId, ColumnType, Value};
