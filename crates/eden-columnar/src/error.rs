#![forbid(unsafe_code)]

use crate::types::ColumnType;

pub type ColumnResult<T> = Result<T, ColumnError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColumnError {
    #[error("value of type {found} cannot be stored in {expected:?} column {column}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: &'static str,
    },

    #[error("non-finite value {value} cannot be stored in column {column}")]
    NonFiniteValue { column: String, value: f64 },

    #[error("column {column} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("bivariate column {column} cannot be used as a single histogram axis")]
    NotAnAxis { column: String },

    #[error("histogram bin count must be at least 1")]
    InvalidBinCount,
}
