#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use eden_columnar::{Column, ColumnId, ColumnSchema, ColumnType, Value};

pub fn build_column(
    id: u32,
    name: &str,
    column_type: ColumnType,
    values: &[Value],
    bins: usize,
) -> Column {
    let mut builder = Column::builder(ColumnId::new(id), ColumnSchema::new(name, column_type));
    for v in values {
        builder.append(v).unwrap();
    }
    builder.finish(bins).unwrap()
}

pub fn double_column(id: u32, name: &str, values: &[f64], bins: usize) -> Column {
    let values: Vec<Value> = values.iter().map(|&v| Value::Double(v)).collect();
    build_column(id, name, ColumnType::Double, &values, bins)
}

pub fn categorical_column(id: u32, name: &str, values: &[&str]) -> Column {
    let values: Vec<Value> = values.iter().map(|&v| Value::from(v)).collect();
    build_column(id, name, ColumnType::Categorical, &values, 10)
}

pub fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}
