#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use eden_query::{ColumnId, ColumnSchema, ColumnType, DataTable, TableEvent, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub fn load(schema: &[(&str, ColumnType)], rows: Vec<Vec<Value>>) -> DataTable {
    let schema = schema
        .iter()
        .map(|(name, column_type)| ColumnSchema::new(*name, *column_type))
        .collect();
    let mut table = DataTable::new();
    table.set_data(schema, rows).unwrap();
    table
}

/// Single double column named `x`.
pub fn doubles(values: &[f64]) -> DataTable {
    let rows = values.iter().map(|&v| vec![Value::Double(v)]).collect();
    load(&[("x", ColumnType::Double)], rows)
}

/// Two double columns `x` and `y` zipped row by row.
pub fn double_pairs(x: &[f64], y: &[f64]) -> DataTable {
    let rows = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| vec![Value::Double(a), Value::Double(b)])
        .collect();
    load(&[("x", ColumnType::Double), ("y", ColumnType::Double)], rows)
}

pub fn id(table: &DataTable, name: &str) -> ColumnId {
    table.column_by_name(name).unwrap().id()
}

pub fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Record every event published by `table`.
pub fn record(table: &mut DataTable) -> Rc<RefCell<Vec<TableEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    table.subscribe(move |_: &DataTable, event: &TableEvent| {
        sink.borrow_mut().push(event.clone());
    });
    events
}

/// Deterministic pseudo-random stream in `[0, 1)`.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// A mixed table of `rows` tuples: `a`, `b` doubles (with some missing values), `t` temporal
/// and `g` categorical.
pub fn mixed_table(rows: usize, seed: u64) -> DataTable {
    let mut rng = Lcg::new(seed);
    let groups = ["red", "green", "blue", "amber"];
    let data = (0..rows)
        .map(|i| {
            let a = if i % 7 == 3 {
                Value::Missing
            } else {
                Value::Double((rng.next_f64() * 100.0).round())
            };
            let b = Value::Double(rng.next_f64() * 10.0 - 5.0);
            let t = if i % 11 == 5 {
                Value::Missing
            } else {
                Value::Temporal(day(1 + (i % 28) as u32))
            };
            let g = Value::from(groups[(rng.next_f64() * 4.0) as usize % 4]);
            vec![a, b, t, g]
        })
        .collect();
    load(
        &[
            ("a", ColumnType::Double),
            ("b", ColumnType::Double),
            ("t", ColumnType::Temporal),
            ("g", ColumnType::Categorical),
        ],
        data,
    )
}
