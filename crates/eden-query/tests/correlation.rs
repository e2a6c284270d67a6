mod common;

use common::{day, double_pairs, id, load, mixed_table};
use eden_query::{ColumnSelection, ColumnType, CorrelationEngine, Scope, TableError, Value};
use pretty_assertions::assert_eq;

#[test]
fn anticorrelated_columns() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y = [8.0, 6.0, 4.0, 2.0];
    let table = double_pairs(&x, &y);
    let r = CorrelationEngine::new()
        .correlation(&table, id(&table, "x"), id(&table, "y"), Scope::All)
        .unwrap()
        .unwrap();
    assert!((r + 1.0).abs() < 1e-12, "r = {r}");
}

#[test]
fn queried_scope_uses_only_queried_rows() {
    // Linear on the first half, reversed on the second half.
    let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let y = [1.0, 2.0, 3.0, 3.0, 2.0, 1.0];
    let mut table = double_pairs(&x, &y);
    let (xi, yi) = (id(&table, "x"), id(&table, "y"));
    let engine = CorrelationEngine::new();

    // No selection: queried means everything, non-queried means nothing.
    let all = engine.correlation(&table, xi, yi, Scope::All).unwrap();
    assert_eq!(engine.correlation(&table, xi, yi, Scope::Queried).unwrap(), all);
    assert_eq!(engine.correlation(&table, xi, yi, Scope::NonQueried).unwrap(), None);

    table
        .add_selection(ColumnSelection::double_range(xi, 1.0, 3.0))
        .unwrap();
    let queried = engine
        .correlation(&table, xi, yi, Scope::Queried)
        .unwrap()
        .unwrap();
    let rest = engine
        .correlation(&table, xi, yi, Scope::NonQueried)
        .unwrap()
        .unwrap();
    assert!((queried - 1.0).abs() < 1e-12);
    assert!((rest + 1.0).abs() < 1e-12);
}

#[test]
fn missing_values_are_skipped_pairwise() {
    let rows = vec![
        vec![Value::Double(1.0), Value::Double(2.0)],
        vec![Value::Missing, Value::Double(100.0)],
        vec![Value::Double(2.0), Value::Double(4.0)],
        vec![Value::Double(3.0), Value::Missing],
    ];
    let table = load(&[("x", ColumnType::Double), ("y", ColumnType::Double)], rows);
    let engine = CorrelationEngine::new();
    let r = engine
        .correlation(&table, id(&table, "x"), id(&table, "y"), Scope::All)
        .unwrap();
    // Only two complete pairs remain, and they lie on a line.
    assert!((r.unwrap() - 1.0).abs() < 1e-12);

    let single = load(
        &[("x", ColumnType::Double), ("y", ColumnType::Double)],
        vec![vec![Value::Double(1.0), Value::Double(2.0)]],
    );
    let r = engine
        .correlation(&single, id(&single, "x"), id(&single, "y"), Scope::All)
        .unwrap();
    assert_eq!(r, None);
}

#[test]
fn temporal_columns_are_numeric() {
    let rows = (1..=5)
        .map(|d| vec![Value::Temporal(day(d)), Value::Double(f64::from(d) * 3.0)])
        .collect();
    let table = load(
        &[("when", ColumnType::Temporal), ("v", ColumnType::Double)],
        rows,
    );
    let r = CorrelationEngine::new()
        .correlation(&table, id(&table, "when"), id(&table, "v"), Scope::All)
        .unwrap()
        .unwrap();
    assert!((r - 1.0).abs() < 1e-9);
}

#[test]
fn non_numeric_and_disabled_columns_are_rejected() {
    let mut table = mixed_table(40, 4);
    let (a, b, g) = (id(&table, "a"), id(&table, "b"), id(&table, "g"));
    let engine = CorrelationEngine::new();

    let err = engine.correlation(&table, a, g, Scope::All).unwrap_err();
    assert!(matches!(err, TableError::TypeMismatch { .. }));

    table.disable_column(b).unwrap();
    let err = engine.correlation(&table, a, b, Scope::All).unwrap_err();
    assert!(matches!(err, TableError::ColumnDisabled { .. }));
}

#[test]
fn matrix_covers_enabled_numeric_columns() {
    let mut table = mixed_table(120, 8);
    let (a, b, t) = (id(&table, "a"), id(&table, "b"), id(&table, "t"));
    let engine = CorrelationEngine::new();

    let matrix = engine.correlation_matrix(&table, Scope::All);
    assert_eq!(matrix.columns(), &[a, b, t]);
    assert_eq!(matrix.get(a, b), matrix.get(b, a));
    assert_eq!(
        matrix.get(a, t),
        engine.correlation(&table, a, t, Scope::All).unwrap()
    );
    let diagonal = matrix.get(b, b).unwrap();
    assert!((diagonal - 1.0).abs() < 1e-12);
    assert_eq!(matrix.row(t).unwrap().len(), 3);

    table.disable_column(b).unwrap();
    let matrix = engine.correlation_matrix(&table, Scope::All);
    assert_eq!(matrix.columns(), &[a, t]);
    assert_eq!(matrix.get(a, b), None);
}

#[test]
fn inexact_constant_columns_are_undefined() {
    let engine = CorrelationEngine::new();
    for value in [0.1, 0.7] {
        let table = double_pairs(&[1.0, 2.0, 3.0], &[value; 3]);
        let (x, y) = (id(&table, "x"), id(&table, "y"));
        assert_eq!(engine.correlation(&table, x, y, Scope::All).unwrap(), None);
        assert_eq!(engine.correlation(&table, y, x, Scope::All).unwrap(), None);
        assert_eq!(engine.correlation_matrix(&table, Scope::All).get(y, y), None);
    }
}
