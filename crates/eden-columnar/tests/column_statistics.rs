mod common;

use common::{build_column, categorical_column, day, double_column};
use eden_columnar::{
    axis_to_temporal, Binning, BitVec, Column, ColumnError, ColumnId, ColumnSchema,
    ColumnStatistics, ColumnType, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn overall_statistics_of_double_column() {
    let column = double_column(0, "x", &[1.0, 2.0, 3.0, 4.0, 5.0], 4);
    let stats = column.statistics().as_numeric().unwrap();

    assert_eq!(stats.count(), 5);
    assert_eq!(stats.range(), Some((1.0, 5.0)));
    assert_eq!(stats.mean(), Some(3.0));
    assert_eq!(stats.median(), Some(3.0));
    assert_eq!(stats.percentile25(), Some(2.0));
    assert_eq!(stats.percentile75(), Some(4.0));
    assert_eq!(stats.histogram().counts(), &[1, 1, 1, 2]);
}

#[test]
fn nan_and_missing_are_excluded_from_mass() {
    let values = [
        Value::Double(1.0),
        Value::Missing,
        Value::Double(f64::NAN),
        Value::Double(3.0),
    ];
    let column = build_column(0, "x", ColumnType::Double, &values, 2);
    let stats = column.statistics();

    assert_eq!(stats.count(), 2);
    assert_eq!(stats.missing_count(), 2);
    assert_eq!(stats.histogram().unwrap().total(), 2);
    assert_eq!(column.value(1), Some(Value::Missing));
    assert_eq!(column.value(2), Some(Value::Missing));
    assert_eq!(column.value(9), None);
}

#[test]
fn scoped_histograms_share_overall_bins() {
    let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0];
    let column = double_column(0, "x", &values, 5);
    let scope = BitVec::from_fn(column.len(), |row| row >= 5);

    let subset = column.compute_statistics(Some(&scope));
    let rest = column.compute_statistics(Some(&scope.negated()));

    let overall_binning = column.statistics().histogram().unwrap().binning().clone();
    assert_eq!(subset.histogram().unwrap().binning(), &overall_binning);
    assert_eq!(rest.histogram().unwrap().binning(), &overall_binning);

    // Overall bins are [0,2) [2,4) [4,6) [6,8) [8,10].
    assert_eq!(subset.histogram().unwrap().counts(), &[0, 0, 1, 2, 2]);
    assert_eq!(rest.histogram().unwrap().counts(), &[2, 2, 1, 0, 0]);
    assert_eq!(subset.as_numeric().unwrap().range(), Some((5.0, 10.0)));
}

#[test]
fn statistics_ordering_holds_for_uneven_data() {
    let values = [9.5, -3.0, 0.25, 0.25, 100.0, 7.0, 7.0, 7.0, -40.0, 2.0, 3.5];
    let column = double_column(0, "x", &values, 8);
    for scope in [
        None,
        Some(BitVec::from_fn(values.len(), |r| r % 2 == 0)),
        Some(BitVec::from_fn(values.len(), |r| r % 3 == 1)),
    ] {
        let stats = column.compute_statistics(scope.as_ref());
        let s = stats.as_numeric().unwrap().summary().unwrap().clone();
        assert!(s.min <= s.percentile25);
        assert!(s.percentile25 <= s.median);
        assert!(s.median <= s.percentile75);
        assert!(s.percentile75 <= s.max);
        assert!(s.lower_whisker >= s.min && s.upper_whisker <= s.max);
    }
}

#[test]
fn empty_scope_reports_no_data() {
    let column = double_column(0, "x", &[1.0, 2.0], 3);
    let none = BitVec::with_len_all_false(2);
    let stats = column.compute_statistics(Some(&none));
    let numeric = stats.as_numeric().unwrap();

    assert_eq!(numeric.count(), 0);
    assert_eq!(numeric.mean(), None);
    assert_eq!(numeric.median(), None);
    assert_eq!(numeric.histogram().counts(), &[0, 0, 0]);
}

#[test]
fn categorical_histogram_keeps_insertion_order() {
    let column = categorical_column(0, "c", &["B", "A", "B", "C", "A", "B"]);
    let stats = column.statistics().as_categorical().unwrap();

    let names: Vec<&str> = stats.categories().iter().map(|c| c.as_ref()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
    assert_eq!(stats.histogram().counts(), &[3, 2, 1]);
    assert_eq!(stats.mode(), Some("B"));

    // Only the "A" and "C" rows.
    let scope = BitVec::from_fn(column.len(), |r| matches!(r, 1 | 3 | 4));
    let scoped = column.compute_statistics(Some(&scope));
    assert_eq!(scoped.histogram().unwrap().counts(), &[0, 2, 1]);
    assert_eq!(scoped.as_categorical().unwrap().categories().len(), 3);
}

#[test]
fn temporal_column_summarizes_on_epoch_axis() {
    let values: Vec<Value> = [1, 2, 3, 5]
        .iter()
        .map(|&d| Value::Temporal(day(d)))
        .collect();
    let column = build_column(0, "t", ColumnType::Temporal, &values, 4);
    let stats = column.statistics().as_numeric().unwrap();

    assert_eq!(stats.min().and_then(axis_to_temporal), Some(day(1)));
    assert_eq!(stats.max().and_then(axis_to_temporal), Some(day(5)));
    let midday = day(2) + chrono::Duration::hours(12);
    assert_eq!(stats.median().and_then(axis_to_temporal), Some(midday));
    assert_eq!(stats.histogram().counts(), &[1, 1, 1, 1]);
    assert!(matches!(column.statistics(), ColumnStatistics::Temporal(_)));
}

#[test]
fn rebin_replaces_histograms_without_touching_summary() {
    let mut column = double_column(0, "x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 10);
    let before = column.statistics().as_numeric().unwrap().summary().cloned();

    column.rebin(3).unwrap();
    let stats = column.statistics().as_numeric().unwrap();
    assert_eq!(stats.histogram().bin_count(), 3);
    assert_eq!(stats.histogram().total(), 6);
    assert_eq!(stats.summary().cloned(), before);
    assert_eq!(column.rebin(0), Err(ColumnError::InvalidBinCount));
}

#[test]
fn builder_rejects_mismatched_values() {
    let schema = ColumnSchema::new("x", ColumnType::Double);
    let mut builder = Column::builder(ColumnId::new(3), schema);
    let err = builder.append(&Value::from("oops")).unwrap_err();
    assert_eq!(
        err,
        ColumnError::TypeMismatch {
            column: "x".to_string(),
            expected: ColumnType::Double,
            found: "category",
        }
    );
    assert!(builder.is_empty());
}

#[test]
fn infinite_doubles_are_rejected() {
    let schema = ColumnSchema::new("x", ColumnType::Double);
    let mut builder = Column::builder(ColumnId::new(4), schema);
    builder.append(&Value::Double(1.0)).unwrap();
    builder.append(&Value::Double(f64::NAN)).unwrap();
    let err = builder.append(&Value::Double(f64::INFINITY)).unwrap_err();
    assert_eq!(
        err,
        ColumnError::NonFiniteValue {
            column: "x".to_string(),
            value: f64::INFINITY,
        }
    );
    assert_eq!(builder.len(), 2);

    let column = builder.finish(4).unwrap();
    let stats = column.statistics().as_numeric().unwrap();
    assert_eq!(stats.count(), 1);
    assert_eq!(stats.missing_count(), 1);
    assert_eq!(stats.std_dev(), Some(0.0));
}

#[test]
fn retain_rows_then_refresh() {
    let mut column = categorical_column(0, "c", &["A", "B", "A", "C"]);
    column.retain_rows(&BitVec::from_fn(4, |r| r != 1));
    column.refresh_statistics(10).unwrap();

    let stats = column.statistics().as_categorical().unwrap();
    assert_eq!(column.len(), 3);
    assert_eq!(stats.count_for("B"), Some(0));
    assert_eq!(stats.count_for("A"), Some(2));
    assert_eq!(column.value(2), Some(Value::from("C")));
}

#[test]
fn bivariate_column_pairs_source_axes() {
    let x = double_column(0, "x", &[1.0, 2.0, f64::NAN], 4);
    let y = double_column(1, "y", &[10.0, 20.0, 30.0], 4);
    let pair = Column::bivariate(ColumnId::new(2), "x/y", &x, &y, 4).unwrap();

    assert_eq!(pair.column_type(), ColumnType::Bivariate);
    assert_eq!(
        pair.bivariate_sources(),
        Some([ColumnId::new(0), ColumnId::new(1)])
    );
    assert_eq!(pair.pair(1), Some((2.0, 20.0)));
    assert_eq!(pair.value(2), Some(Value::Missing));
    assert!(matches!(pair.binning(), Err(ColumnError::NotAnAxis { .. })));

    let ColumnStatistics::Bivariate { x: sx, y: sy } = pair.statistics() else {
        panic!("expected bivariate statistics");
    };
    assert_eq!(sx.count(), 2);
    assert_eq!(sy.mean(), Some(20.0));

    let c = categorical_column(3, "c", &["A", "B", "C"]);
    assert!(Column::bivariate(ColumnId::new(4), "bad", &x, &c, 4).is_err());
}

#[test]
fn categorical_binning_ignores_bin_count() {
    let column = categorical_column(0, "c", &["A", "B"]);
    assert_eq!(
        column.binning_with(50).unwrap(),
        Binning::Categorical { categories: 2 }
    );
}

#[test]
fn statistics_snapshot_serializes_by_variant() {
    let column = double_column(0, "x", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 2);
    let json = serde_json::to_value(column.statistics()).unwrap();

    let stats = &json["Double"];
    assert_eq!(stats["count"], serde_json::json!(8));
    assert_eq!(stats["summary"]["mean"], serde_json::json!(5.0));
    assert_eq!(stats["summary"]["std_dev"], serde_json::json!(2.0));
    assert_eq!(stats["histogram"]["counts"], serde_json::json!([6, 2]));
}
