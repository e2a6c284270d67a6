mod common;

use common::id;
use eden_query::{
    ColumnSchema, ColumnSelection, ColumnType, DataTable, TableError, TableOptions, Value,
    DEFAULT_HISTOGRAM_BINS,
};
use pretty_assertions::assert_eq;

#[test]
fn defaults() {
    let options = TableOptions::default();
    assert_eq!(options.num_histogram_bins, DEFAULT_HISTOGRAM_BINS);
    assert_eq!(options.num_histogram_bins, 50);
    assert!(options.calculate_query_statistics);
    assert!(options.calculate_non_query_statistics);
    assert!(options.compute_pair_histograms);
    assert_eq!(DataTable::new().options(), &options);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let options: TableOptions =
        serde_json::from_str(r#"{ "num_histogram_bins": 20, "compute_pair_histograms": false }"#)
            .unwrap();
    assert_eq!(
        options,
        TableOptions {
            num_histogram_bins: 20,
            compute_pair_histograms: false,
            ..TableOptions::default()
        }
    );

    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json["calculate_query_statistics"], serde_json::json!(true));
}

#[test]
fn invalid_options_are_rejected() {
    let options: TableOptions = serde_json::from_str(r#"{ "num_histogram_bins": 0 }"#).unwrap();
    assert_eq!(
        DataTable::with_options(options).unwrap_err(),
        TableError::InvalidBinCount { bins: 0 }
    );
}

#[test]
fn options_shape_the_table() {
    let options = TableOptions {
        num_histogram_bins: 4,
        calculate_non_query_statistics: false,
        compute_pair_histograms: false,
        ..TableOptions::default()
    };
    let mut table = DataTable::with_options(options).unwrap();
    table
        .set_data(
            vec![
                ColumnSchema::new("x", ColumnType::Double),
                ColumnSchema::new("y", ColumnType::Double),
            ],
            (0..8).map(|i| vec![Value::Double(i as f64), Value::Double(-(i as f64))]),
        )
        .unwrap();
    let x = id(&table, "x");
    table
        .add_selection(ColumnSelection::double_range(x, 0.0, 3.0))
        .unwrap();

    let histogram = table.column_by_id(x).unwrap().statistics().histogram().unwrap();
    assert_eq!(histogram.counts(), &[2, 2, 2, 2]);
    assert!(table.pair_histograms().is_empty());
    assert!(table.query().histograms2d().is_empty());
    assert!(table.query().non_query_statistics(x).is_none());
    let queried = table.query().query_statistics(x).unwrap();
    assert_eq!(queried.histogram().unwrap().counts(), &[2, 2, 0, 0]);
}
