//! Unit tests for column flattening over realistic API entries

use serde_json::json;

use f1_data_downloader::flatten::{flatten, records};
use f1_data_downloader::Dataset;

use crate::support::result_entry;

fn results_dataset() -> Dataset {
    let entries = vec![result_entry(1, "max_verstappen"), result_entry(2, "perez")];
    Dataset::from_records("Results", records(&entries))
}

#[test]
fn test_result_columns_are_rewritten() {
    let dataset = results_dataset();
    let columns = dataset.columns();

    for expected in [
        "driver_driverId",
        "driver_nationality",
        "constructor_constructorId",
        "time_millis",
        "FastestLap_time_time",
        "FastestLap_avgSpeed_speed",
    ] {
        assert!(
            columns.iter().any(|c| c == expected),
            "missing column {expected} in {columns:?}"
        );
    }
    assert!(!columns.iter().any(|c| c.contains('.')));
    assert_eq!(dataset.value(1, "driver_driverId"), Some("perez"));
}

#[test]
fn test_flatten_is_idempotent() {
    let once = results_dataset();
    let twice = flatten(once.clone());

    assert_eq!(once.columns(), twice.columns());
    assert_eq!(once.rows(), twice.rows());
}

#[test]
fn test_flatten_preserves_row_order() {
    let dataset = flatten(results_dataset());
    assert_eq!(dataset.value(0, "position"), Some("1"));
    assert_eq!(dataset.value(1, "position"), Some("2"));
}

#[test]
fn test_nested_levels_joined_with_underscore() {
    let entries = vec![json!({
        "Driver": {"code": "HAM"},
        "FastestLap": {
            "rank": "1",
            "Time": {"time": "1:32.100"},
            "AverageSpeed": {"units": "kph", "speed": "220.5"}
        },
        "Circuit": {"Location": {"lat": "45.6", "locality": "Monza"}},
        "Location": {"locality": "Monza"}
    })];
    let dataset = Dataset::from_records("Results", records(&entries));

    assert_eq!(
        dataset.columns(),
        [
            "driver_code",
            "FastestLap_rank",
            "FastestLap_time_time",
            "FastestLap_avgSpeed_units",
            "FastestLap_avgSpeed_speed",
            "circuit_Location_lat",
            "circuit_Location_locality",
            "Location_locality",
        ]
    );
    assert_eq!(dataset.value(0, "FastestLap_avgSpeed_speed"), Some("220.5"));

    let again = flatten(dataset.clone());
    assert_eq!(again, dataset);
}
