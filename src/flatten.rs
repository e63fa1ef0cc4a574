//! JSON normalization and column flattening
//!
//! API entries are nested JSON objects. [`normalize`] turns one entry into a
//! [`Record`] whose nested object keys are joined with `.` (`Driver.nationality`,
//! `FastestLap.Time.time`). [`flatten`] then joins every level with `_` and
//! shortens the well-known segments wherever they occur, so those become
//! `driver_nationality` and `FastestLap_time_time`.

use serde_json::Value;

use crate::{Dataset, Record};

/// Separator used when joining nested object keys
pub const KEY_SEPARATOR: char = '.';

/// Separator used in flattened column names
pub const FLAT_SEPARATOR: &str = "_";

/// Ordered segment substitutions applied anywhere in a flattened name
pub const PREFIX_REWRITES: [(&str, &str); 5] = [
    ("Driver_", "driver_"),
    ("Constructor_", "constructor_"),
    ("Circuit_", "circuit_"),
    ("Time_", "time_"),
    ("AverageSpeed_", "avgSpeed_"),
];

/// Rewritten name for a column, or `None` if it is already flat.
///
/// Every `.` becomes `_`, then each substitution is applied to all of its
/// occurrences. The replacements are lowercase, so they never match again.
pub fn rewrite_column(name: &str) -> Option<String> {
    let mut flat = name.replace(KEY_SEPARATOR, FLAT_SEPARATOR);
    for (segment, replacement) in PREFIX_REWRITES {
        if flat.contains(segment) {
            flat = flat.replace(segment, replacement);
        }
    }
    (flat != name).then_some(flat)
}

/// Apply the prefix rewrites to one record
pub fn flatten_record(record: &mut Record) {
    record.rename_columns(rewrite_column);
}

/// Apply the prefix rewrites to every row of a dataset.
///
/// Row order is preserved and unrecognized columns are left alone, so a
/// second pass over the result changes nothing.
pub fn flatten(dataset: Dataset) -> Dataset {
    let name = dataset.name().to_string();
    let rows = dataset.into_rows().into_iter().map(|mut record| {
        flatten_record(&mut record);
        record
    });
    Dataset::from_records(name, rows)
}

/// Normalize one JSON entry into a record with dotted column names.
///
/// Scalars become text (`null` becomes an empty cell), nested objects are
/// expanded recursively and arrays are kept as compact JSON text.
pub fn normalize(entry: &Value) -> Record {
    let mut record = Record::new();
    match entry {
        Value::Object(map) => {
            for (key, value) in map {
                push_value(&mut record, key, value);
            }
        }
        other => record.insert("value", cell_text(other)),
    }
    record
}

/// Normalize and flatten a batch of entries, preserving their order
pub fn records(entries: &[Value]) -> Vec<Record> {
    entries
        .iter()
        .map(|entry| {
            let mut record = normalize(entry);
            flatten_record(&mut record);
            record
        })
        .collect()
}

fn push_value(record: &mut Record, column: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let nested_column = format!("{column}{KEY_SEPARATOR}{key}");
                push_value(record, &nested_column, nested);
            }
        }
        other => record.insert(column, cell_text(other)),
    }
}

/// Text rendering of a JSON value for a CSV cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
