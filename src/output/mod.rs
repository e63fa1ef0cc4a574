//! Data output writers

use std::path::PathBuf;

use crate::Dataset;

pub mod csv;

pub use self::csv::CsvExporter;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Result of exporting one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// File written
    Written {
        /// Path of the written file
        path: PathBuf,
        /// Data rows written (header excluded)
        rows: usize,
    },
    /// Dataset was empty; nothing written
    Skipped {
        /// Dataset name
        name: String,
    },
}

/// Writes assembled datasets to their destination
pub trait DatasetExporter {
    /// Export `dataset` under `name`; empty datasets are skipped
    fn export(&self, dataset: &Dataset, name: &str) -> OutputResult<ExportOutcome>;
}
