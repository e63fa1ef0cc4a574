//! CSV output writer implementation
//!
//! Files are UTF-8 with a leading byte-order mark so spreadsheet tools detect
//! the encoding. Each dataset is written to a temporary file first and renamed
//! into place, so a file on disk always holds one complete dataset.

use csv::Writer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{DatasetExporter, ExportOutcome, OutputError, OutputResult};
use crate::Dataset;

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File extension of exported datasets
pub const CSV_EXTENSION: &str = "csv";

/// Exports datasets as `<output_dir>/<name>.csv`
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    /// Create the exporter, creating the output directory if needed
    pub fn create<P: AsRef<Path>>(output_dir: P) -> OutputResult<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(|e| {
            OutputError::IoError(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;
        debug!("Output directory ready: {}", output_dir.display());
        Ok(Self { output_dir })
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination path for a dataset name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.{CSV_EXTENSION}"))
    }
}

impl DatasetExporter for CsvExporter {
    fn export(&self, dataset: &Dataset, name: &str) -> OutputResult<ExportOutcome> {
        if dataset.is_empty() {
            return Ok(ExportOutcome::Skipped {
                name: name.to_string(),
            });
        }

        let path = self.path_for(name);
        let tmp_path = path.with_extension(format!("{CSV_EXTENSION}.tmp"));

        if let Err(e) = write_dataset(&tmp_path, dataset) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            OutputError::IoError(format!("Failed to move {} into place: {}", path.display(), e))
        })?;

        info!("Saved {} rows → {}", dataset.len(), path.display());
        Ok(ExportOutcome::Written {
            path,
            rows: dataset.len(),
        })
    }
}

fn write_dataset(path: &Path, dataset: &Dataset) -> OutputResult<()> {
    let file = File::create(path)
        .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
    let mut buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
    buf_writer
        .write_all(UTF8_BOM)
        .map_err(|e| OutputError::IoError(format!("Failed to write BOM: {}", e)))?;

    let mut writer = Writer::from_writer(buf_writer);
    writer
        .write_record(dataset.columns())
        .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

    for record in dataset.rows() {
        let cells = dataset
            .columns()
            .iter()
            .map(|column| record.get(column).unwrap_or(""));
        writer
            .write_record(cells)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::IoError(format!("Failed to flush: {}", e)))?;

    let buf_writer = writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {}", e)))?;
    let file = buf_writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {}", e)))?;
    file.sync_all()
        .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

    Ok(())
}
