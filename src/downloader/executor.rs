//! Run orchestration
//!
//! Fixed sequence: the four reference datasets, then the per-round race
//! datasets over the configured seasons, then both standings datasets. Each
//! dataset is exported as soon as it is assembled. A failed export is recorded
//! in the [`RunSummary`] and the run moves on to the next dataset.

use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

use crate::downloader::aggregator::SeasonAggregator;
use crate::downloader::assembler::Assembler;
use crate::downloader::config::DownloadConfig;
use crate::downloader::progress::Reporter;
use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::JsonFetcher;
use crate::output::{CsvExporter, DatasetExporter, ExportOutcome, OutputResult};
use crate::{Dataset, DatasetKind};

/// Reference datasets, fetched once per run
pub const REFERENCE_DATASETS: [DatasetKind; 4] = [
    DatasetKind::Seasons,
    DatasetKind::Drivers,
    DatasetKind::Constructors,
    DatasetKind::Circuits,
];

/// Per-round race datasets, fetched per season
pub const RACE_DATASETS: [DatasetKind; 5] = [
    DatasetKind::Results,
    DatasetKind::Qualifying,
    DatasetKind::Sprint,
    DatasetKind::PitStops,
    DatasetKind::Laps,
];

/// Per-round standings datasets, fetched per season
pub const STANDINGS_DATASETS: [DatasetKind; 2] = [
    DatasetKind::DriverStandings,
    DatasetKind::ConstructorStandings,
];

/// A file written during the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Dataset exported
    pub kind: DatasetKind,
    /// File path
    pub path: PathBuf,
    /// Data rows written
    pub rows: usize,
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Output directory
    pub output_dir: PathBuf,
    /// Files written, in export order
    pub written: Vec<WrittenFile>,
    /// Datasets that were empty
    pub skipped: Vec<DatasetKind>,
    /// Datasets whose export failed, with the error message
    pub failed: Vec<(DatasetKind, String)>,
}

impl RunSummary {
    /// Total rows across all written files
    pub fn total_rows(&self) -> usize {
        self.written.iter().map(|file| file.rows).sum()
    }

    /// Whether `kind` was written
    pub fn was_written(&self, kind: DatasetKind) -> bool {
        self.written.iter().any(|file| file.kind == kind)
    }

    /// Log the summary line by line
    pub fn log(&self) {
        info!("All F1 data saved in {}", self.output_dir.display());
        for file in &self.written {
            info!("{}: {} rows → {}", file.kind, file.rows, file.path.display());
        }
        for kind in &self.skipped {
            info!("{}: no data", kind);
        }
        for (kind, message) in &self.failed {
            error!("{}: export failed: {}", kind, message);
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output directory: {}", self.output_dir.display())?;
        writeln!(
            f,
            "Files written: {} ({} rows)",
            self.written.len(),
            self.total_rows()
        )?;
        for file in &self.written {
            writeln!(f, "  {} ({} rows)", file.path.display(), file.rows)?;
        }
        if !self.skipped.is_empty() {
            let names: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
            writeln!(f, "No data: {}", names.join(", "))?;
        }
        for (kind, message) in &self.failed {
            writeln!(f, "Failed: {kind}: {message}")?;
        }
        Ok(())
    }
}

/// Runs the full download sequence
pub struct DownloadExecutor<'a> {
    config: &'a DownloadConfig,
    fetcher: &'a dyn JsonFetcher,
    limiter: &'a RateLimiter,
    reporter: &'a dyn Reporter,
}

impl<'a> DownloadExecutor<'a> {
    /// Create an executor
    pub fn new(
        config: &'a DownloadConfig,
        fetcher: &'a dyn JsonFetcher,
        limiter: &'a RateLimiter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            fetcher,
            limiter,
            reporter,
        }
    }

    /// Run every dataset, writing CSV files to the configured output directory.
    ///
    /// Fails only if the output directory cannot be created.
    pub async fn run(&self) -> OutputResult<RunSummary> {
        let exporter = CsvExporter::create(&self.config.output_dir)?;
        let summary = self.run_with_exporter(&exporter).await;
        Ok(RunSummary {
            output_dir: std::fs::canonicalize(exporter.output_dir())
                .unwrap_or_else(|_| exporter.output_dir().to_path_buf()),
            ..summary
        })
    }

    /// Run every dataset through `exporter`
    pub async fn run_with_exporter(&self, exporter: &dyn DatasetExporter) -> RunSummary {
        let assembler = Assembler::new(self.config, self.fetcher, self.limiter, self.reporter);
        let aggregator = SeasonAggregator::new(&assembler);
        let mut summary = RunSummary {
            output_dir: self.config.output_dir.clone(),
            ..RunSummary::default()
        };

        info!(
            "Fetching F1 data from {} (seasons {}-{})",
            self.config.base_url, self.config.start_year, self.config.end_year
        );

        for kind in REFERENCE_DATASETS {
            let dataset = assembler.reference(kind).await;
            self.export(exporter, kind, &dataset, &mut summary);
        }

        for kind in RACE_DATASETS.into_iter().chain(STANDINGS_DATASETS) {
            let dataset = aggregator
                .fetch_range(kind, self.config.start_year, self.config.end_year)
                .await;
            self.export(exporter, kind, &dataset, &mut summary);
        }

        info!(
            "Run complete: {} files written, {} empty, {} failed",
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }

    fn export(
        &self,
        exporter: &dyn DatasetExporter,
        kind: DatasetKind,
        dataset: &Dataset,
        summary: &mut RunSummary,
    ) {
        match exporter.export(dataset, kind.file_stem()) {
            Ok(ExportOutcome::Written { path, rows }) => {
                summary.written.push(WrittenFile { kind, path, rows });
            }
            Ok(ExportOutcome::Skipped { name }) => {
                self.reporter.notice(&format!("No data for {name}"));
                summary.skipped.push(kind);
            }
            Err(e) => {
                error!("Failed to export {}: {}", kind, e);
                summary.failed.push((kind, e.to_string()));
            }
        }
    }
}
