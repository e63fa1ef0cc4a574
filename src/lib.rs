//! # F1 Data Downloader Library
//!
//! Downloads Formula 1 statistics from the Ergast-compatible REST API
//! (`https://api.jolpi.ca/ergast/f1`) and materializes them as flat CSV tables
//! for offline analysis.
//!
//! ## Features
//!
//! - **Reference data**: seasons, drivers, constructors and circuits
//! - **Per-round race data**: results, qualifying, sprint, pit stops and lap timings,
//!   each row tagged with its race context (season, round, race name, circuit)
//! - **Per-round standings**: driver and constructor standings after every round
//! - **Resilient fetching**: request timeouts, exponential backoff on HTTP 429,
//!   bounded retries and proactive request pacing
//! - **Spreadsheet friendly output**: UTF-8 CSV with a leading byte-order mark
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use f1_data_downloader::downloader::{DownloadConfig, DownloadExecutor, RateLimiter, TokioSleeper, TracingReporter};
//! use f1_data_downloader::fetcher::http::{ReqwestTransport, RetryingFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::default();
//! let sleeper = Arc::new(TokioSleeper);
//! let transport = ReqwestTransport::new(config.request_timeout)?;
//! let fetcher = RetryingFetcher::new(transport, sleeper.clone(), config.retry.clone());
//! let limiter = RateLimiter::fixed_interval(config.request_delay, sleeper);
//! let reporter = TracingReporter;
//!
//! let summary = DownloadExecutor::new(&config, &fetcher, &limiter, &reporter).run().await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - HTTP transport, retry policy, response envelopes and pagination
//! - [`flatten`] - JSON-to-record normalization and column prefix rewriting
//! - [`downloader`] - Dataset assemblers, multi-season aggregation and the run orchestrator
//! - [`output`] - CSV export
//! - [`cli`] - Command line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use crate::fetcher::envelope::Resource;

/// CLI command implementations
pub mod cli;

/// Dataset assembly and run orchestration
pub mod downloader;

/// HTTP fetching, envelopes and pagination
pub mod fetcher;

/// JSON normalization and column flattening
pub mod flatten;

/// Data output writers
pub mod output;

/// Broad grouping of datasets by how they are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFamily {
    /// One paginated listing covering all seasons
    Reference,
    /// One paginated listing per round of a season
    RaceData,
    /// One standings snapshot per round of a season
    Standings,
}

/// Every dataset the downloader can produce, one per output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// All championship seasons
    Seasons,
    /// All drivers
    Drivers,
    /// All constructors
    Constructors,
    /// All circuits
    Circuits,
    /// Race results per round
    Results,
    /// Qualifying results per round
    Qualifying,
    /// Sprint results per round
    Sprint,
    /// Pit stops per round
    PitStops,
    /// Lap timings per round
    Laps,
    /// Driver standings after each round
    DriverStandings,
    /// Constructor standings after each round
    ConstructorStandings,
}

impl DatasetKind {
    /// All dataset kinds in export order
    pub const ALL: [DatasetKind; 11] = [
        DatasetKind::Seasons,
        DatasetKind::Drivers,
        DatasetKind::Constructors,
        DatasetKind::Circuits,
        DatasetKind::Results,
        DatasetKind::Qualifying,
        DatasetKind::Sprint,
        DatasetKind::PitStops,
        DatasetKind::Laps,
        DatasetKind::DriverStandings,
        DatasetKind::ConstructorStandings,
    ];

    /// Name of the output file without extension (e.g. "DriverStandings")
    pub fn file_stem(&self) -> &'static str {
        match self {
            DatasetKind::Seasons => "Seasons",
            DatasetKind::Drivers => "Drivers",
            DatasetKind::Constructors => "Constructors",
            DatasetKind::Circuits => "Circuits",
            DatasetKind::Results => "Results",
            DatasetKind::Qualifying => "Qualifying",
            DatasetKind::Sprint => "Sprint",
            DatasetKind::PitStops => "PitStops",
            DatasetKind::Laps => "Laps",
            DatasetKind::DriverStandings => "DriverStandings",
            DatasetKind::ConstructorStandings => "ConstructorStandings",
        }
    }

    /// API path segment for this dataset (e.g. "driverStandings")
    pub fn endpoint(&self) -> &'static str {
        match self {
            DatasetKind::Seasons => "seasons",
            DatasetKind::Drivers => "drivers",
            DatasetKind::Constructors => "constructors",
            DatasetKind::Circuits => "circuits",
            DatasetKind::Results => "results",
            DatasetKind::Qualifying => "qualifying",
            DatasetKind::Sprint => "sprint",
            DatasetKind::PitStops => "pitstops",
            DatasetKind::Laps => "laps",
            DatasetKind::DriverStandings => "driverStandings",
            DatasetKind::ConstructorStandings => "constructorStandings",
        }
    }

    /// How this dataset is assembled
    pub fn family(&self) -> DatasetFamily {
        match self {
            DatasetKind::Seasons
            | DatasetKind::Drivers
            | DatasetKind::Constructors
            | DatasetKind::Circuits => DatasetFamily::Reference,
            DatasetKind::Results
            | DatasetKind::Qualifying
            | DatasetKind::Sprint
            | DatasetKind::PitStops
            | DatasetKind::Laps => DatasetFamily::RaceData,
            DatasetKind::DriverStandings | DatasetKind::ConstructorStandings => {
                DatasetFamily::Standings
            }
        }
    }

    /// Response envelope describing where this dataset's entries live
    pub fn resource(&self) -> Resource {
        match self {
            DatasetKind::Seasons => Resource::Seasons,
            DatasetKind::Drivers => Resource::Drivers,
            DatasetKind::Constructors => Resource::Constructors,
            DatasetKind::Circuits => Resource::Circuits,
            DatasetKind::Results => Resource::Results,
            DatasetKind::Qualifying => Resource::Qualifying,
            DatasetKind::Sprint => Resource::Sprint,
            DatasetKind::PitStops => Resource::PitStops,
            DatasetKind::Laps => Resource::Laps,
            DatasetKind::DriverStandings => Resource::DriverStandings,
            DatasetKind::ConstructorStandings => Resource::ConstructorStandings,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// One flattened row: ordered `(column, cell)` pairs in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing the value in place if the column already exists
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Cell value for a column, if present
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(column, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no cells
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rename columns in place; `rename` returns `None` to keep a name unchanged.
    ///
    /// If a renamed column collides with an existing one, the earlier cell wins.
    pub fn rename_columns<F>(&mut self, rename: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut seen = HashSet::new();
        let fields = std::mem::take(&mut self.fields);
        for (name, value) in fields {
            let name = rename(&name).unwrap_or(name);
            if seen.insert(name.clone()) {
                self.fields.push((name, value));
            }
        }
    }
}

/// A named table: ordered rows plus the union of their columns in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    known: HashSet<String>,
    rows: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            known: HashSet::new(),
            rows: Vec::new(),
        }
    }

    /// Build a dataset from rows, keeping their order
    pub fn from_records(name: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        let mut dataset = Self::new(name);
        for record in records {
            dataset.push(record);
        }
        dataset
    }

    /// Dataset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column union in first-seen order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` for `column`; `None` when the row lacks that column
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row).and_then(|record| record.get(column))
    }

    /// Append a row, extending the column union
    pub fn push(&mut self, record: Record) {
        for column in record.columns() {
            if !self.known.contains(column) {
                self.known.insert(column.to_string());
                self.columns.push(column.to_string());
            }
        }
        self.rows.push(record);
    }

    /// Append all rows of `other` after the existing rows
    pub fn extend(&mut self, other: Dataset) {
        for record in other.rows {
            self.push(record);
        }
    }

    /// Consume the dataset, returning its rows
    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }
}

/// Per-round metadata joined onto every record of that round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceContext {
    /// Championship year
    pub season: i32,
    /// Round number within the season
    pub round: u32,
    /// Grand Prix name
    pub race_name: Option<String>,
    /// Race date (YYYY-MM-DD)
    pub date: Option<String>,
    /// Circuit identifier (e.g. "monza")
    pub circuit_id: Option<String>,
    /// Circuit display name
    pub circuit_name: Option<String>,
    /// Circuit city
    pub circuit_location: Option<String>,
    /// Circuit country
    pub circuit_country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleRace {
    round: String,
    #[serde(rename = "raceName")]
    race_name: Option<String>,
    date: Option<String>,
    #[serde(rename = "Circuit")]
    circuit: Option<ScheduleCircuit>,
}

#[derive(Debug, Deserialize)]
struct ScheduleCircuit {
    #[serde(rename = "circuitId")]
    circuit_id: Option<String>,
    #[serde(rename = "circuitName")]
    circuit_name: Option<String>,
    #[serde(rename = "Location")]
    location: Option<ScheduleLocation>,
}

#[derive(Debug, Deserialize)]
struct ScheduleLocation {
    locality: Option<String>,
    country: Option<String>,
}

impl RaceContext {
    /// Column names appended to every race-data record, in output order
    pub const COLUMNS: [&'static str; 8] = [
        "season",
        "round",
        "raceName",
        "date",
        "circuit_id",
        "circuit_name",
        "circuit_location",
        "circuit_country",
    ];

    /// Parse one entry of a season schedule (`RaceTable.Races[i]`)
    pub fn from_schedule_entry(season: i32, race: &Value) -> Result<Self, String> {
        let parsed: ScheduleRace = serde_json::from_value(race.clone())
            .map_err(|e| format!("Invalid schedule entry: {e}"))?;
        let round = parsed
            .round
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid round number: {}", parsed.round))?;

        let (circuit_id, circuit_name, location) = match parsed.circuit {
            Some(circuit) => (circuit.circuit_id, circuit.circuit_name, circuit.location),
            None => (None, None, None),
        };
        let (circuit_location, circuit_country) = match location {
            Some(location) => (location.locality, location.country),
            None => (None, None),
        };

        Ok(Self {
            season,
            round,
            race_name: parsed.race_name,
            date: parsed.date,
            circuit_id,
            circuit_name,
            circuit_location,
            circuit_country,
        })
    }

    /// Append the context columns to a record
    pub fn apply(&self, record: &mut Record) {
        let cells = [
            Some(self.season.to_string()),
            Some(self.round.to_string()),
            self.race_name.clone(),
            self.date.clone(),
            self.circuit_id.clone(),
            self.circuit_name.clone(),
            self.circuit_location.clone(),
            self.circuit_country.clone(),
        ];
        for (column, cell) in Self::COLUMNS.iter().zip(cells) {
            record.insert(*column, cell.unwrap_or_default());
        }
    }
}
