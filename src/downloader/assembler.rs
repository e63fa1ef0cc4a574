//! Dataset assemblers, one per resource family
//!
//! - Reference data: one paginated listing (`/seasons.json`, ...)
//! - Per-round race data: the season calendar, then one paginated listing per
//!   round with the [`RaceContext`] joined onto every record
//! - Per-round standings: one snapshot per round tagged with season and round
//!
//! Assemblers never fail. A round whose request fails is skipped with a
//! warning and the season carries on with the remaining rounds.

use tracing::{debug, info};

use crate::downloader::config::DownloadConfig;
use crate::downloader::progress::Reporter;
use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::envelope::{Envelope, EnvelopeError, Resource};
use crate::fetcher::pagination::{page_url, PaginationHelper};
use crate::fetcher::JsonFetcher;
use crate::{flatten, DatasetFamily, DatasetKind, Dataset, RaceContext};

/// Builds datasets for one resource family at a time
pub struct Assembler<'a> {
    config: &'a DownloadConfig,
    fetcher: &'a dyn JsonFetcher,
    limiter: &'a RateLimiter,
    reporter: &'a dyn Reporter,
}

impl<'a> Assembler<'a> {
    /// Create an assembler
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

    /// Reporter shared with the aggregator
    pub fn reporter(&self) -> &'a dyn Reporter {
        self.reporter
    }

    fn pages(&self) -> PaginationHelper<'a> {
        PaginationHelper::new(self.fetcher, self.limiter, self.config.batch_size)
    }

    /// Build one season of a per-round dataset, or the whole reference dataset
    pub async fn season(&self, kind: DatasetKind, year: i32) -> Dataset {
        match kind.family() {
            DatasetFamily::Reference => self.reference(kind).await,
            DatasetFamily::RaceData => self.race_data(kind, year).await,
            DatasetFamily::Standings => self.standings(kind, year).await,
        }
    }

    /// Seasons, drivers, constructors or circuits across all years
    pub async fn reference(&self, kind: DatasetKind) -> Dataset {
        let url = self.config.url(&format!("{}.json", kind.endpoint()));
        let paged = self
            .pages()
            .fetch_all(kind.file_stem(), &url, kind.resource())
            .await;
        if let Some(e) = &paged.failure {
            self.reporter.warn(&format!(
                "Stopped fetching {} after {} pages ({} rows kept): {}",
                kind,
                paged.pages,
                paged.dataset.len(),
                e
            ));
        }
        let dataset = paged.dataset;
        info!("Fetched {} {} rows", dataset.len(), kind);
        dataset
    }

    /// Race calendar of a season, ordered by round
    pub async fn race_schedule(&self, year: i32) -> Vec<RaceContext> {
        let url = self.config.url(&format!("{year}.json"));
        let collection = self.pages().collect(&url, Resource::Schedule).await;
        if let Some(e) = &collection.failure {
            self.reporter
                .warn(&format!("Could not fetch the {year} race calendar: {e}"));
        }

        let mut races: Vec<RaceContext> = collection
            .entries
            .iter()
            .filter_map(|race| match RaceContext::from_schedule_entry(year, race) {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    self.reporter
                        .warn(&format!("Ignoring {year} calendar entry: {e}"));
                    None
                }
            })
            .collect();
        races.sort_by_key(|race| race.round);
        races.dedup_by_key(|race| race.round);
        debug!("{} rounds in the {} calendar", races.len(), year);
        races
    }

    /// Results, qualifying, sprint, pit stops or laps for every round of `year`
    pub async fn race_data(&self, kind: DatasetKind, year: i32) -> Dataset {
        let mut dataset = Dataset::new(kind.file_stem());
        let schedule = self.race_schedule(year).await;
        if schedule.is_empty() {
            debug!("No races found for {}, skipping {}", year, kind);
            return dataset;
        }

        for race in &schedule {
            let url = self
                .config
                .url(&format!("{year}/{}/{}.json", race.round, kind.endpoint()));
            let collection = self.pages().collect(&url, kind.resource()).await;

            if let Some(e) = &collection.failure {
                if collection.entries.is_empty() {
                    self.reporter.warn(&format!(
                        "Skipping {} for {} round {}: {}",
                        kind.endpoint(),
                        year,
                        race.round,
                        e
                    ));
                    continue;
                }
                self.reporter.warn(&format!(
                    "Partial {} for {} round {} ({} entries kept): {}",
                    kind.endpoint(),
                    year,
                    race.round,
                    collection.entries.len(),
                    e
                ));
            }

            if collection.entries.is_empty() {
                debug!("No {} for {} round {}", kind.endpoint(), year, race.round);
                continue;
            }

            for mut record in flatten::records(&collection.entries) {
                race.apply(&mut record);
                dataset.push(record);
            }
        }

        debug!("Assembled {} {} rows for {}", dataset.len(), kind, year);
        dataset
    }

    /// Driver or constructor standings after every round of `year`
    pub async fn standings(&self, kind: DatasetKind, year: i32) -> Dataset {
        let mut dataset = Dataset::new(kind.file_stem());
        let schedule = self.race_schedule(year).await;
        if schedule.is_empty() {
            debug!("No races found for {}, skipping {}", year, kind);
            return dataset;
        }

        let envelope = kind.resource().envelope();
        for race in &schedule {
            let url = page_url(
                &self
                    .config
                    .url(&format!("{year}/{}/{}.json", race.round, kind.endpoint())),
                self.config.batch_size,
                0,
            );
            self.limiter.acquire().await;

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    self.reporter.warn(&format!(
                        "Skipping {} for {} round {}: {}",
                        kind.endpoint(),
                        year,
                        race.round,
                        e
                    ));
                    continue;
                }
            };

            let entries = match envelope.entries(&page) {
                Ok(entries) => entries,
                Err(e @ EnvelopeError::Missing { .. }) => {
                    debug!("No {} for {} round {}: {}", kind, year, race.round, e);
                    continue;
                }
                Err(e @ EnvelopeError::Shape { .. }) => {
                    self.reporter.warn(&format!(
                        "Skipping {} for {} round {}: {}",
                        kind.endpoint(),
                        year,
                        race.round,
                        e
                    ));
                    continue;
                }
            };

            if let Some(total) = Envelope::total(&page) {
                if total > entries.len() as u64 {
                    self.reporter.warn(&format!(
                        "Truncated {} for {} round {}: {} of {} entries",
                        kind.endpoint(),
                        year,
                        race.round,
                        entries.len(),
                        total
                    ));
                }
            }

            for mut record in flatten::records(&entries) {
                record.insert("season", year.to_string());
                record.insert("round", race.round.to_string());
                dataset.push(record);
            }
        }

        debug!("Assembled {} {} rows for {}", dataset.len(), kind, year);
        dataset
    }
}
