//! Multi-season aggregation

use tracing::{debug, info};

use crate::downloader::assembler::Assembler;
use crate::{DatasetFamily, DatasetKind, Dataset};

/// Runs an [`Assembler`] over a range of seasons and concatenates the results
pub struct SeasonAggregator<'a> {
    assembler: &'a Assembler<'a>,
}

impl<'a> SeasonAggregator<'a> {
    /// Create an aggregator over `assembler`
    pub fn new(assembler: &'a Assembler<'a>) -> Self {
        Self { assembler }
    }

    /// Build `kind` for every season in `start_year..=end_year`, ascending.
    ///
    /// Seasons are appended in year order and rounds keep the order the
    /// assembler produced them in. An empty season contributes nothing.
    /// Reference datasets span all seasons already and are fetched once.
    pub async fn fetch_range(&self, kind: DatasetKind, start_year: i32, end_year: i32) -> Dataset {
        if kind.family() == DatasetFamily::Reference {
            return self.assembler.reference(kind).await;
        }

        let reporter = self.assembler.reporter();
        let mut dataset = Dataset::new(kind.file_stem());
        if start_year > end_year {
            return dataset;
        }

        let total = (end_year - start_year + 1) as usize;
        reporter.start(kind, total);

        for (index, year) in (start_year..=end_year).enumerate() {
            let season = self.assembler.season(kind, year).await;
            if season.is_empty() {
                debug!("No {} rows for {}", kind, year);
            } else {
                debug!("{} {} rows for {}", season.len(), kind, year);
                dataset.extend(season);
            }
            reporter.progress(kind, index + 1, total, year);
        }

        reporter.finish(kind);
        info!(
            "Fetched {} {} rows for {}-{}",
            dataset.len(),
            kind,
            start_year,
            end_year
        );
        dataset
    }
}
