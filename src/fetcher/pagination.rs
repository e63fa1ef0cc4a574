//! Offset-based pagination over `limit`/`offset` endpoints
//!
//! Pages are requested with increasing offsets until one of:
//! - a page yields no entries
//! - a page yields fewer entries than the batch size (last page)
//! - the offset reaches the `total` the API reports
//! - the fetcher fails, in which case the entries gathered so far are kept
//!
//! Includes a maximum iteration limit to prevent infinite loops.

use serde_json::Value;
use tracing::{debug, warn};

use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::envelope::{Envelope, EnvelopeError, Resource};
use crate::fetcher::{FetcherError, JsonFetcher};
use crate::{flatten, Dataset};

/// Maximum number of pagination iterations to prevent infinite loops
const MAX_ITERATIONS: usize = 10_000;

/// Raw entries gathered for one resource
#[derive(Debug)]
pub struct PageCollection {
    /// Entries across all pages, in page order
    pub entries: Vec<Value>,
    /// Pages successfully fetched
    pub pages: usize,
    /// Failure that stopped pagination early, if any
    pub failure: Option<FetcherError>,
}

impl PageCollection {
    /// Whether pagination ran to its natural end
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Normalize and flatten the entries into a dataset
    pub fn into_dataset(self, name: &str) -> Dataset {
        Dataset::from_records(name, flatten::records(&self.entries))
    }
}

/// A flattened dataset plus how its pagination ended
#[derive(Debug)]
pub struct PagedDataset {
    /// Rows across all fetched pages
    pub dataset: Dataset,
    /// Pages successfully fetched
    pub pages: usize,
    /// Failure that stopped pagination early, if any
    pub failure: Option<FetcherError>,
}

/// Append `limit`/`offset` to a resource URL
pub fn page_url(url_base: &str, batch_size: usize, offset: usize) -> String {
    let separator = if url_base.contains('?') { '&' } else { '?' };
    format!("{url_base}{separator}limit={batch_size}&offset={offset}")
}

/// Pagination helper bound to a fetcher and a request pacer
pub struct PaginationHelper<'a> {
    fetcher: &'a dyn JsonFetcher,
    limiter: &'a RateLimiter,
    batch_size: usize,
}

impl<'a> PaginationHelper<'a> {
    /// Create a helper requesting `batch_size` entries per page
    pub fn new(fetcher: &'a dyn JsonFetcher, limiter: &'a RateLimiter, batch_size: usize) -> Self {
        Self {
            fetcher,
            limiter,
            batch_size: batch_size.max(1),
        }
    }

    /// Gather the raw entries of every page of `url_base`
    pub async fn collect(&self, url_base: &str, resource: Resource) -> PageCollection {
        let envelope = resource.envelope();
        let mut entries = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            if pages >= MAX_ITERATIONS {
                warn!(
                    "Max iterations ({MAX_ITERATIONS}) reached for {url_base} - stopping at offset {offset}"
                );
                break;
            }

            self.limiter.acquire().await;
            let url = page_url(url_base, self.batch_size, offset);
            debug!("Fetching page {} of {:?}: {}", pages + 1, resource, url);

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    debug!(
                        "Pagination of {} stopped after {} pages: {}",
                        url_base, pages, e
                    );
                    return PageCollection {
                        entries,
                        pages,
                        failure: Some(e),
                    };
                }
            };
            pages += 1;

            let items = match envelope.entries(&page) {
                Ok(items) => items,
                Err(e @ EnvelopeError::Missing { .. }) => {
                    debug!("No entries at {}: {}", url, e);
                    Vec::new()
                }
                Err(e @ EnvelopeError::Shape { .. }) => {
                    warn!(
                        "Unexpected response shape from {} (expected {}): {}",
                        url,
                        resource.key_path().join("."),
                        e
                    );
                    Vec::new()
                }
            };

            let count = items.len();
            entries.extend(items);
            debug!("Received {} entries in page {}", count, pages);

            if count == 0 || count < self.batch_size {
                break;
            }

            offset += self.batch_size;
            if let Some(total) = Envelope::total(&page) {
                if offset as u64 >= total {
                    break;
                }
            }
        }

        debug!(
            "Pagination completed after {} pages. Total entries: {}",
            pages,
            entries.len()
        );

        PageCollection {
            entries,
            pages,
            failure: None,
        }
    }

    /// Fetch every page, then normalize and flatten once.
    ///
    /// A fetch failure stops pagination and keeps what was already gathered;
    /// the failure is handed back for the caller to report.
    pub async fn fetch_all(&self, name: &str, url_base: &str, resource: Resource) -> PagedDataset {
        let mut collection = self.collect(url_base, resource).await;
        let failure = collection.failure.take();
        let pages = collection.pages;
        PagedDataset {
            dataset: collection.into_dataset(name),
            pages,
            failure,
        }
    }
}
