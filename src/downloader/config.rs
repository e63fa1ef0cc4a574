//! Download configuration and retry policy

use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::retry_formatter::RetryErrorType;

/// Default API root (Ergast-compatible mirror).
pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Default output directory for CSV files.
pub const DEFAULT_OUTPUT_DIR: &str = "f1_data";

/// Page size sent as `limit`.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Total attempts per request (initial attempt included).
pub const MAX_RETRIES: u32 = 5;

/// Upper bound accepted for `--max-retries`.
pub const MAX_RETRIES_LIMIT: u32 = 20;

/// Base retry delay in milliseconds; fixed for ordinary failures, doubled per 429.
pub const INITIAL_BACKOFF_MS: u64 = 2000;

/// Cap for rate-limit backoff in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 120_000;

/// Pause between consecutive API requests in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;

/// Default season range.
pub const DEFAULT_START_YEAR: i32 = 2024;
/// Default season range.
pub const DEFAULT_END_YEAR: i32 = 2024;

/// First world championship season.
pub const FIRST_SEASON: i32 = 1950;

/// Calculate exponential backoff for the n-th consecutive rate-limit hit (1-based).
pub fn calculate_backoff(base: Duration, rate_limit_hits: u32, cap: Duration) -> Duration {
    let exponent = rate_limit_hits.saturating_sub(1).min(31);
    base.saturating_mul(2u32.pow(exponent)).min(cap)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Batch size of zero
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// Attempt count out of range
    #[error("max retries must be between 1 and {MAX_RETRIES_LIMIT}, got {0}")]
    InvalidMaxRetries(u32),

    /// Year range reversed or before the first season
    #[error("invalid season range {start}..={end} (seasons start in {FIRST_SEASON})")]
    InvalidYearRange {
        /// First year requested
        start: i32,
        /// Last year requested
        end: i32,
    },

    /// Empty or non-HTTP base URL
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Retry policy for a single logical request.
///
/// HTTP 429 waits `base_delay * 2^(n-1)` for the n-th rate-limit response of
/// the same call (capped at `max_delay`); every other failure waits `base_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the default backoff cap
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }

    /// Override the backoff cap
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Total attempts per request
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed delay and backoff base
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait before the next attempt.
    ///
    /// `rate_limit_hits` counts the 429 responses seen so far on this call,
    /// including the one being handled.
    pub fn delay_for(&self, error_type: RetryErrorType, rate_limit_hits: u32) -> Duration {
        if error_type.is_rate_limit() {
            calculate_backoff(self.base_delay, rate_limit_hits, self.max_delay)
        } else {
            self.base_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, Duration::from_millis(INITIAL_BACKOFF_MS))
    }
}

/// Immutable settings for one run, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// API root without trailing slash
    pub base_url: String,
    /// Directory receiving the CSV files
    pub output_dir: PathBuf,
    /// Page size (`limit` query parameter)
    pub batch_size: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retry policy for every request
    pub retry: RetryPolicy,
    /// Pause between consecutive requests
    pub request_delay: Duration,
    /// First season of the multi-season datasets
    pub start_year: i32,
    /// Last season of the multi-season datasets (inclusive)
    pub end_year: i32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
        }
    }
}

impl DownloadConfig {
    /// Check the settings before any request is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        let attempts = self.retry.max_attempts();
        if !(1..=MAX_RETRIES_LIMIT).contains(&attempts) {
            return Err(ConfigError::InvalidMaxRetries(attempts));
        }
        if self.start_year < FIRST_SEASON || self.start_year > self.end_year {
            return Err(ConfigError::InvalidYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        Ok(())
    }

    /// Full URL for an API path such as `"2023/5/results.json"`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Seasons covered by the multi-season datasets
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}
