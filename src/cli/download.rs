//! Download command implementation

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::downloader::config::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_END_YEAR, DEFAULT_OUTPUT_DIR,
    DEFAULT_REQUEST_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_START_YEAR,
    INITIAL_BACKOFF_MS, MAX_RETRIES, MAX_RETRIES_LIMIT,
};
use crate::downloader::{
    DownloadConfig, DownloadExecutor, ProgressBarReporter, RateLimiter, Reporter, RetryPolicy,
    RunSummary, TokioSleeper, TracingReporter,
};
use crate::fetcher::http::{ReqwestTransport, RetryingFetcher};

use super::CliError;

/// Parse and validate the page size
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("batch size must be at least 1".to_string());
    }
    Ok(value)
}

/// F1 Data Downloader CLI
#[derive(Parser, Debug, Clone)]
#[command(name = "f1-data-downloader")]
#[command(about = "Download Formula 1 statistics from the Ergast API into CSV files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// API root
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory receiving the CSV files
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// First season of the per-round datasets
    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    pub start_year: i32,

    /// Last season of the per-round datasets (inclusive)
    #[arg(long, default_value_t = DEFAULT_END_YEAR)]
    pub end_year: i32,

    /// Entries requested per page
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Total attempts per request (range: 1-20)
    #[arg(long, default_value_t = MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=MAX_RETRIES_LIMIT as i64))]
    pub max_retries: u32,

    /// Delay before retrying a failed request; doubled for each HTTP 429
    #[arg(long, default_value_t = INITIAL_BACKOFF_MS)]
    pub retry_delay_ms: u64,

    /// Pause between consecutive requests
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    pub request_delay_ms: u64,

    /// Log progress lines instead of drawing progress bars
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Cli {
    /// Build and validate the run configuration
    pub fn to_config(&self) -> Result<DownloadConfig, CliError> {
        if self.timeout_secs == 0 {
            return Err(CliError::InvalidArgument(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        let config = DownloadConfig {
            base_url: self.base_url.trim().trim_end_matches('/').to_string(),
            output_dir: self.output_dir.clone(),
            batch_size: self.batch_size,
            request_timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms)),
            request_delay: Duration::from_millis(self.request_delay_ms),
            start_year: self.start_year,
            end_year: self.end_year,
        };
        config.validate()?;
        Ok(config)
    }

    /// Run the download with the production HTTP stack
    pub async fn execute(&self) -> Result<RunSummary, CliError> {
        let config = self.to_config()?;
        info!(
            "Downloading F1 data for seasons {}-{} into {}",
            config.start_year,
            config.end_year,
            config.output_dir.display()
        );

        let sleeper = Arc::new(TokioSleeper);
        let transport = ReqwestTransport::new(config.request_timeout)?;
        let fetcher = RetryingFetcher::new(transport, sleeper.clone(), config.retry.clone());
        let limiter = RateLimiter::fixed_interval(config.request_delay, sleeper);

        let reporter: Box<dyn Reporter> = if self.no_progress {
            Box::new(TracingReporter)
        } else {
            Box::new(ProgressBarReporter::new())
        };

        let summary = DownloadExecutor::new(&config, &fetcher, &limiter, reporter.as_ref())
            .run()
            .await?;
        Ok(summary)
    }
}
