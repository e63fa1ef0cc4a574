//! Dataset assembly and run orchestration
//!
//! # Overview
//!
//! A run flows through these layers, each awaiting the next sequentially:
//!
//! 1. **Orchestration**: [`executor::DownloadExecutor`] walks the fixed dataset
//!    sequence and exports each dataset as soon as it is built
//! 2. **Aggregation**: [`aggregator::SeasonAggregator`] repeats an assembler over
//!    the configured seasons and concatenates the results
//! 3. **Assembly**: [`assembler::Assembler`] builds one dataset for one season,
//!    joining race context onto per-round records
//! 4. **Pacing**: [`rate_limit::RateLimiter`] spaces requests out
//! 5. **Reporting**: [`progress::Reporter`] receives progress ticks and warnings
//!
//! # Error Handling
//!
//! Nothing below the executor returns an error. Request failures are retried by
//! the fetcher, then surface as skip warnings; the affected round or page is
//! left out and the run continues.
//!
//! # Related Modules
//!
//! - [`crate::fetcher`] - HTTP fetching and pagination
//! - [`crate::output`] - CSV export

pub mod aggregator;
pub mod assembler;
pub mod config;
pub mod executor;
pub mod progress;
pub mod rate_limit;

pub use aggregator::SeasonAggregator;
pub use assembler::Assembler;
pub use config::{ConfigError, DownloadConfig, RetryPolicy};
pub use executor::{DownloadExecutor, RunSummary, WrittenFile};
pub use progress::{ProgressBarReporter, Reporter, TracingReporter};
pub use rate_limit::{RateLimiter, Sleeper, TokioSleeper};
