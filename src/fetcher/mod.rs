//! Data fetcher implementations

use async_trait::async_trait;
use serde_json::Value;

pub mod envelope;
pub mod http;
pub mod pagination;
pub mod retry_formatter;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-success HTTP status other than 429
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// HTTP 429
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection or other transport failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body is not valid JSON
    #[error("parse error: {0}")]
    ParseError(String),

    /// Every attempt failed
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<FetcherError>,
    },
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Retrieves one JSON document.
///
/// Implementations resolve every failure mode to `Err`; callers decide
/// whether to skip the resource or stop.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url` and parse the body as JSON
    async fn fetch(&self, url: &str) -> FetcherResult<Value>;
}
