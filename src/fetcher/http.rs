//! HTTP transport and retrying JSON fetcher
//!
//! [`Transport`] performs exactly one GET. [`RetryingFetcher`] wraps a
//! transport with the [`RetryPolicy`]: HTTP 429 backs off exponentially, any
//! other failure (non-2xx, malformed body, timeout, connection error) waits a
//! fixed delay, and after `max_attempts` the call resolves to
//! [`FetcherError::RetriesExhausted`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::downloader::config::RetryPolicy;
use crate::downloader::rate_limit::Sleeper;
use crate::fetcher::retry_formatter::{
    classify_reqwest_error, classify_status, RetryContext, RetryErrorType,
};
use crate::fetcher::{FetcherError, FetcherResult, JsonFetcher};

const USER_AGENT: &str = concat!("f1-data-downloader/", env!("CARGO_PKG_VERSION"));

/// Raw response of a single GET
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Body text
    pub body: String,
}

impl RawResponse {
    /// Convenience constructor
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport-level failure of a single GET
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Request exceeded the timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// Could not connect
    #[error("connection failed: {0}")]
    Connect(String),

    /// Anything else (body read, TLS, redirect loop, ...)
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classification for retry messages
    pub fn error_type(&self) -> RetryErrorType {
        match self {
            TransportError::Timeout(_) => RetryErrorType::NetworkTimeout,
            TransportError::Connect(_) => RetryErrorType::NetworkOffline,
            TransportError::Other(_) => RetryErrorType::NetworkGeneric,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match classify_reqwest_error(&err) {
            RetryErrorType::NetworkTimeout => TransportError::Timeout(err.to_string()),
            RetryErrorType::NetworkOffline => TransportError::Connect(err.to_string()),
            _ => TransportError::Other(err.to_string()),
        }
    }
}

impl From<TransportError> for FetcherError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => FetcherError::Timeout(msg),
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                FetcherError::NetworkError(msg)
            }
        }
    }
}

/// Performs one HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return status and body text
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport with a per-request timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// JSON fetcher applying the retry policy over a transport
pub struct RetryingFetcher<T> {
    transport: T,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingFetcher<T> {
    /// Create a fetcher
    pub fn new(transport: T, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Configured retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one attempt, classifying any failure
    async fn attempt(&self, url: &str) -> Result<Value, (RetryErrorType, FetcherError)> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| (e.error_type(), FetcherError::from(e)))?;

        if !response.status.is_success() {
            let error_type = classify_status(response.status);
            let error = if error_type.is_rate_limit() {
                FetcherError::RateLimitExceeded
            } else {
                FetcherError::HttpError(format!("status {}", response.status))
            };
            return Err((error_type, error));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            (
                RetryErrorType::MalformedBody,
                FetcherError::ParseError(format!("Failed to parse response body: {e}")),
            )
        })
    }
}

#[async_trait]
impl<T: Transport> JsonFetcher for RetryingFetcher<T> {
    async fn fetch(&self, url: &str) -> FetcherResult<Value> {
        let max_attempts = self.policy.max_attempts();
        let mut rate_limit_hits = 0;
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            let (error_type, error) = match self.attempt(url).await {
                Ok(value) => {
                    if attempt > 1 {
                        let ctx = RetryContext::new(
                            attempt,
                            max_attempts,
                            RetryErrorType::NetworkGeneric,
                            Duration::ZERO,
                            url,
                            "",
                        );
                        info!("{}", ctx.format_success());
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if error_type.is_rate_limit() {
                rate_limit_hits += 1;
            }

            if attempt < max_attempts {
                let wait = self.policy.delay_for(error_type, rate_limit_hits);
                let ctx = RetryContext::new(
                    attempt,
                    max_attempts,
                    error_type,
                    wait,
                    url,
                    error.to_string(),
                );
                warn!("{}", ctx.format_retry());
                self.sleeper.sleep(wait).await;
            }

            last_failure = Some((error_type, error));
        }

        let (error_type, last) = last_failure.unwrap_or((
            RetryErrorType::NetworkGeneric,
            FetcherError::NetworkError("no attempt was made".to_string()),
        ));
        let ctx = RetryContext::new(
            max_attempts,
            max_attempts,
            error_type,
            Duration::ZERO,
            url,
            last.to_string(),
        );
        warn!("{}", ctx.format_failure());

        Err(FetcherError::RetriesExhausted {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }
}
