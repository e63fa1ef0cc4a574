//! Retry classification and message formatting for the HTTP fetcher.
//!
//! [`RetryErrorType`] classifies a failed attempt so the retry policy can pick
//! a wait (exponential for rate limits, fixed for everything else) and
//! [`RetryContext`] renders the attempt counters, wait and URL into the log
//! lines users see while a download struggles.

use reqwest::StatusCode;
use std::time::Duration;

/// Classification of a failed request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Request exceeded the configured timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// HTTP 429 rate limit exceeded
    RateLimit,
    /// HTTP 5xx server error
    ServerError(u16),
    /// Other non-success status (4xx except 429, unexpected 1xx/3xx)
    ClientError(u16),
    /// 2xx response whose body is not valid JSON
    MalformedBody,
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// User-friendly description string used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "request timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(code) => match code {
                400 => "bad request",
                404 => "resource not found",
                _ => "unexpected status",
            },
            Self::MalformedBody => "malformed response body",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation presented after retries are exhausted.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Try a longer --timeout-secs or check your connection",
            Self::NetworkOffline => "Verify internet connectivity and DNS resolution",
            Self::RateLimit => "Increase --request-delay-ms or --retry-delay-ms",
            Self::ServerError(_) => "The API may be experiencing issues, try again later",
            Self::ClientError(_) => "Check --base-url and the requested season range",
            Self::MalformedBody => "Check that --base-url points at an Ergast-compatible API",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }

    /// Whether this failure calls for exponential backoff instead of a fixed delay.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Wait before the next attempt
    pub backoff_duration: Duration,
    /// URL that failed
    pub url: String,
    /// Original error message for details
    pub error_message: String,
}

impl RetryContext {
    /// Convenience constructor used throughout the retry logic.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error_type: RetryErrorType,
        backoff_duration: Duration,
        url: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type,
            backoff_duration,
            url: url.into(),
            error_message: error_message.into(),
        }
    }

    /// Format standardized retry message with attempt counters and context.
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds... ({})",
            self.attempt,
            self.max_attempts,
            self.error_type.description(),
            self.backoff_duration.as_secs_f64(),
            self.url
        )
    }

    /// Format retry success message when a previous attempt eventually works.
    pub fn format_success(&self) -> String {
        format!(
            "Retry attempt {}/{} succeeded ({})",
            self.attempt, self.max_attempts, self.url
        )
    }

    /// Format final failure summary with actionable suggestions.
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!("[FAILED] Request failed after {} attempts", self.max_attempts),
            format!("  Last error: {}", self.error_message),
            format!("  URL: {}", self.url),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.join("\n")
    }

    /// Derive suggestions tailored to the current retry context.
    pub fn format_suggestions(&self) -> Vec<String> {
        vec![
            self.error_type.suggestion().to_string(),
            format!(
                "Try increasing --max-retries (current: {})",
                self.max_attempts
            ),
        ]
    }
}

/// Classify a non-success HTTP status.
pub fn classify_status(status: StatusCode) -> RetryErrorType {
    if status == StatusCode::TOO_MANY_REQUESTS {
        RetryErrorType::RateLimit
    } else if status.is_server_error() {
        RetryErrorType::ServerError(status.as_u16())
    } else {
        RetryErrorType::ClientError(status.as_u16())
    }
}

/// Classify a reqwest transport error.
pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryErrorType {
    if err.is_timeout() {
        RetryErrorType::NetworkTimeout
    } else if err.is_connect() {
        RetryErrorType::NetworkOffline
    } else {
        RetryErrorType::NetworkGeneric
    }
}
