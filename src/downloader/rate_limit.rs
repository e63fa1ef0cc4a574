//! Request pacing and the sleep seam
//!
//! The API allows a handful of requests per second, so every request after the
//! first waits a fixed interval. All waits (pacing and retry backoff) go
//! through [`Sleeper`] so tests can substitute a recording clock.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Suspends the current task for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Fixed-interval request pacer shared by every component issuing requests
#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
    started: Arc<AtomicBool>,
}

impl RateLimiter {
    /// Wait `interval` before every request except the first one
    pub fn fixed_interval(interval: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            interval,
            sleeper,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pacer that never waits
    pub fn unlimited() -> Self {
        Self::fixed_interval(Duration::ZERO, Arc::new(TokioSleeper))
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next request slot
    pub async fn acquire(&self) {
        let already_started = self.started.swap(true, Ordering::SeqCst);
        if already_started && !self.interval.is_zero() {
            self.sleeper.sleep(self.interval).await;
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.interval)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}
