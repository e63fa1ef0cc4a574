//! Progress and warning reporting.
//!
//! Assemblers and the aggregator never print directly; they report through a
//! [`Reporter`]. The binary uses [`ProgressBarReporter`] for an interactive
//! bar per multi-season dataset, or [`TracingReporter`] when progress bars are
//! disabled. Both route warnings through `tracing`.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::DatasetKind;

/// Sink for progress ticks, warnings and notices
pub trait Reporter: Send + Sync {
    /// A multi-season dataset is about to start
    fn start(&self, _kind: DatasetKind, _total_years: usize) {}

    /// `completed` of `total` seasons are done; `year` was the last one processed
    fn progress(&self, kind: DatasetKind, completed: usize, total: usize, year: i32);

    /// A multi-season dataset finished
    fn finish(&self, _kind: DatasetKind) {}

    /// Something was skipped or degraded
    fn warn(&self, message: &str);

    /// Informational notice (e.g. an empty dataset was not written)
    fn notice(&self, message: &str);
}

/// Reporter that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn progress(&self, kind: DatasetKind, completed: usize, total: usize, year: i32) {
        info!("[PROGRESS] {kind}: {completed}/{total} seasons (finished {year})");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn notice(&self, message: &str) {
        info!("{message}");
    }
}

struct ActiveBar {
    bar: ProgressBar,
    started: Instant,
}

/// Reporter drawing one progress bar per multi-season dataset
#[derive(Default)]
pub struct ProgressBarReporter {
    active: Mutex<Option<ActiveBar>>,
}

impl ProgressBarReporter {
    /// Create a reporter with no active bar
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar<F: FnOnce(&ProgressBar)>(&self, f: F) -> bool {
        match self.active.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(active) => {
                    f(&active.bar);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl Reporter for ProgressBarReporter {
    fn start(&self, kind: DatasetKind, total_years: usize) {
        let bar = create_progress_bar(kind, total_years);
        if let Ok(mut guard) = self.active.lock() {
            *guard = Some(ActiveBar {
                bar,
                started: Instant::now(),
            });
        }
    }

    fn progress(&self, kind: DatasetKind, completed: usize, total: usize, year: i32) {
        let drawn = self.with_bar(|bar| {
            bar.set_position(completed as u64);
            bar.set_message(format!("Fetching {} ({year})", kind.endpoint()));
        });
        if !drawn {
            TracingReporter.progress(kind, completed, total, year);
        }
    }

    fn finish(&self, kind: DatasetKind) {
        if let Ok(mut guard) = self.active.lock() {
            if let Some(active) = guard.take() {
                active.bar.finish_and_clear();
                info!(
                    "Fetched {} in {}",
                    kind,
                    format_duration(active.started.elapsed())
                );
            }
        }
    }

    fn warn(&self, message: &str) {
        let drawn = self.with_bar(|bar| bar.suspend(|| warn!("{message}")));
        if !drawn {
            warn!("{message}");
        }
    }

    fn notice(&self, message: &str) {
        let drawn = self.with_bar(|bar| bar.suspend(|| info!("{message}")));
        if !drawn {
            info!("{message}");
        }
    }
}

/// Create progress bar with style
fn create_progress_bar(kind: DatasetKind, total_years: usize) -> ProgressBar {
    let pb = ProgressBar::new(total_years as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} seasons {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Fetching {}", kind.endpoint()));
    pb
}

/// Short human-readable duration ("45s", "3m", "1.5h")
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
