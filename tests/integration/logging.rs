//! Integration tests for logging and tracing

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use f1_data_downloader::downloader::{Reporter, TracingReporter};
use f1_data_downloader::DatasetKind;

#[test]
fn test_tracing_subscriber_initialization() {
    // try_init fails harmlessly if another test installed a subscriber first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("f1_data_downloader=debug")),
        )
        .with_test_writer()
        .try_init();

    info!("subscriber ready");
}

#[test]
fn test_tracing_json_format() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("f1_data_downloader=info"))
        .with_test_writer()
        .try_init();

    info!(dataset = "Results", rows = 440, "Saved rows");
}

#[test]
fn test_env_filter_parsing() {
    for directive in [
        "info",
        "f1_data_downloader=debug",
        "warn,f1_data_downloader=trace",
        "f1_data_downloader::fetcher=debug,f1_data_downloader::output=warn",
    ] {
        assert!(
            EnvFilter::try_new(directive).is_ok(),
            "directive {directive} should parse"
        );
    }
}

#[test]
fn test_tracing_reporter_logs_without_panicking() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("f1_data_downloader=trace"))
        .with_test_writer()
        .try_init();

    let reporter = TracingReporter;
    reporter.start(DatasetKind::Laps, 3);
    reporter.progress(DatasetKind::Laps, 1, 3, 2021);
    reporter.warn("Skipping laps for 2021 round 4: request timed out");
    reporter.notice("No data for Sprint");
    reporter.finish(DatasetKind::Laps);

    debug!(year = 2021, round = 4, "structured fields");
    warn!("warning after reporter use");
}
