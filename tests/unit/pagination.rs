//! Unit tests for PaginationHelper

use serde_json::json;
use std::time::Duration;

use f1_data_downloader::downloader::RateLimiter;
use f1_data_downloader::fetcher::envelope::Resource;
use f1_data_downloader::fetcher::pagination::PaginationHelper;

use crate::support::{recording_limiter, round_page, seasons, table_page, url, ScriptedFetcher};

fn seasons_page(first: i32, count: usize, total: usize) -> serde_json::Value {
    table_page("SeasonTable", "Seasons", seasons(first, count), total)
}

#[tokio::test]
async fn test_short_page_stops_pagination() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
        url("seasons.json?limit=30&offset=0"),
        seasons_page(1950, 30, 45),
    );
    fetcher.respond(
        url("seasons.json?limit=30&offset=30"),
        seasons_page(1980, 15, 45),
    );
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 30);
    let collection = helper.collect(&url("seasons.json"), Resource::Seasons).await;

    assert!(collection.is_complete());
    assert_eq!(collection.pages, 2);
    assert_eq!(collection.entries.len(), 45);
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn test_empty_page_stops_pagination() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
        url("drivers.json?limit=2&offset=0"),
        table_page(
            "DriverTable",
            "Drivers",
            vec![json!({"driverId": "alonso"}), json!({"driverId": "hamilton"})],
            99,
        ),
    );
    fetcher.respond(
        url("drivers.json?limit=2&offset=2"),
        table_page("DriverTable", "Drivers", vec![], 99),
    );
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 2);
    let dataset = helper
        .fetch_all("Drivers", &url("drivers.json"), Resource::Drivers)
        .await
        .dataset;

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.value(1, "driverId"), Some("hamilton"));
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn test_reported_total_stops_pagination() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
        url("seasons.json?limit=10&offset=0"),
        seasons_page(1950, 10, 20),
    );
    fetcher.respond(
        url("seasons.json?limit=10&offset=10"),
        seasons_page(1960, 10, 20),
    );
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 10);
    let collection = helper.collect(&url("seasons.json"), Resource::Seasons).await;

    assert_eq!(collection.entries.len(), 20);
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn test_three_pages_wait_between_requests_only() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
        url("seasons.json?limit=5&offset=0"),
        seasons_page(1950, 5, 12),
    );
    fetcher.respond(
        url("seasons.json?limit=5&offset=5"),
        seasons_page(1955, 5, 12),
    );
    fetcher.respond(
        url("seasons.json?limit=5&offset=10"),
        seasons_page(1960, 2, 12),
    );
    let (limiter, sleeper) = recording_limiter(Duration::from_secs(2));

    let helper = PaginationHelper::new(&fetcher, &limiter, 5);
    let dataset = helper
        .fetch_all("Seasons", &url("seasons.json"), Resource::Seasons)
        .await
        .dataset;

    assert_eq!(dataset.len(), 12);
    assert_eq!(dataset.value(0, "season"), Some("1950"));
    assert_eq!(dataset.value(11, "season"), Some("1961"));
    assert_eq!(
        sleeper.waits(),
        vec![Duration::from_secs(2), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn test_failure_keeps_entries_already_gathered() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(
        url("circuits.json?limit=3&offset=0"),
        table_page(
            "CircuitTable",
            "Circuits",
            vec![
                json!({"circuitId": "albert_park"}),
                json!({"circuitId": "americas"}),
                json!({"circuitId": "bahrain"}),
            ],
            10,
        ),
    );
    fetcher.fail(url("circuits.json?limit=3&offset=3"));
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 3);
    let collection = helper.collect(&url("circuits.json"), Resource::Circuits).await;

    assert!(!collection.is_complete());
    assert_eq!(collection.pages, 1);
    assert_eq!(collection.entries.len(), 3);

    let dataset = collection.into_dataset("Circuits");
    assert_eq!(dataset.value(2, "circuitId"), Some("bahrain"));
}

#[tokio::test]
async fn test_first_page_failure_yields_empty_collection() {
    let fetcher = ScriptedFetcher::new();
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 1000);
    let collection = helper
        .collect(&url("constructors.json"), Resource::Constructors)
        .await;

    assert!(!collection.is_complete());
    assert_eq!(collection.pages, 0);
    assert!(collection.entries.is_empty());
}

#[tokio::test]
async fn test_missing_table_yields_no_entries() {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("seasons.json"), json!({"MRData": {"total": "0"}}));
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 1000);
    let collection = helper.collect(&url("seasons.json"), Resource::Seasons).await;

    assert!(collection.is_complete());
    assert!(collection.entries.is_empty());
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_laps_paginate_over_timings() {
    fn page(lap: u32, drivers: &[&str]) -> serde_json::Value {
        let timings: Vec<_> = drivers
            .iter()
            .map(|d| json!({"driverId": d, "position": "1", "time": "1:35.000"}))
            .collect();
        json!({"number": lap.to_string(), "Timings": timings})
    }

    // The reported total counts timings, not laps
    let mut first = round_page(
        2023,
        1,
        "Laps",
        vec![page(1, &["max", "perez"]), page(2, &["max", "perez"])],
    );
    first["MRData"]["total"] = json!("5");
    let mut second = round_page(2023, 1, "Laps", vec![page(3, &["max"])]);
    second["MRData"]["total"] = json!("5");

    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2023/1/laps.json?limit=4&offset=0"), first);
    fetcher.respond(url("2023/1/laps.json?limit=4&offset=4"), second);
    let limiter = RateLimiter::unlimited();

    let helper = PaginationHelper::new(&fetcher, &limiter, 4);
    let dataset = helper
        .fetch_all("Laps", &url("2023/1/laps.json"), Resource::Laps)
        .await
        .dataset;

    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.value(0, "lap"), Some("1"));
    assert_eq!(dataset.value(1, "driverId"), Some("perez"));
    assert_eq!(dataset.value(4, "lap"), Some("3"));
    assert_eq!(fetcher.requests().len(), 2);
}
