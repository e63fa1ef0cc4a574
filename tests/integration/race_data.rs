//! Integration tests for per-round race data and standings assembly

use serde_json::json;

use f1_data_downloader::downloader::{Assembler, RateLimiter};
use f1_data_downloader::{DatasetKind, RaceContext};

use crate::support::{
    driver_standings_page, empty_round_page, result_entry, round_page, schedule, test_config, url,
    MemoryReporter, ScriptedFetcher,
};

fn qualifying_entry(position: u32, driver_id: &str) -> serde_json::Value {
    json!({
        "number": "1",
        "position": position.to_string(),
        "Driver": { "driverId": driver_id, "code": driver_id[..3].to_uppercase() },
        "Constructor": { "constructorId": "red_bull" },
        "Q1": "1:31.295",
        "Q2": "1:30.503",
        "Q3": "1:29.708"
    })
}

#[tokio::test]
async fn test_failed_round_is_skipped_with_one_warning() {
    let config = test_config(2023, 2023);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2023.json"), schedule(2023, 1..=3));
    fetcher.respond(
        url("2023/1/qualifying.json"),
        round_page(
            2023,
            1,
            "QualifyingResults",
            vec![qualifying_entry(1, "verstappen"), qualifying_entry(2, "perez")],
        ),
    );
    fetcher.fail(url("2023/2/qualifying.json"));
    fetcher.respond(
        url("2023/3/qualifying.json"),
        round_page(
            2023,
            3,
            "QualifyingResults",
            vec![qualifying_entry(1, "leclerc"), qualifying_entry(2, "sainz")],
        ),
    );
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.race_data(DatasetKind::Qualifying, 2023).await;

    assert_eq!(dataset.len(), 4);
    let rounds: Vec<_> = (0..dataset.len())
        .map(|row| dataset.value(row, "round").unwrap())
        .collect();
    assert_eq!(rounds, vec!["1", "1", "3", "3"]);

    assert_eq!(dataset.value(0, "season"), Some("2023"));
    assert_eq!(dataset.value(0, "raceName"), Some("Grand Prix 1"));
    assert_eq!(dataset.value(2, "circuit_id"), Some("circuit_3"));
    assert_eq!(dataset.value(2, "circuit_name"), Some("Circuit 3"));
    assert_eq!(dataset.value(2, "circuit_location"), Some("City 3"));
    assert_eq!(dataset.value(2, "circuit_country"), Some("Testland"));
    assert_eq!(dataset.value(2, "driver_driverId"), Some("leclerc"));
    assert_eq!(dataset.value(3, "Q3"), Some("1:29.708"));

    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1, "warnings: {warnings:?}");
    assert!(warnings[0].contains("qualifying"));
    assert!(warnings[0].contains("round 2"));
}

#[tokio::test]
async fn test_race_context_columns_follow_entry_columns() {
    let config = test_config(2023, 2023);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2023.json"), schedule(2023, [1]));
    fetcher.respond(
        url("2023/1/results.json"),
        round_page(2023, 1, "Results", vec![result_entry(1, "verstappen")]),
    );
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.race_data(DatasetKind::Results, 2023).await;

    let columns = dataset.columns();
    let tail: Vec<&str> = columns[columns.len() - RaceContext::COLUMNS.len()..]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(tail, RaceContext::COLUMNS);
    assert_eq!(dataset.value(0, "time_time"), Some("1:31:44.742"));
    assert!(reporter.warnings().is_empty());
}

#[tokio::test]
async fn test_missing_schedule_yields_empty_dataset() {
    let config = test_config(2023, 2023);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2023.json"), schedule(2023, Vec::<u32>::new()));
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.race_data(DatasetKind::PitStops, 2023).await;

    assert!(dataset.is_empty());
    assert_eq!(fetcher.requests().len(), 1);
    assert!(reporter.warnings().is_empty());
}

#[tokio::test]
async fn test_rounds_without_sprint_are_silent() {
    let config = test_config(2019, 2019);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2019.json"), schedule(2019, 1..=21));
    for round in 1..=21 {
        fetcher.respond(url(&format!("2019/{round}/sprint.json")), empty_round_page());
    }
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.race_data(DatasetKind::Sprint, 2019).await;

    assert!(dataset.is_empty());
    assert!(reporter.warnings().is_empty());
    assert_eq!(fetcher.request_count(&url("2019/")), 21);
}

#[tokio::test]
async fn test_standings_rows_are_tagged_with_season_and_round() {
    let config = test_config(2021, 2021);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2021.json"), schedule(2021, 1..=2));
    fetcher.respond(
        url("2021/1/driverStandings.json"),
        driver_standings_page(2021, 1, &["hamilton", "max_verstappen"]),
    );
    fetcher.respond(
        url("2021/2/driverStandings.json"),
        driver_standings_page(2021, 2, &["max_verstappen", "hamilton"]),
    );
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.standings(DatasetKind::DriverStandings, 2021).await;

    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.value(0, "season"), Some("2021"));
    assert_eq!(dataset.value(0, "round"), Some("1"));
    assert_eq!(dataset.value(0, "driver_driverId"), Some("hamilton"));
    assert_eq!(dataset.value(2, "round"), Some("2"));
    assert_eq!(dataset.value(2, "driver_driverId"), Some("max_verstappen"));
    assert_eq!(
        dataset.value(3, "Constructors"),
        Some(r#"[{"constructorId":"red_bull","name":"Red Bull"}]"#)
    );
}

#[tokio::test]
async fn test_failed_standings_round_is_skipped() {
    let config = test_config(2021, 2021);
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2021.json"), schedule(2021, 1..=2));
    fetcher.fail(url("2021/1/driverStandings.json"));
    fetcher.respond(
        url("2021/2/driverStandings.json"),
        driver_standings_page(2021, 2, &["max_verstappen"]),
    );
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.standings(DatasetKind::DriverStandings, 2021).await;

    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.value(0, "round"), Some("2"));
    assert_eq!(reporter.warnings().len(), 1);
}

#[tokio::test]
async fn test_standings_request_page_size_and_warn_on_short_snapshot() {
    let mut config = test_config(2021, 2021);
    config.batch_size = 40;
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(url("2021.json"), schedule(2021, 1..=2));

    let mut short = driver_standings_page(2021, 1, &["hamilton", "max_verstappen"]);
    short["MRData"]["total"] = json!("35");
    fetcher.respond(url("2021/1/driverStandings.json?limit=40&offset=0"), short);
    fetcher.respond(
        url("2021/2/driverStandings.json?limit=40&offset=0"),
        driver_standings_page(2021, 2, &["max_verstappen", "hamilton"]),
    );
    let limiter = RateLimiter::unlimited();
    let reporter = MemoryReporter::new();

    let assembler = Assembler::new(&config, &fetcher, &limiter, &reporter);
    let dataset = assembler.standings(DatasetKind::DriverStandings, 2021).await;

    assert_eq!(dataset.len(), 4);
    let requests = fetcher.requests();
    assert!(requests.contains(&url("2021/1/driverStandings.json?limit=40&offset=0")));
    assert!(requests.contains(&url("2021/2/driverStandings.json?limit=40&offset=0")));

    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1, "warnings: {warnings:?}");
    assert!(warnings[0].contains("round 1"));
    assert!(warnings[0].contains("2 of 35"));
}
