//! Integration tests for the HTTP surface: `/connect`, `/data/{mode}`,
//! `/health` and the static form.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{directory_store, start_server, test_config, RecordingExecutor};
use linkswitch::health::HealthResponse;

#[tokio::test]
async fn health_reports_config_and_directory() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(true).await,
    )
    .await;

    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.config.source, "test");
    assert_eq!(health.config.version, "01234567");
    assert_eq!(health.config.modes, 7);
    assert!(health.directory.loaded);
    assert_eq!(health.directory.records, 3);
    assert_eq!(health.directory.origin.as_deref(), Some("network"));
    assert_eq!(health.stats.switches_succeeded, 0);
}

#[tokio::test]
async fn health_without_directory_is_still_healthy() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let health: HealthResponse = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "healthy");
    assert!(!health.directory.loaded);
    assert_eq!(health.directory.origin, None);
}

#[tokio::test]
async fn connect_ysf_returns_confirmation() {
    let executor = Arc::new(RecordingExecutor::new());
    let server = start_server(test_config(), executor.clone(), directory_store(true).await).await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .form(&[("mode", "YSF"), ("talkgroup", "12345")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-correlation-id"));
    assert_eq!(
        resp.text().await.unwrap(),
        "Connected to YSF talkgroup 12345 (ysf.example.org:42000)"
    );
    assert_eq!(executor.calls().len(), 4);
    assert_eq!(server.state.stats.switched.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn connect_echoes_correlation_id() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .header("x-correlation-id", "op-42")
        .form(&[("mode", "ALLSTAR"), ("nodeNumber", "2000")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-correlation-id"], "op-42");
    assert_eq!(resp.text().await.unwrap(), "Connected to Allstar node 2000");
}

#[tokio::test]
async fn connect_missing_node_number_is_bad_request() {
    let executor = Arc::new(RecordingExecutor::new());
    let server = start_server(test_config(), executor.clone(), directory_store(false).await).await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .form(&[("mode", "ALLSTAR"), ("nodeNumber", ""), ("talkgroup", "")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "nodeNumber is required");
    assert!(executor.calls().is_empty());
    assert_eq!(server.state.stats.invalid.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn connect_unknown_mode_is_bad_request() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .form(&[("mode", "DSTAR"), ("talkgroup", "1")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "unknown mode 'DSTAR'");
}

#[tokio::test]
async fn connect_unknown_talkgroup_is_not_found() {
    let executor = Arc::new(RecordingExecutor::new());
    let server = start_server(test_config(), executor.clone(), directory_store(true).await).await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .form(&[("mode", "YSF"), ("talkgroup", "99999")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "YSF talkgroup 99999 not found");
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn connect_step_failure_is_server_error() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::failing_on("tune")),
        directory_store(false).await,
    )
    .await;

    let resp = reqwest::Client::new()
        .post(server.url("/connect"))
        .form(&[("mode", "DMR"), ("talkgroup", "91")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("step 'tune' failed"), "{body}");
    assert!(body.contains("teardown, bridge-link, mode-select"), "{body}");
    assert_eq!(server.state.stats.failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn switch_survives_client_disconnect() {
    let executor = Arc::new(RecordingExecutor::slow(Duration::from_millis(300)));
    let server = start_server(test_config(), executor.clone(), directory_store(false).await).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let result = client
        .post(server.url("/connect"))
        .form(&[("mode", "ALLSTAR"), ("nodeNumber", "41234")])
        .send()
        .await;
    assert!(result.is_err(), "client should give up before the switch ends");

    // Teardown and establish take 300ms each.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while server.state.stats.switched.load(Ordering::Relaxed) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "switch never completed");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(
        executor.last_args(),
        ["rpt cmd 57686 ilink 6 0", "rpt fun 57686 *341234"]
    );
    assert_eq!(server.state.stats.failed.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn data_ysf_serves_snapshot_records() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(true).await,
    )
    .await;

    let resp = reqwest::get(server.url("/data/YSF")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let records: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["number"], 12345);
    assert_eq!(records[0]["ipHostname"], "ysf.example.org");
    assert_eq!(records[0]["urlDashboard"], "http://alpha.example.org");
}

#[tokio::test]
async fn data_ysf_without_directory_is_unavailable() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let resp = reqwest::get(server.url("/data/YSF")).await.unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn data_serves_configured_table() {
    let dir = common::scratch_dir();
    let table = dir.join("p25.json");
    std::fs::write(&table, r#"[{"talkgroup":10200,"name":"North America"}]"#).unwrap();

    let mut config = test_config();
    config.tables.insert(linkswitch::link::Mode::P25, table);

    let server = start_server(
        config,
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let body: serde_json::Value = reqwest::get(server.url("/data/P25"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body[0]["talkgroup"], 10200);
}

#[tokio::test]
async fn data_errors_map_to_status_codes() {
    let dir = common::scratch_dir();
    let broken = dir.join("nxdn.json");
    std::fs::write(&broken, "not json").unwrap();

    let mut config = test_config();
    config.tables.clear();
    config.tables.insert(linkswitch::link::Mode::Nxdn, broken);
    config
        .tables
        .insert(linkswitch::link::Mode::Dmr, dir.join("missing.json"));

    let server = start_server(
        config,
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let invalid = reqwest::get(server.url("/data/DSTAR")).await.unwrap();
    assert_eq!(invalid.status(), 400);
    assert_eq!(invalid.text().await.unwrap(), "Invalid mode.");

    let unconfigured = reqwest::get(server.url("/data/P25")).await.unwrap();
    assert_eq!(unconfigured.status(), 500);
    assert_eq!(unconfigured.text().await.unwrap(), "Failed to load data.");

    let corrupt = reqwest::get(server.url("/data/NXDN")).await.unwrap();
    assert_eq!(corrupt.status(), 500);
    assert_eq!(corrupt.text().await.unwrap(), "Failed to load data.");

    let missing = reqwest::get(server.url("/data/DMR")).await.unwrap();
    assert_eq!(missing.status(), 500);
}

#[tokio::test]
async fn static_form_is_served() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;

    let resp = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("linkswitch"));

    let missing = reqwest::get(server.url("/nope.css")).await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn server_stops_on_shutdown() {
    let server = start_server(
        test_config(),
        Arc::new(RecordingExecutor::new()),
        directory_store(false).await,
    )
    .await;
    let url = server.url("/health");
    assert!(reqwest::get(&url).await.is_ok());

    drop(server);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(reqwest::get(&url).await.is_err());
}
