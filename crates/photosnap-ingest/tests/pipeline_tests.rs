//! End-to-end ingest runs against a mock Flickr endpoint
//!
//! Each test lays out ingest lists in a temp directory, runs the orchestrator and
//! inspects the snapshot files plus the requests the mock server received.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod helpers;

use helpers::*;
use photosnap_ingest::flickr::{METHOD_GET_INFO, METHOD_GET_SIZES};
use photosnap_ingest::Orchestrator;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn run(workspace: &Workspace, server: &MockServer) -> photosnap_ingest::RunSummary {
    Orchestrator::from_config(workspace.config(server))
        .unwrap()
        .run()
        .await
        .unwrap()
}

// ============================================================================
// Convergence
// ============================================================================

#[tokio::test]
async fn test_first_run_builds_snapshot_in_ingest_order() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["300", "100", "200"]);
    mount_photos(&server, &["100", "200", "300"]).await;

    let summary = run(&workspace, &server).await;

    assert!(summary.is_success());
    assert_eq!(summary.total_fetched(), 3);
    assert_eq!(workspace.snapshot_ids("nyc"), vec!["300", "100", "200"]);
    assert_eq!(request_count(&server).await, 6);

    let entry = &workspace.snapshot("nyc")[0];
    assert_eq!(entry.title, "Photo 300");
    assert_eq!(entry.owner_username, "bridgewalker");
    assert_eq!(
        entry.owner_icon,
        "https://farm8.staticflickr.com/7372/buddyicons/12345@N00.jpg"
    );
    assert_eq!(entry.location_description, "Brooklyn, NY, USA");
    assert_eq!(entry.webpage, "https://www.flickr.com/photos/bridgewalker/300/");
    assert_eq!(entry.sizes.len(), 2);
}

#[tokio::test]
async fn test_snapshot_uses_camel_case_keys() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    mount_photos(&server, &["1"]).await;

    run(&workspace, &server).await;

    let raw = String::from_utf8(workspace.snapshot_bytes("nyc")).unwrap();
    let record: serde_json::Value = serde_json::from_str(raw.trim_end()).unwrap();
    for key in [
        "id",
        "sizes",
        "ownerUsername",
        "ownerIcon",
        "title",
        "description",
        "dateTaken",
        "latitude",
        "longitude",
        "locationAccuracy",
        "locationDescription",
        "url",
    ] {
        assert!(record.get(key).is_some(), "missing key {key}");
    }
    assert!(raw.ends_with('\n'));
}

#[tokio::test]
async fn test_second_run_makes_no_calls_and_keeps_bytes() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2"]);
    mount_photos(&server, &["1", "2"]).await;

    run(&workspace, &server).await;
    let before = workspace.snapshot_bytes("nyc");
    server.reset().await;

    let summary = run(&workspace, &server).await;

    assert_eq!(request_count(&server).await, 0);
    assert_eq!(summary.reports[0].hits, 2);
    assert_eq!(summary.reports[0].fetched, 0);
    assert_eq!(workspace.snapshot_bytes("nyc"), before);
}

#[tokio::test]
async fn test_new_ids_are_fetched_and_merged_in_order() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2"]);
    mount_photos(&server, &["1", "2"]).await;
    run(&workspace, &server).await;

    server.reset().await;
    mount_photos(&server, &["5"]).await;
    workspace.ingest("nyc", &["2", "5", "1"]);

    let summary = run(&workspace, &server).await;

    assert_eq!(summary.reports[0].misses, 1);
    assert_eq!(workspace.snapshot_ids("nyc"), vec!["2", "5", "1"]);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url.query().unwrap_or_default().contains("photo_id=5")));
}

#[tokio::test]
async fn test_removed_ids_drop_out_of_snapshot() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2", "3"]);
    mount_photos(&server, &["1", "2", "3"]).await;
    run(&workspace, &server).await;

    workspace.ingest("nyc", &["3", "1"]);
    server.reset().await;
    run(&workspace, &server).await;

    assert_eq!(request_count(&server).await, 0);
    assert_eq!(workspace.snapshot_ids("nyc"), vec!["3", "1"]);
}

#[tokio::test]
async fn test_missing_photo_is_skipped_and_reported() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "0", "2"]);
    mount_photos(&server, &["1", "2"]).await;
    call(METHOD_GET_INFO, "0")
        .respond_with(ResponseTemplate::new(200).set_body_json(not_found_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = run(&workspace, &server).await;

    assert!(summary.is_success());
    assert_eq!(summary.total_skipped(), 1);
    assert_eq!(summary.reports[0].skipped[0].photo_id, "0");
    assert_eq!(workspace.snapshot_ids("nyc"), vec!["1", "2"]);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn test_failed_region_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    workspace.ingest("sf", &["2"]);
    mount_photos(&server, &["1", "2"]).await;
    run(&workspace, &server).await;
    let nyc_before = workspace.snapshot_bytes("nyc");

    workspace.ingest("nyc", &["1", "66"]);
    workspace.ingest("sf", &["2", "3"]);
    mount_photos(&server, &["3"]).await;
    call(METHOD_GET_INFO, "66")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = workspace.config(&server);
    config.max_retries = 1;
    let summary = Orchestrator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].region, "nyc");
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].region, "sf");

    assert_eq!(workspace.snapshot_bytes("nyc"), nyc_before);
    assert_eq!(workspace.snapshot_ids("sf"), vec!["2", "3"]);
}

#[tokio::test]
async fn test_rejected_api_key_fails_region_without_dropping_records() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    mount_photos(&server, &["1"]).await;
    run(&workspace, &server).await;
    let before = workspace.snapshot_bytes("nyc");

    // Key revoked between runs: every call now fails the same way
    server.reset().await;
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(invalid_key_payload()))
        .mount(&server)
        .await;
    workspace.ingest("nyc", &["1", "2", "3"]);

    let summary = run(&workspace, &server).await;

    assert!(!summary.is_success());
    assert_eq!(summary.total_skipped(), 0);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].region, "nyc");
    assert!(summary.failures[0].error.contains("code 100"));
    assert_eq!(workspace.snapshot_bytes("nyc"), before);
    // Not retried
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_rejected_api_key_on_first_run_writes_nothing() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2", "3"]);
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(invalid_key_payload()))
        .mount(&server)
        .await;

    let summary = run(&workspace, &server).await;

    assert!(!summary.is_success());
    assert!(summary.reports.is_empty());
    assert!(!workspace.snapshot_path("nyc").exists());
}

#[tokio::test]
async fn test_service_unavailable_reply_is_retried() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    call(METHOD_GET_INFO, "1")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "stat": "fail", "code": 105, "message": "Service currently unavailable"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_photos(&server, &["1"]).await;

    let summary = run(&workspace, &server).await;

    assert!(summary.is_success());
    assert_eq!(summary.total_skipped(), 0);
    assert_eq!(workspace.snapshot_ids("nyc"), vec!["1"]);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_corrupt_snapshot_fails_only_that_region() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    workspace.ingest("sf", &["2"]);
    mount_photos(&server, &["1", "2"]).await;

    std::fs::create_dir_all(workspace.output_dir()).unwrap();
    std::fs::write(workspace.snapshot_path("nyc"), "{not json\n").unwrap();

    let summary = run(&workspace, &server).await;

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].region, "nyc");
    assert_eq!(
        std::fs::read_to_string(workspace.snapshot_path("nyc")).unwrap(),
        "{not json\n"
    );
    assert_eq!(workspace.snapshot_ids("sf"), vec!["2"]);
}

#[tokio::test]
async fn test_cancelled_run_leaves_snapshot_intact() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    mount_photos(&server, &["1"]).await;
    run(&workspace, &server).await;
    let before = workspace.snapshot_bytes("nyc");

    workspace.ingest("nyc", &["1", "2"]);
    call(METHOD_GET_INFO, "2")
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(info_payload("2"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    call(METHOD_GET_SIZES, "2")
        .respond_with(ResponseTemplate::new(200).set_body_json(sizes_payload("2")))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::from_config(workspace.config(&server)).unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(300), orchestrator.run()).await;

    assert!(outcome.is_err());
    assert_eq!(workspace.snapshot_bytes("nyc"), before);
    let leftovers: Vec<_> = std::fs::read_dir(workspace.output_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("nyc.ndjson")]);
}

// ============================================================================
// Run options
// ============================================================================

#[tokio::test]
async fn test_dry_run_makes_no_calls_and_writes_nothing() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2"]);

    let mut config = workspace.config(&server);
    config.dry_run = true;
    let summary = Orchestrator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reports[0].misses, 2);
    assert!(!summary.reports[0].persisted);
    assert_eq!(request_count(&server).await, 0);
    assert!(!workspace.output_dir().exists());
}

#[tokio::test]
async fn test_region_filter_limits_run() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1"]);
    workspace.ingest("sf", &["2"]);
    mount_photos(&server, &["1", "2"]).await;

    let mut config = workspace.config(&server);
    config.regions = vec!["sf".to_string()];
    let summary = Orchestrator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reports.len(), 1);
    assert!(!workspace.snapshot_path("nyc").exists());
    assert_eq!(workspace.snapshot_ids("sf"), vec!["2"]);
}

#[tokio::test]
async fn test_concurrent_regions_share_one_endpoint() {
    let server = MockServer::start().await;
    let workspace = Workspace::new();
    workspace.ingest("nyc", &["1", "2"]);
    workspace.ingest("sf", &["3", "4"]);
    workspace.ingest("tokyo", &["5"]);
    mount_photos(&server, &["1", "2", "3", "4", "5"]).await;

    let mut config = workspace.config(&server);
    config.region_concurrency = 3;
    config.fetch_concurrency = 2;
    let summary = Orchestrator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.is_success());
    let regions: Vec<&str> = summary.reports.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(regions, vec!["nyc", "sf", "tokyo"]);
    assert_eq!(workspace.snapshot_ids("sf"), vec!["3", "4"]);
    assert_eq!(request_count(&server).await, 10);
}
