//! End-to-end tests for the searcharr HTTP API.
//!
//! These run the full router in-process with mock sources and download
//! clients, covering search aggregation, instance probes and download
//! dispatch.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};
use searcharr_core::{
    download_client::DownloadClientError, searcher::ConnectionTest, testing::AddedTorrent,
    Config, SearchError,
};

// =============================================================================
// Health, config, metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["jackett"][0]["name"], "Jackett");
    assert_eq!(response.body["jackett"][0]["api_key_configured"], true);
    assert_eq!(response.body["download_clients"][0]["credentials_configured"], true);

    let text = response.body.to_string();
    assert!(!text.contains("abcdefghijklmnop"));
    assert!(!text.contains("adminadmin"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("searcharr_http_requests_total"));
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_merges_and_sorts() {
    let fixture = TestFixture::new();
    fixture
        .sources
        .set_results("Jackett", vec![fixtures::result_with("Ubuntu 24.04", 12, 1024)]);
    fixture.sources.set_results(
        "Prowlarr",
        vec![
            fixtures::result_with("Ubuntu 22.04", 80, 2048),
            fixtures::result_with("Ubuntu 20.04", 3, 4096),
        ],
    );

    let response = fixture
        .post("/api/v1/search", json!({ "query": "ubuntu" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["query"], "ubuntu");
    assert_eq!(response.body["category"], "All");
    assert_eq!(response.body["total_results"], 3);
    assert_eq!(response.body["sources_queried"], 2);
    assert_eq!(response.body["errors"], json!([]));

    let seeders: Vec<u64> = response.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["seeders"].as_u64().unwrap())
        .collect();
    assert_eq!(seeders, vec![80, 12, 3]);
    assert_eq!(response.body["results"][0]["source"], "Prowlarr");
    assert_eq!(response.body["results"][0]["source_type"], "prowlarr");
}

#[tokio::test]
async fn test_search_with_filters_and_sort() {
    let fixture = TestFixture::new();
    fixture.sources.set_results(
        "Jackett",
        vec![
            fixtures::result_with("beta", 10, 100),
            fixtures::result_with("Alpha", 10, 200),
            fixtures::result_with("gamma", 0, 50),
            fixtures::result_with("delta", 10, 5 * 1024 * 1024),
        ],
    );

    let response = fixture
        .post(
            "/api/v1/search",
            json!({
                "query": "greek",
                "category": "Movies",
                "prowlarr_ids": [],
                "min_seeders": 1,
                "max_size": "1MB",
                "sort_by": "name",
                "sort_order": "asc"
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["sources_queried"], 1);
    let titles: Vec<&str> = response.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "beta"]);
    assert_eq!(
        fixture.sources.searches()[0].category,
        searcharr_core::SearchCategory::Movies
    );
}

#[tokio::test]
async fn test_search_partial_failure_is_200() {
    let fixture = TestFixture::new();
    fixture
        .sources
        .set_results("Jackett", vec![fixtures::search_result("Debian 12")]);
    fixture.sources.set_error(
        "Prowlarr",
        SearchError::ConnectionFailed("connection refused".to_string()),
    );

    let response = fixture
        .post("/api/v1/search", json!({ "query": "debian" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total_results"], 1);
    assert_eq!(response.body["sources_queried"], 2);
    let errors = response.body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .as_str()
        .unwrap()
        .starts_with("Error searching Prowlarr:"));
}

#[tokio::test]
async fn test_search_exclusive_nothing_selected() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "query": "anything", "exclusive": true }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["sources_queried"], 0);
    assert_eq!(response.body["errors"], json!(["No instances configured"]));
    assert_eq!(fixture.sources.search_count(), 0);
}

#[tokio::test]
async fn test_search_no_instances_configured() {
    let fixture = TestFixture::with_config(Config::default());

    let response = fixture
        .post("/api/v1/search", json!({ "query": "anything" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total_results"], 0);
    assert_eq!(response.body["errors"], json!(["No instances configured"]));
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/search", json!({ "query": "   " }))
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].is_string());
    assert_eq!(fixture.sources.search_count(), 0);
}

#[tokio::test]
async fn test_search_rejects_long_query() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/search", json!({ "query": "x".repeat(501) }))
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_rejects_unknown_category() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "query": "x", "category": "Podcasts" }),
        )
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fixture.sources.search_count(), 0);
}

#[tokio::test]
async fn test_search_rejects_unknown_sort_field() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "query": "x", "sort_by": "popularity" }),
        )
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_malformed_json() {
    let fixture = TestFixture::new();
    let response = fixture.post_raw("/api/v1/search", "{not json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_categories() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/search/categories").await;

    assert_status!(response, StatusCode::OK);
    let categories = response.body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 9);
    assert_eq!(categories[0], "All");
    assert!(categories.contains(&json!("TV")));
}

// =============================================================================
// Instances
// =============================================================================

#[tokio::test]
async fn test_list_instances_masks_keys() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/instances").await;

    assert_status!(response, StatusCode::OK);
    let instances = response.body["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0]["kind"], "jackett");
    assert_eq!(instances[0]["api_key"], "abcd...mnop");
}

#[tokio::test]
async fn test_instance_status() {
    let fixture = TestFixture::new();
    fixture
        .sources
        .set_connection("Prowlarr", ConnectionTest::failed("Invalid API key"));

    let response = fixture.get("/api/v1/instances/status").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total_online"], 1);
    assert_eq!(response.body["jackett"][0]["status"], "online");
    assert_eq!(response.body["prowlarr"][0]["status"], "offline");
    assert_eq!(response.body["prowlarr"][0]["name"], "Prowlarr");
}

#[tokio::test]
async fn test_test_instance() {
    let fixture = TestFixture::new();
    fixture
        .sources
        .set_connection("Jackett", ConnectionTest::ok(Some(7)));

    let response = fixture.post_empty("/api/v1/instances/jackett/1/test").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["indexer_count"], 7);
}

#[tokio::test]
async fn test_test_instance_not_found() {
    let fixture = TestFixture::new();

    let unknown_id = fixture.post_empty("/api/v1/instances/prowlarr/99/test").await;
    assert_status!(unknown_id, StatusCode::NOT_FOUND);

    let unknown_kind = fixture.post_empty("/api/v1/instances/sonarr/1/test").await;
    assert_status!(unknown_kind, StatusCode::NOT_FOUND);
}

// =============================================================================
// Download clients
// =============================================================================

#[tokio::test]
async fn test_list_clients() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/clients").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["clients"][0]["name"], "qBittorrent");
    assert_eq!(response.body["clients"][0]["category"], "searcharr");
    assert!(response.body["clients"][0].get("password").is_none());
}

#[tokio::test]
async fn test_client_status_and_test() {
    let fixture = TestFixture::new();

    let status = fixture.get("/api/v1/clients/status").await;
    assert_status!(status, StatusCode::OK);
    assert_eq!(status.body["total_online"], 1);

    let test = fixture.post_empty("/api/v1/clients/1/test").await;
    assert_status!(test, StatusCode::OK);
    assert_eq!(test.body["success"], true);

    fixture.downloads.fail_with(DownloadClientError::AuthenticationFailed(
        "invalid credentials".to_string(),
    ));
    let failed = fixture.post_empty("/api/v1/clients/1/test").await;
    assert_status!(failed, StatusCode::OK);
    assert_eq!(failed.body["success"], false);
    assert_eq!(
        failed.body["message"],
        "Authentication failed: invalid credentials"
    );

    let missing = fixture.post_empty("/api/v1/clients/5/test").await;
    assert_status!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_magnet() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/download",
            json!({ "client_id": 1, "magnet_link": "magnet:?xt=urn:btih:abc" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["client_name"], "qBittorrent");
    assert_eq!(
        fixture.downloads.added(),
        vec![AddedTorrent::Magnet {
            uri: "magnet:?xt=urn:btih:abc".to_string(),
            category: Some("searcharr".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_download_errors() {
    let fixture = TestFixture::new();

    let no_link = fixture
        .post("/api/v1/download", json!({ "client_id": 1 }))
        .await;
    assert_status!(no_link, StatusCode::BAD_REQUEST);

    let unknown_client = fixture
        .post(
            "/api/v1/download",
            json!({ "client_id": 9, "torrent_url": "http://example.test/a.torrent" }),
        )
        .await;
    assert_status!(unknown_client, StatusCode::NOT_FOUND);

    fixture.downloads.fail_with(DownloadClientError::InvalidTorrent(
        "Torrent file is not valid".to_string(),
    ));
    let rejected = fixture
        .post(
            "/api/v1/download",
            json!({ "client_id": 1, "torrent_url": "http://example.test/a.torrent" }),
        )
        .await;
    assert_status!(rejected, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.body["error"], "Torrent file is not valid");
}
