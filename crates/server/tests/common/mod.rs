//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock sources and download clients injected, enabling E2E testing
//! without Jackett, Prowlarr or qBittorrent.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use searcharr_core::{
    config::InstanceConfig,
    testing::{MockDownloadClientConnector, MockSourceConnector},
    Config, ConfigCredentialResolver, ConfigInstanceDirectory, DownloadDispatcher,
    SearchAggregator,
};
use searcharr_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use searcharr_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new();
///     fixture.sources.set_results("Jackett", vec![fixtures::search_result("Ubuntu")]);
///
///     let response = fixture.post("/api/v1/search", json!({ "query": "ubuntu" })).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock sources - configure per-instance results, errors and delays
    pub sources: Arc<MockSourceConnector>,
    /// Mock download client - inspect added torrents
    pub downloads: Arc<MockDownloadClientConnector>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// One Jackett instance ("Jackett", id 1), one Prowlarr instance
    /// ("Prowlarr", id 1) and one download client ("qBittorrent", id 1).
    pub fn new() -> Self {
        Self::with_config(default_config())
    }

    /// Build a fixture from an explicit config.
    pub fn with_config(config: Config) -> Self {
        let sources = Arc::new(MockSourceConnector::new());
        let downloads = Arc::new(MockDownloadClientConnector::new());
        let credentials = Arc::new(ConfigCredentialResolver);

        let aggregator = SearchAggregator::new(
            Arc::new(ConfigInstanceDirectory::from_config(&config)),
            credentials.clone(),
            sources.clone(),
            config.search.concurrent_limit,
        );
        let dispatcher = DownloadDispatcher::new(
            config.download_clients.clone(),
            credentials,
            downloads.clone(),
        );

        let state = Arc::new(AppState::new(config, aggregator, dispatcher));
        let router = create_router(state);

        Self {
            router,
            sources,
            downloads,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// GET a path and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

fn instance_config(id: i64, name: &str, url: &str) -> InstanceConfig {
    InstanceConfig {
        id,
        name: name.to_string(),
        url: url.to_string(),
        api_key: "abcdefghijklmnop".to_string(),
    }
}

/// Config with one instance of each kind and one download client.
pub fn default_config() -> Config {
    let mut client = fixtures::download_client_config(1, "qBittorrent");
    client.category = Some("searcharr".to_string());

    Config {
        jackett: vec![instance_config(1, "Jackett", "http://jackett.test:9117")],
        prowlarr: vec![instance_config(1, "Prowlarr", "http://prowlarr.test:9696")],
        download_clients: vec![client],
        ..Config::default()
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
