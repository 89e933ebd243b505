//! HTTP plumbing shared by the Jackett and Prowlarr clients.

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::instance::SourceKind;
use crate::metrics;

use super::{ConnectionTest, SearchError};

pub(crate) fn build_client(timeout: Duration) -> Result<Client, SearchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Classify the status of a probe response. `None` means reachable.
pub(crate) fn probe_status(status: StatusCode) -> Option<ConnectionTest> {
    match status {
        StatusCode::OK => None,
        StatusCode::UNAUTHORIZED => Some(ConnectionTest::failed("Invalid API key")),
        other => Some(ConnectionTest::failed(format!(
            "Connection failed: HTTP {}",
            other.as_u16()
        ))),
    }
}

/// Classify a transport failure during a probe.
pub(crate) fn probe_error(kind: SourceKind, e: &reqwest::Error) -> ConnectionTest {
    if e.is_timeout() {
        ConnectionTest::failed("Connection timed out")
    } else if e.is_connect() {
        ConnectionTest::failed(format!(
            "Could not connect to {} server",
            kind.display_name()
        ))
    } else {
        warn!(kind = %kind, error = %e, "Error testing connection");
        ConnectionTest::failed(format!("Connection error: {}", e))
    }
}

/// Record the outcome of one upstream search request.
pub(crate) fn record_request(kind: SourceKind, status: &str, started: Instant) {
    metrics::SOURCE_REQUESTS
        .with_label_values(&[kind.as_str(), status])
        .inc();
    metrics::SOURCE_REQUEST_DURATION
        .with_label_values(&[kind.as_str()])
        .observe(started.elapsed().as_secs_f64());
}
