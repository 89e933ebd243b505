//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search aggregation (searches, duration, result counts)
//! - Upstream sources (Jackett and Prowlarr requests)
//! - Download dispatch

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Search Metrics
// =============================================================================

/// Aggregated searches by outcome.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("searcharr_searches_total", "Total aggregated searches"),
        &["result"], // "complete", "partial", "no_sources"
    )
    .unwrap()
});

/// Wall-clock duration of one aggregated search.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "searcharr_search_duration_seconds",
            "Duration of aggregated searches",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &[],
    )
    .unwrap()
});

/// Results returned per search, after filtering.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "searcharr_search_results",
            "Number of search results returned per query",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Upstream Source Metrics
// =============================================================================

/// Upstream requests by protocol and status.
pub static SOURCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "searcharr_source_requests_total",
            "Total requests sent to upstream sources",
        ),
        &["kind", "status"], // status: "success", "http_error", "parse_error", "error"
    )
    .unwrap()
});

/// Upstream request duration.
pub static SOURCE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "searcharr_source_request_duration_seconds",
            "Duration of upstream source requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Results handed to download clients.
pub static DOWNLOADS_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "searcharr_downloads_sent_total",
            "Total results sent to download clients",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        // Sources
        Box::new(SOURCE_REQUESTS.clone()),
        Box::new(SOURCE_REQUEST_DURATION.clone()),
        // Downloads
        Box::new(DOWNLOADS_SENT.clone()),
    ]
}
