//! Torrent search aggregation.
//!
//! This module provides the `IndexerSource` trait with Jackett (Torznab XML)
//! and Prowlarr (JSON) implementations, and a `SearchAggregator` that fans a
//! query out to many instances under a bounded concurrency limit.

mod aggregator;
mod connector;
mod filter;
mod http;
mod jackett;
mod limiter;
mod normalize;
mod prowlarr;
mod torznab;
mod types;

pub use aggregator::{
    Availability, InstanceStatus, InstanceSummary, SearchAggregator, NO_INSTANCES_CONFIGURED,
};
pub use connector::{HttpSourceConnector, SourceConnector};
pub use filter::{apply_filters, parse_size, sort_results};
pub use jackett::JackettClient;
pub use limiter::ConcurrencyLimiter;
pub use normalize::{format_size, result_fingerprint};
pub use prowlarr::{parse_search_response, ProwlarrClient};
pub use torznab::parse_feed;
pub use types::*;
