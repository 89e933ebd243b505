//! Testing utilities and mock implementations.
//!
//! Mock sources and download clients stand in for real upstreams. The real
//! protocol clients are tested against `wiremock` servers instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use searcharr_core::testing::{fixtures, MockSourceConnector};
//!
//! let connector = Arc::new(MockSourceConnector::new());
//! connector.set_results("Home Jackett", vec![fixtures::search_result("Ubuntu 24.04")]);
//!
//! let aggregator = SearchAggregator::new(directory, credentials, connector, 5);
//! ```

mod mock_download_client;
mod mock_source;

pub use mock_download_client::{AddedTorrent, MockDownloadClient, MockDownloadClientConnector};
pub use mock_source::{MockIndexerSource, MockSourceConnector, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::DownloadClientConfig;
    use crate::instance::{Instance, SourceKind};
    use crate::searcher::{format_size, result_fingerprint, SearchResult};

    /// Literal credential used by fixture instances.
    pub const TEST_API_KEY: &str = "test-api-key-0001";

    /// A configured instance with a literal API key.
    pub fn instance(id: i64, name: &str, kind: SourceKind) -> Instance {
        Instance {
            id,
            name: name.to_string(),
            url: format!("http://{}.test", name.to_lowercase().replace(' ', "-")),
            kind,
            credential: TEST_API_KEY.to_string(),
        }
    }

    /// A result with the given title and reasonable defaults.
    pub fn search_result(title: &str) -> SearchResult {
        result_with(title, 10, 1024 * 1024 * 700)
    }

    /// A result with explicit seeders and size, the fields filters act on.
    pub fn result_with(title: &str, seeders: u32, size: u64) -> SearchResult {
        let id = result_fingerprint("mock", "MockIndexer", title, size);
        SearchResult {
            magnet_link: Some(format!("magnet:?xt=urn:btih:{}", id)),
            id,
            title: title.to_string(),
            source: "mock".to_string(),
            source_type: SourceKind::Jackett,
            indexer: "MockIndexer".to_string(),
            size,
            size_formatted: format_size(size),
            seeders,
            leechers: 0,
            date: None,
            category: "Movies".to_string(),
            torrent_url: None,
            info_url: None,
        }
    }

    /// A download client with literal credentials.
    pub fn download_client_config(id: i64, name: &str) -> DownloadClientConfig {
        DownloadClientConfig {
            id,
            name: name.to_string(),
            url: format!("http://{}.test:8081", name.to_lowercase().replace(' ', "-")),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            category: None,
            timeout_secs: 10,
        }
    }
}
