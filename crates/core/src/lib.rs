pub mod config;
pub mod download_client;
pub mod instance;
pub mod metrics;
pub mod searcher;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use download_client::{
    DispatchError, DownloadClient, DownloadClientError, DownloadDispatcher, DownloadReceipt,
    DownloadRequest, QBittorrentConnector,
};
pub use instance::{
    ConfigCredentialResolver, ConfigInstanceDirectory, CredentialResolver, Instance,
    InstanceDirectory, SourceKind,
};
pub use searcher::{
    HttpSourceConnector, SearchAggregator, SearchCategory, SearchError, SearchOutcome,
    SearchRequest, SearchResult,
};
