use std::sync::Arc;

use searcharr_core::{
    Config, ConfigCredentialResolver, ConfigInstanceDirectory, CredentialResolver,
    DownloadDispatcher, HttpSourceConnector, QBittorrentConnector, SanitizedConfig,
    SearchAggregator,
};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: SearchAggregator,
    dispatcher: DownloadDispatcher,
}

impl AppState {
    pub fn new(config: Config, aggregator: SearchAggregator, dispatcher: DownloadDispatcher) -> Self {
        Self {
            config,
            aggregator,
            dispatcher,
        }
    }

    /// Wire the real HTTP clients from configuration.
    pub fn from_config(config: Config) -> Self {
        let credentials: Arc<dyn CredentialResolver> = Arc::new(ConfigCredentialResolver);

        let aggregator = SearchAggregator::new(
            Arc::new(ConfigInstanceDirectory::from_config(&config)),
            Arc::clone(&credentials),
            Arc::new(HttpSourceConnector::from_config(&config.search)),
            config.search.concurrent_limit,
        );
        let dispatcher = DownloadDispatcher::new(
            config.download_clients.clone(),
            credentials,
            Arc::new(QBittorrentConnector),
        );

        Self::new(config, aggregator, dispatcher)
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &SearchAggregator {
        &self.aggregator
    }

    pub fn dispatcher(&self) -> &DownloadDispatcher {
        &self.dispatcher
    }
}
