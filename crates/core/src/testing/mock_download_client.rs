//! Mock download client for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::DownloadClientConfig;
use crate::download_client::{DownloadClient, DownloadClientConnector, DownloadClientError};

/// A torrent handed to the mock, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddedTorrent {
    Magnet {
        uri: String,
        category: Option<String>,
    },
    Url {
        url: String,
        category: Option<String>,
    },
}

#[derive(Debug, Default)]
struct State {
    added: Vec<AddedTorrent>,
    error: Option<DownloadClientError>,
}

/// Mock implementation of the [`DownloadClient`] trait.
///
/// Records every add; once [`fail_with`](Self::fail_with) is set, every
/// operation fails with that error.
#[derive(Debug, Clone, Default)]
pub struct MockDownloadClient {
    state: Arc<Mutex<State>>,
}

impl MockDownloadClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> Vec<AddedTorrent> {
        self.lock().added.clone()
    }

    pub fn fail_with(&self, error: DownloadClientError) {
        self.lock().error = Some(error);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, torrent: AddedTorrent) -> Result<String, DownloadClientError> {
        let mut state = self.lock();
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        state.added.push(torrent);
        Ok("Torrent added successfully".to_string())
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn test_connection(&self) -> Result<String, DownloadClientError> {
        match &self.lock().error {
            Some(error) => Err(error.clone()),
            None => Ok("Connected to mock client".to_string()),
        }
    }

    async fn add_magnet(
        &self,
        uri: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError> {
        self.record(AddedTorrent::Magnet {
            uri: uri.to_string(),
            category: category.map(str::to_string),
        })
    }

    async fn add_torrent_url(
        &self,
        url: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError> {
        self.record(AddedTorrent::Url {
            url: url.to_string(),
            category: category.map(str::to_string),
        })
    }
}

/// Connector that hands out one shared [`MockDownloadClient`] for every
/// configured client.
#[derive(Debug, Clone, Default)]
pub struct MockDownloadClientConnector {
    client: MockDownloadClient,
}

impl MockDownloadClientConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> &MockDownloadClient {
        &self.client
    }

    pub fn added(&self) -> Vec<AddedTorrent> {
        self.client.added()
    }

    pub fn fail_with(&self, error: DownloadClientError) {
        self.client.fail_with(error);
    }
}

impl DownloadClientConnector for MockDownloadClientConnector {
    fn connect(
        &self,
        _config: &DownloadClientConfig,
        _username: &str,
        _password: &str,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError> {
        Ok(Arc::new(self.client.clone()))
    }
}
