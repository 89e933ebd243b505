//! Routing of search results to configured download clients.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DownloadClientConfig;
use crate::instance::{CredentialError, CredentialResolver};
use crate::metrics;

use super::qbittorrent::QBittorrentClient;
use super::{DownloadClient, DownloadClientError};

/// A request to hand one result to a download client.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub client_id: i64,
    #[serde(default)]
    pub magnet_link: Option<String>,
    #[serde(default)]
    pub torrent_url: Option<String>,
}

/// Confirmation returned after a successful hand-off.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub success: bool,
    pub message: String,
    pub client_name: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Download client {0} not found")]
    ClientNotFound(i64),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Client(#[from] DownloadClientError),
}

/// Builds a [`DownloadClient`] for a configured backend.
pub trait DownloadClientConnector: Send + Sync {
    fn connect(
        &self,
        config: &DownloadClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError>;
}

/// Connector producing qBittorrent Web API clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct QBittorrentConnector;

impl DownloadClientConnector for QBittorrentConnector {
    fn connect(
        &self,
        config: &DownloadClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError> {
        Ok(Arc::new(QBittorrentClient::new(
            &config.url,
            username,
            password,
            Duration::from_secs(config.timeout_secs as u64),
        )?))
    }
}

/// A download client as shown to API clients. Credentials never leave the
/// server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientStatus {
    #[serde(flatten)]
    pub client: ClientSummary,
    pub online: bool,
    pub message: String,
}

/// Sends results to the download client named in each request.
pub struct DownloadDispatcher {
    clients: Vec<DownloadClientConfig>,
    credentials: Arc<dyn CredentialResolver>,
    connector: Arc<dyn DownloadClientConnector>,
}

impl DownloadDispatcher {
    pub fn new(
        clients: Vec<DownloadClientConfig>,
        credentials: Arc<dyn CredentialResolver>,
        connector: Arc<dyn DownloadClientConnector>,
    ) -> Self {
        Self {
            clients,
            credentials,
            connector,
        }
    }

    /// Hand a result to its client. The magnet link is preferred when both
    /// links are present.
    pub async fn send(&self, request: &DownloadRequest) -> Result<DownloadReceipt, DispatchError> {
        let magnet = non_empty(request.magnet_link.as_deref());
        let torrent_url = non_empty(request.torrent_url.as_deref());
        if magnet.is_none() && torrent_url.is_none() {
            return Err(DispatchError::InvalidRequest(
                "Either magnet_link or torrent_url is required".to_string(),
            ));
        }

        let config = self.find(request.client_id)?;
        let result = self.send_to(config, magnet, torrent_url).await;

        let label = if result.is_ok() { "success" } else { "failure" };
        metrics::DOWNLOADS_SENT.with_label_values(&[label]).inc();

        match result {
            Ok(message) => {
                info!(client = %config.name, "Sent result to download client");
                Ok(DownloadReceipt {
                    success: true,
                    message,
                    client_name: config.name.clone(),
                })
            }
            Err(e) => {
                warn!(client = %config.name, error = %e, "Failed to send result to download client");
                Err(e)
            }
        }
    }

    async fn send_to(
        &self,
        config: &DownloadClientConfig,
        magnet: Option<&str>,
        torrent_url: Option<&str>,
    ) -> Result<String, DispatchError> {
        let client = self.connect(config)?;
        let category = config.category.as_deref();

        let message = match (magnet, torrent_url) {
            (Some(uri), _) => client.add_magnet(uri, category).await?,
            (None, Some(url)) => client.add_torrent_url(url, category).await?,
            (None, None) => {
                return Err(DispatchError::InvalidRequest(
                    "Either magnet_link or torrent_url is required".to_string(),
                ))
            }
        };
        Ok(message)
    }

    pub fn list_clients(&self) -> Vec<ClientSummary> {
        self.clients.iter().map(summarize).collect()
    }

    /// Log in to one client and report its version line.
    pub async fn test_client(&self, id: i64) -> Result<String, DispatchError> {
        let config = self.find(id)?;
        let client = self.connect(config)?;
        Ok(client.test_connection().await?)
    }

    /// Probe every configured client.
    pub async fn client_statuses(&self) -> Vec<ClientStatus> {
        let probes = self.clients.iter().map(|config| async move {
            let (online, message) = match self.test_client(config.id).await {
                Ok(message) => (true, message),
                Err(e) => (false, e.to_string()),
            };
            ClientStatus {
                client: summarize(config),
                online,
                message,
            }
        });
        futures::future::join_all(probes).await
    }

    fn find(&self, id: i64) -> Result<&DownloadClientConfig, DispatchError> {
        self.clients
            .iter()
            .find(|c| c.id == id)
            .ok_or(DispatchError::ClientNotFound(id))
    }

    fn connect(&self, config: &DownloadClientConfig) -> Result<Arc<dyn DownloadClient>, DispatchError> {
        let username = self.credentials.resolve(&config.username)?;
        let password = self.credentials.resolve(&config.password)?;
        Ok(self.connector.connect(config, &username, &password)?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn summarize(config: &DownloadClientConfig) -> ClientSummary {
    ClientSummary {
        id: config.id,
        name: config.name.clone(),
        url: config.url.clone(),
        category: config.category.clone(),
    }
}
