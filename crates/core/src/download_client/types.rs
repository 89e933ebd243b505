//! Types for the download client abstraction.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur talking to a download client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    InvalidTorrent(String),

    #[error("{0}")]
    ApiError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DownloadClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloadClientError::Timeout
        } else if e.is_connect() {
            DownloadClientError::ConnectionFailed(e.to_string())
        } else {
            DownloadClientError::ApiError(e.to_string())
        }
    }
}

/// A backend that accepts torrents for download.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Log in and query the backend. Returns a human-readable status line.
    async fn test_connection(&self) -> Result<String, DownloadClientError>;

    /// Add a torrent by magnet URI.
    async fn add_magnet(
        &self,
        uri: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError>;

    /// Download a .torrent file from `url` and add it.
    async fn add_torrent_url(
        &self,
        url: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError>;
}
