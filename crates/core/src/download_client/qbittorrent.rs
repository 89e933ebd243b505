//! qBittorrent download client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{DownloadClient, DownloadClientError};

const ADD_ENDPOINT: &str = "/api/v2/torrents/add";

/// qBittorrent Web API v2 client.
pub struct QBittorrentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    /// Whether the cookie jar currently holds a session (cleared on 403).
    logged_in: Arc<RwLock<bool>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(
        url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, DownloadClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| {
                DownloadClientError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            logged_in: Arc::new(RwLock::new(false)),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Login; the session cookie is kept by the cookie jar.
    async fn login(&self) -> Result<(), DownloadClientError> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(self.url("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() && body.trim().eq_ignore_ascii_case("ok.") {
            debug!("qBittorrent login successful");
            *self.logged_in.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(DownloadClientError::AuthenticationFailed(
                "invalid credentials".to_string(),
            ))
        } else {
            Err(DownloadClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DownloadClientError> {
        if *self.logged_in.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// POST a multipart add request. `build_form` is called again if the
    /// session expired and the request has to be retried.
    async fn post_add<F>(&self, build_form: F) -> Result<String, DownloadClientError>
    where
        F: Fn() -> Result<multipart::Form, DownloadClientError>,
    {
        self.ensure_authenticated().await?;

        let mut response = self
            .client
            .post(self.url(ADD_ENDPOINT))
            .multipart(build_form()?)
            .send()
            .await?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.logged_in.write().await = false;
            self.login().await?;

            response = self
                .client
                .post(self.url(ADD_ENDPOINT))
                .multipart(build_form()?)
                .send()
                .await?;
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::OK if body.trim().eq_ignore_ascii_case("ok.") => {
                Ok("Torrent added successfully".to_string())
            }
            StatusCode::OK => Err(DownloadClientError::ApiError(format!(
                "Failed to add torrent: {}",
                body.trim()
            ))),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Err(DownloadClientError::InvalidTorrent(
                "Torrent file is not valid".to_string(),
            )),
            other => Err(DownloadClientError::ApiError(format!(
                "Failed to add torrent: HTTP {}",
                other.as_u16()
            ))),
        }
    }

    /// Fetch a .torrent file, following redirects.
    async fn download_torrent(&self, url: &str) -> Result<Vec<u8>, DownloadClientError> {
        let response = self.client.get(url).send().await.map_err(|e| match e {
            e if e.is_timeout() => DownloadClientError::Timeout,
            e => DownloadClientError::ApiError(format!("Failed to download torrent file: {}", e)),
        })?;

        if response.status() != StatusCode::OK {
            return Err(DownloadClientError::ApiError(format!(
                "Failed to download torrent file: HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            DownloadClientError::ApiError(format!("Failed to download torrent file: {}", e))
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn test_connection(&self) -> Result<String, DownloadClientError> {
        self.login().await?;

        let response = self.client.get(self.url("/api/v2/app/version")).send().await?;
        if response.status() != StatusCode::OK {
            return Err(DownloadClientError::ApiError(format!(
                "API access failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let version = response.text().await?;
        Ok(format!("Connected to qBittorrent {}", version.trim()))
    }

    async fn add_magnet(
        &self,
        uri: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError> {
        debug!(
            hash = extract_hash_from_magnet(uri).as_deref().unwrap_or("unknown"),
            "Adding magnet to qBittorrent"
        );

        self.post_add(|| {
            let mut form = multipart::Form::new().text("urls", uri.to_string());
            if let Some(cat) = category {
                form = form.text("category", cat.to_string());
            }
            Ok(form)
        })
        .await
    }

    async fn add_torrent_url(
        &self,
        url: &str,
        category: Option<&str>,
    ) -> Result<String, DownloadClientError> {
        let data = self.download_torrent(url).await?;
        debug!(bytes = data.len(), "Downloaded torrent file, adding to qBittorrent");

        self.post_add(|| {
            let file_part = multipart::Part::bytes(data.clone())
                .file_name("torrent.torrent")
                .mime_str("application/x-bittorrent")
                .map_err(|e| DownloadClientError::InvalidTorrent(e.to_string()))?;

            let mut form = multipart::Form::new().part("torrents", file_part);
            if let Some(cat) = category {
                form = form.text("category", cat.to_string());
            }
            Ok(form)
        })
        .await
    }
}

/// Extract the info hash from a magnet URI.
fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .map(|hash| hash.to_lowercase())
}
