use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    /// Torznab proxy instances.
    #[serde(default)]
    pub jackett: Vec<InstanceConfig>,
    /// Indexer-manager instances.
    #[serde(default)]
    pub prowlarr: Vec<InstanceConfig>,
    /// Download client backends.
    #[serde(default)]
    pub download_clients: Vec<DownloadClientConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Search aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Max upstream calls in flight during one search (default: 5).
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,
    /// Per-request timeout for Jackett instances in seconds (default: 30).
    #[serde(default = "default_source_timeout")]
    pub jackett_timeout_secs: u32,
    /// Per-request timeout for Prowlarr instances in seconds (default: 30).
    #[serde(default = "default_source_timeout")]
    pub prowlarr_timeout_secs: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            concurrent_limit: default_concurrent_limit(),
            jackett_timeout_secs: default_source_timeout(),
            prowlarr_timeout_secs: default_source_timeout(),
        }
    }
}

fn default_concurrent_limit() -> usize {
    5
}

fn default_source_timeout() -> u32 {
    30
}

/// A configured Jackett or Prowlarr instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    pub id: i64,
    /// Display name, attached to every result as its source.
    pub name: String,
    /// Base URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Credential handle: a literal API key or `env:VAR_NAME`.
    pub api_key: String,
}

/// A configured qBittorrent download client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadClientConfig {
    pub id: i64,
    pub name: String,
    /// qBittorrent Web UI URL (e.g., "http://localhost:8081")
    pub url: String,
    /// Credential handle for the username.
    pub username: String,
    /// Credential handle for the password.
    pub password: String,
    /// Category/label applied to added torrents.
    #[serde(default)]
    pub category: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u32,
}

fn default_client_timeout() -> u32 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub search: SearchConfig,
    pub jackett: Vec<SanitizedInstanceConfig>,
    pub prowlarr: Vec<SanitizedInstanceConfig>,
    pub download_clients: Vec<SanitizedDownloadClientConfig>,
}

/// Sanitized instance config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedInstanceConfig {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub api_key_configured: bool,
}

/// Sanitized download client config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloadClientConfig {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub credentials_configured: bool,
    pub timeout_secs: u32,
}

impl From<&InstanceConfig> for SanitizedInstanceConfig {
    fn from(instance: &InstanceConfig) -> Self {
        Self {
            id: instance.id,
            name: instance.name.clone(),
            url: instance.url.clone(),
            api_key_configured: !instance.api_key.is_empty(),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            logging: config.logging.clone(),
            search: config.search.clone(),
            jackett: config.jackett.iter().map(Into::into).collect(),
            prowlarr: config.prowlarr.iter().map(Into::into).collect(),
            download_clients: config
                .download_clients
                .iter()
                .map(|c| SanitizedDownloadClientConfig {
                    id: c.id,
                    name: c.name.clone(),
                    url: c.url.clone(),
                    category: c.category.clone(),
                    credentials_configured: !c.username.is_empty() && !c.password.is_empty(),
                    timeout_secs: c.timeout_secs,
                })
                .collect(),
        }
    }
}
