//! Types for the torrent search system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instance::{CredentialError, SourceKind};

/// Longest accepted query, in characters.
pub const MAX_QUERY_LEN: usize = 500;

/// Content category for filtering search results.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SearchCategory {
    #[default]
    All,
    Movies,
    #[serde(rename = "TV")]
    Tv,
    Music,
    Software,
    Games,
    Books,
    Anime,
    Other,
}

impl SearchCategory {
    /// Every category, in display order.
    pub const ALL: [SearchCategory; 9] = [
        SearchCategory::All,
        SearchCategory::Movies,
        SearchCategory::Tv,
        SearchCategory::Music,
        SearchCategory::Software,
        SearchCategory::Games,
        SearchCategory::Books,
        SearchCategory::Anime,
        SearchCategory::Other,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::All => "All",
            SearchCategory::Movies => "Movies",
            SearchCategory::Tv => "TV",
            SearchCategory::Music => "Music",
            SearchCategory::Software => "Software",
            SearchCategory::Games => "Games",
            SearchCategory::Books => "Books",
            SearchCategory::Anime => "Anime",
            SearchCategory::Other => "Other",
        }
    }

    /// Newznab category codes. Empty for `All`, which sends no constraint.
    pub fn newznab_ids(&self) -> &'static [u32] {
        match self {
            SearchCategory::All => &[],
            SearchCategory::Movies => &[2000, 2010, 2020, 2030, 2040, 2045, 2050, 2060],
            SearchCategory::Tv => &[5000, 5010, 5020, 5030, 5040, 5045, 5050, 5060, 5070, 5080],
            SearchCategory::Music => &[3000, 3010, 3020, 3030, 3040],
            SearchCategory::Software => &[4000, 4010, 4020, 4030, 4040, 4050, 4060, 4070],
            SearchCategory::Games => &[1000, 1010, 1020, 1030, 1040, 1050, 1060, 1070, 1080],
            SearchCategory::Books => &[7000, 7010, 7020, 7030, 7040, 7050, 7060],
            SearchCategory::Anime => &[5070],
            SearchCategory::Other => &[8000, 8010, 8020],
        }
    }
}

impl std::fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized search result from one instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Content fingerprint (12 hex chars).
    pub id: String,
    pub title: String,
    /// Display name of the instance that returned it.
    pub source: String,
    pub source_type: SourceKind,
    /// Tracker name within the instance.
    pub indexer: String,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size, derived from `size`.
    pub size_formatted: String,
    pub seeders: u32,
    pub leechers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,
}

/// Field to sort results by.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Seeders,
    Size,
    Date,
    Name,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Which instances to query.
///
/// An omitted id set means "all instances of that kind", unless `exclusive`
/// is set, in which case it means none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jackett_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prowlarr_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub exclusive: bool,
}

/// What to ask the directory for, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionScope<'a> {
    All,
    Only(&'a [i64]),
    Nothing,
}

impl InstanceSelection {
    pub fn ids_for(&self, kind: SourceKind) -> Option<&[i64]> {
        match kind {
            SourceKind::Jackett => self.jackett_ids.as_deref(),
            SourceKind::Prowlarr => self.prowlarr_ids.as_deref(),
        }
    }

    /// Resolve the selection rule for one kind.
    pub fn scope(&self, kind: SourceKind) -> SelectionScope<'_> {
        match (self.ids_for(kind), self.exclusive) {
            (Some(ids), _) => SelectionScope::Only(ids),
            (None, false) => SelectionScope::All,
            (None, true) => SelectionScope::Nothing,
        }
    }
}

/// Result filters applied after merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilters {
    #[serde(default)]
    pub min_seeders: u32,
    /// Size ceiling such as "10GB" or "500MB". Unparseable values disable it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
}

/// A search request as accepted by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub category: SearchCategory,
    #[serde(flatten)]
    pub selection: InstanceSelection,
    #[serde(flatten)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: SearchCategory::default(),
            selection: InstanceSelection::default(),
            filters: SearchFilters::default(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }

    /// Check caller preconditions and trim the query.
    pub fn validate(mut self) -> Result<Self, SearchError> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        let len = trimmed.chars().count();
        if len > MAX_QUERY_LEN {
            return Err(SearchError::InvalidRequest(format!(
                "query is {} characters, maximum is {}",
                len, MAX_QUERY_LEN
            )));
        }
        self.query = trimmed.to_string();
        Ok(self)
    }
}

/// Output of one aggregated search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Filtered and sorted results.
    pub results: Vec<SearchResult>,
    /// One entry per failed instance, plus diagnostics.
    pub errors: Vec<String>,
    /// Instances scheduled, before filtering.
    pub sources_queried: usize,
    pub duration_ms: u64,
}

/// Result of probing an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer_count: Option<u32>,
}

impl ConnectionTest {
    pub fn ok(indexer_count: Option<u32>) -> Self {
        Self {
            success: true,
            message: "Connection successful".to_string(),
            indexer_count,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            indexer_count: None,
        }
    }
}

/// Errors that can occur during search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Instance directory error: {0}")]
    Directory(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CredentialError> for SearchError {
    fn from(e: CredentialError) -> Self {
        SearchError::Credential(e.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// One upstream instance that can be searched.
#[async_trait]
pub trait IndexerSource: Send + Sync {
    /// Protocol spoken by this source.
    fn kind(&self) -> SourceKind;

    /// Run a query and normalize the response.
    ///
    /// `source_name` becomes the `source` of every result. Non-200 responses
    /// yield an empty list; transport failures are errors.
    async fn search(
        &self,
        query: &str,
        category: SearchCategory,
        source_name: &str,
    ) -> Result<Vec<SearchResult>, SearchError>;

    /// Probe reachability and credentials. Never fails; problems are
    /// reported in the returned message.
    async fn test_connection(&self) -> ConnectionTest;
}
