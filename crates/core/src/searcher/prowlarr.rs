//! Prowlarr (JSON API) source client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::instance::SourceKind;

use super::http::{build_client, probe_error, probe_status, record_request};
use super::normalize::{clamp_count, parse_iso_date, ResultBuilder};
use super::{ConnectionTest, IndexerSource, SearchCategory, SearchError, SearchResult};

const API_KEY_HEADER: &str = "X-Api-Key";

/// Client for one Prowlarr instance.
pub struct ProwlarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ProwlarrClient {
    /// Create a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, endpoint)
    }

    fn build_search_url(&self, query: &str, category: SearchCategory) -> String {
        let mut url = format!(
            "{}?query={}&type=search",
            self.api_url("search"),
            urlencoding::encode(query)
        );
        for id in category.newznab_ids() {
            url.push_str(&format!("&categories={}", id));
        }
        url
    }

    /// Count enabled indexers. Any failure yields `None`.
    async fn indexer_count(&self) -> Option<u32> {
        let response = self
            .client
            .get(self.api_url("indexer"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        let indexers: Vec<ProwlarrIndexer> = response.json().await.ok()?;
        Some(indexers.iter().filter(|i| i.enable).count() as u32)
    }
}

#[async_trait]
impl IndexerSource for ProwlarrClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Prowlarr
    }

    async fn search(
        &self,
        query: &str,
        category: SearchCategory,
        source_name: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.build_search_url(query, category);
        debug!(instance = %source_name, query = %query, "Searching Prowlarr");

        let started = Instant::now();
        let response = match self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                record_request(SourceKind::Prowlarr, "error", started);
                return Err(e.into());
            }
        };

        if response.status() != StatusCode::OK {
            record_request(SourceKind::Prowlarr, "http_error", started);
            warn!(
                instance = %source_name,
                status = response.status().as_u16(),
                "Prowlarr search failed"
            );
            return Ok(Vec::new());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                record_request(SourceKind::Prowlarr, "error", started);
                return Err(e.into());
            }
        };

        let results = match parse_search_response(&body, source_name) {
            Ok(results) => results,
            Err(e) => {
                record_request(SourceKind::Prowlarr, "parse_error", started);
                return Err(e);
            }
        };
        record_request(SourceKind::Prowlarr, "success", started);
        debug!(
            instance = %source_name,
            results = results.len(),
            "Prowlarr search complete"
        );
        Ok(results)
    }

    async fn test_connection(&self) -> ConnectionTest {
        let response = self
            .client
            .get(self.api_url("system/status"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await;
        match response {
            Ok(response) => match probe_status(response.status()) {
                Some(failed) => failed,
                None => ConnectionTest::ok(self.indexer_count().await),
            },
            Err(e) => probe_error(SourceKind::Prowlarr, &e),
        }
    }
}

/// Parse a Prowlarr search response body.
///
/// The body must be a JSON array; each element is decoded on its own.
/// Elements without a title, or whose size or peer counts are not
/// numbers, are skipped. Unexpected category shapes fall back to "Other".
pub fn parse_search_response(body: &str, source: &str) -> Result<Vec<SearchResult>, SearchError> {
    let items: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| SearchError::ParseError(format!("expected a JSON array: {}", e)))?;

    Ok(items
        .into_iter()
        .filter_map(|item| {
            let decoded = serde_json::from_value::<ProwlarrRelease>(item)
                .map_err(|e| e.to_string())
                .and_then(|release| release.into_result(source));
            match decoded {
                Ok(Some(result)) => Some(result),
                Ok(None) => {
                    debug!(source = %source, "Skipping Prowlarr item without title");
                    None
                }
                Err(reason) => {
                    debug!(source = %source, reason = %reason, "Skipping malformed Prowlarr item");
                    None
                }
            }
        })
        .collect())
}

// Prowlarr API response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProwlarrRelease {
    title: Option<String>,
    guid: Option<String>,
    indexer: Option<String>,
    // Numbers arrive as integers or floats depending on the indexer.
    size: Option<Value>,
    seeders: Option<Value>,
    leechers: Option<Value>,
    publish_date: Option<Value>,
    categories: Option<Value>,
    magnet_url: Option<String>,
    download_url: Option<String>,
    info_url: Option<String>,
}

impl ProwlarrRelease {
    fn into_result(self, source: &str) -> Result<Option<SearchResult>, String> {
        let size = number_field("size", self.size)?;
        let seeders = number_field("seeders", self.seeders)?;
        let leechers = number_field("leechers", self.leechers)?;

        let builder = ResultBuilder {
            title: self.title,
            indexer: self.indexer,
            size: size.map(|s| s.max(0) as u64),
            seeders: seeders.map(clamp_count),
            leechers: leechers.map(clamp_count),
            date: self
                .publish_date
                .as_ref()
                .and_then(Value::as_str)
                .and_then(parse_iso_date),
            category: first_category_name(self.categories.as_ref()),
            magnet_link: self.magnet_url,
            torrent_url: self.download_url,
            info_url: self.info_url,
            guid: self.guid,
            ..ResultBuilder::default()
        };
        Ok(builder.build(source, SourceKind::Prowlarr))
    }
}

/// Read an optional numeric field. Floats are truncated; any other JSON
/// type is an error.
fn number_field(field: &str, value: Option<Value>) -> Result<Option<i64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))),
        Some(other) => Err(format!("{} = {}", field, other)),
    }
}

/// Name of the first category, when it is an object carrying one.
fn first_category_name(categories: Option<&Value>) -> Option<String> {
    categories?
        .as_array()?
        .first()?
        .as_object()?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct ProwlarrIndexer {
    #[serde(default)]
    enable: bool,
}
