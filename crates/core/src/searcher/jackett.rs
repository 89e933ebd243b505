//! Jackett (Torznab) source client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::instance::SourceKind;

use super::http::{build_client, probe_error, probe_status, record_request};
use super::torznab::parse_feed;
use super::{ConnectionTest, IndexerSource, SearchCategory, SearchError, SearchResult};

/// Client for one Jackett instance.
pub struct JackettClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl JackettClient {
    /// Create a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn torznab_url(&self) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results/torznab/api?apikey={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Build the Torznab search URL.
    fn build_search_url(&self, query: &str, category: SearchCategory) -> String {
        let mut url = format!("{}&t=search&q={}", self.torznab_url(), urlencoding::encode(query));

        let ids = category.newznab_ids();
        if !ids.is_empty() {
            let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            url.push_str(&format!("&cat={}", joined.join(",")));
        }

        url
    }

    /// Count configured indexers. Any failure yields `None`.
    async fn indexer_count(&self) -> Option<u32> {
        let url = format!(
            "{}/api/v2.0/indexers?apikey={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        let response = self.client.get(&url).send().await.ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        let indexers: Vec<JackettIndexer> = response.json().await.ok()?;
        Some(indexers.iter().filter(|i| i.configured).count() as u32)
    }
}

#[async_trait]
impl IndexerSource for JackettClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Jackett
    }

    async fn search(
        &self,
        query: &str,
        category: SearchCategory,
        source_name: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.build_search_url(query, category);
        debug!(instance = %source_name, query = %query, "Searching Jackett");

        let started = Instant::now();
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                record_request(SourceKind::Jackett, "error", started);
                return Err(e.into());
            }
        };

        if response.status() != StatusCode::OK {
            record_request(SourceKind::Jackett, "http_error", started);
            warn!(
                instance = %source_name,
                status = response.status().as_u16(),
                "Jackett search failed"
            );
            return Ok(Vec::new());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                record_request(SourceKind::Jackett, "error", started);
                return Err(e.into());
            }
        };

        let results = match parse_feed(&body, source_name) {
            Ok(results) => results,
            Err(e) => {
                record_request(SourceKind::Jackett, "parse_error", started);
                return Err(e);
            }
        };
        record_request(SourceKind::Jackett, "success", started);
        debug!(
            instance = %source_name,
            results = results.len(),
            "Jackett search complete"
        );
        Ok(results)
    }

    async fn test_connection(&self) -> ConnectionTest {
        let url = format!("{}&t=caps", self.torznab_url());
        match self.client.get(&url).send().await {
            Ok(response) => match probe_status(response.status()) {
                Some(failed) => failed,
                None => ConnectionTest::ok(self.indexer_count().await),
            },
            Err(e) => probe_error(SourceKind::Jackett, &e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JackettIndexer {
    #[serde(default)]
    configured: bool,
}
