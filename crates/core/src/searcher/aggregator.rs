//! Fan-out search across every selected instance.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::instance::{mask_secret, CredentialResolver, Instance, InstanceDirectory, SourceKind};
use crate::metrics;

use super::connector::SourceConnector;
use super::filter::{apply_filters, sort_results};
use super::limiter::ConcurrencyLimiter;
use super::{
    ConnectionTest, SearchCategory, SearchError, SearchOutcome, SearchRequest, SearchResult,
    SelectionScope,
};

/// Diagnostic reported when the selection resolves to no instances.
pub const NO_INSTANCES_CONFIGURED: &str = "No instances configured";

const KINDS: [SourceKind; 2] = [SourceKind::Jackett, SourceKind::Prowlarr];

/// Outcome of searching one instance.
#[derive(Debug)]
enum UnitOutcome {
    Found(Vec<SearchResult>),
    Failed(String),
}

/// An instance as shown to API clients, with its key masked.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstanceSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    /// Masked API key, `None` if the credential cannot be resolved.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Online,
    Offline,
}

/// Probe result for one instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStatus {
    #[serde(flatten)]
    pub instance: InstanceSummary,
    pub status: Availability,
    pub indexer_count: Option<u32>,
}

/// Searches a set of Jackett and Prowlarr instances concurrently.
///
/// Every collaborator is passed in; the aggregator keeps no state between
/// calls.
pub struct SearchAggregator {
    directory: Arc<dyn InstanceDirectory>,
    credentials: Arc<dyn CredentialResolver>,
    connector: Arc<dyn SourceConnector>,
    concurrency_limit: usize,
}

impl SearchAggregator {
    pub fn new(
        directory: Arc<dyn InstanceDirectory>,
        credentials: Arc<dyn CredentialResolver>,
        connector: Arc<dyn SourceConnector>,
        concurrency_limit: usize,
    ) -> Self {
        Self {
            directory,
            credentials,
            connector,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Run one aggregated search.
    ///
    /// Only an invalid request or a failing instance directory fails the
    /// call. Upstream failures become entries in `errors`.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let request = request.clone().validate()?;
        let started = Instant::now();

        let instances = self.select_instances(&request)?;
        if instances.is_empty() {
            metrics::SEARCHES_TOTAL
                .with_label_values(&["no_sources"])
                .inc();
            return Ok(SearchOutcome {
                results: Vec::new(),
                errors: vec![NO_INSTANCES_CONFIGURED.to_string()],
                sources_queried: 0,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        debug!(
            query = %request.query,
            category = %request.category,
            instances = instances.len(),
            limit = self.concurrency_limit,
            "Starting aggregated search"
        );

        let limiter = ConcurrencyLimiter::new(self.concurrency_limit);
        let query = request.query.as_str();
        let category = request.category;
        let units = instances.iter().map(|instance| {
            let limiter = &limiter;
            async move {
                match limiter
                    .run(self.search_instance(instance, query, category))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => UnitOutcome::Failed(format!("Error searching {}: {}", instance.name, e)),
                }
            }
        });
        let outcomes = join_all(units).await;

        let mut merged = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Found(mut results) => merged.append(&mut results),
                UnitOutcome::Failed(message) => errors.push(message),
            }
        }

        let mut results = apply_filters(merged, &request.filters);
        sort_results(&mut results, request.sort_by, request.sort_order);

        let elapsed = started.elapsed();
        let label = if errors.is_empty() { "complete" } else { "partial" };
        metrics::SEARCHES_TOTAL.with_label_values(&[label]).inc();
        metrics::SEARCH_DURATION
            .with_label_values(&[])
            .observe(elapsed.as_secs_f64());
        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(results.len() as f64);

        debug!(
            results = results.len(),
            errors = errors.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Aggregated search complete"
        );

        Ok(SearchOutcome {
            results,
            errors,
            sources_queried: instances.len(),
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Resolve the selection into a snapshot of instances to query.
    fn select_instances(&self, request: &SearchRequest) -> Result<Vec<Instance>, SearchError> {
        let mut instances = Vec::new();
        for kind in KINDS {
            match request.selection.scope(kind) {
                SelectionScope::All => instances.extend(self.directory.instances(kind, None)?),
                SelectionScope::Only(ids) => {
                    instances.extend(self.directory.instances(kind, Some(ids))?)
                }
                SelectionScope::Nothing => {}
            }
        }
        Ok(instances)
    }

    async fn search_instance(
        &self,
        instance: &Instance,
        query: &str,
        category: SearchCategory,
    ) -> UnitOutcome {
        match self.query_source(instance, query, category).await {
            Ok(results) => UnitOutcome::Found(results),
            Err(e) => {
                warn!(
                    instance = %instance.name,
                    kind = %instance.kind,
                    error = %e,
                    "Instance search failed"
                );
                UnitOutcome::Failed(format!("Error searching {}: {}", instance.name, e))
            }
        }
    }

    async fn query_source(
        &self,
        instance: &Instance,
        query: &str,
        category: SearchCategory,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let secret = self.credentials.resolve(&instance.credential)?;
        let source = self.connector.connect(instance, &secret)?;
        source.search(query, category, &instance.name).await
    }

    /// Probe one instance. `Ok(None)` if no such instance exists.
    pub async fn test_instance(
        &self,
        kind: SourceKind,
        id: i64,
    ) -> Result<Option<ConnectionTest>, SearchError> {
        let Some(instance) = self.directory.get(kind, id)? else {
            return Ok(None);
        };
        Ok(Some(self.probe(&instance).await))
    }

    /// Every configured instance, keys masked.
    pub fn list_instances(&self) -> Result<Vec<InstanceSummary>, SearchError> {
        let mut summaries = Vec::new();
        for kind in KINDS {
            for instance in self.directory.instances(kind, None)? {
                summaries.push(self.summarize(&instance));
            }
        }
        Ok(summaries)
    }

    /// Probe every configured instance, bounded by the same concurrency limit
    /// as searches.
    pub async fn instance_statuses(&self) -> Result<Vec<InstanceStatus>, SearchError> {
        let mut instances = Vec::new();
        for kind in KINDS {
            instances.extend(self.directory.instances(kind, None)?);
        }

        let limiter = ConcurrencyLimiter::new(self.concurrency_limit);
        let probes = instances.iter().map(|instance| {
            let limiter = &limiter;
            async move {
                let test = limiter
                    .run(self.probe(instance))
                    .await
                    .unwrap_or_else(|e| ConnectionTest::failed(e.to_string()));
                InstanceStatus {
                    instance: self.summarize(instance),
                    status: if test.success {
                        Availability::Online
                    } else {
                        Availability::Offline
                    },
                    indexer_count: test.indexer_count,
                }
            }
        });
        Ok(join_all(probes).await)
    }

    async fn probe(&self, instance: &Instance) -> ConnectionTest {
        let source = self
            .credentials
            .resolve(&instance.credential)
            .map_err(SearchError::from)
            .and_then(|secret| self.connector.connect(instance, &secret));

        match source {
            Ok(source) => source.test_connection().await,
            Err(e) => {
                warn!(instance = %instance.name, error = %e, "Error checking instance status");
                ConnectionTest::failed(e.to_string())
            }
        }
    }

    fn summarize(&self, instance: &Instance) -> InstanceSummary {
        InstanceSummary {
            id: instance.id,
            name: instance.name.clone(),
            url: instance.url.clone(),
            kind: instance.kind,
            api_key: self
                .credentials
                .resolve(&instance.credential)
                .ok()
                .map(|secret| mask_secret(&secret)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{ConfigCredentialResolver, ConfigInstanceDirectory};
    use crate::searcher::{InstanceSelection, SearchFilters, SortBy, SortOrder};
    use crate::testing::fixtures::{instance, result_with};
    use crate::testing::MockSourceConnector;
    use std::time::Duration;

    fn aggregator(
        instances: Vec<Instance>,
        connector: Arc<MockSourceConnector>,
        limit: usize,
    ) -> SearchAggregator {
        SearchAggregator::new(
            Arc::new(ConfigInstanceDirectory::new(instances)),
            Arc::new(ConfigCredentialResolver),
            connector,
            limit,
        )
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let connector = Arc::new(MockSourceConnector::new());
        connector.set_results("Good", vec![result_with("a", 1, 1), result_with("b", 2, 2)]);
        connector.set_error("Bad", SearchError::ConnectionFailed("refused".to_string()));

        let aggregator = aggregator(
            vec![
                instance(1, "Good", SourceKind::Jackett),
                instance(2, "Bad", SourceKind::Prowlarr),
            ],
            connector,
            5,
        );

        let outcome = aggregator.search(&SearchRequest::new("x")).await.unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.sources_queried, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Error searching Bad:"));
        assert!(outcome.errors[0].contains("refused"));
    }

    #[tokio::test]
    async fn test_no_instances_configured() {
        let connector = Arc::new(MockSourceConnector::new());
        let aggregator = aggregator(Vec::new(), connector.clone(), 5);

        let outcome = aggregator.search(&SearchRequest::new("x")).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.sources_queried, 0);
        assert_eq!(outcome.errors, vec![NO_INSTANCES_CONFIGURED.to_string()]);
        assert_eq!(connector.search_count(), 0);
    }

    #[tokio::test]
    async fn test_exclusive_with_nothing_selected() {
        let connector = Arc::new(MockSourceConnector::new());
        let aggregator = aggregator(
            vec![
                instance(1, "J", SourceKind::Jackett),
                instance(1, "P", SourceKind::Prowlarr),
            ],
            connector.clone(),
            5,
        );

        let mut request = SearchRequest::new("x");
        request.selection.exclusive = true;
        let outcome = aggregator.search(&request).await.unwrap();

        assert_eq!(outcome.sources_queried, 0);
        assert_eq!(outcome.errors, vec![NO_INSTANCES_CONFIGURED.to_string()]);
        assert_eq!(connector.search_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_does_not_suppress_other_kind() {
        let connector = Arc::new(MockSourceConnector::new());
        let aggregator = aggregator(
            vec![
                instance(1, "J", SourceKind::Jackett),
                instance(1, "P1", SourceKind::Prowlarr),
                instance(2, "P2", SourceKind::Prowlarr),
            ],
            connector,
            5,
        );

        let mut request = SearchRequest::new("x");
        request.selection = InstanceSelection {
            jackett_ids: Some(vec![99]),
            prowlarr_ids: None,
            exclusive: false,
        };
        let outcome = aggregator.search(&request).await.unwrap();
        assert_eq!(outcome.sources_queried, 2);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_filters_and_sort_applied_after_merge() {
        let connector = Arc::new(MockSourceConnector::new());
        connector.set_results("J", vec![result_with("low", 1, 10), result_with("high", 50, 10)]);
        connector.set_results("P", vec![result_with("mid", 20, 10), result_with("huge", 99, u64::MAX)]);

        let aggregator = aggregator(
            vec![
                instance(1, "J", SourceKind::Jackett),
                instance(2, "P", SourceKind::Prowlarr),
            ],
            connector,
            5,
        );

        let mut request = SearchRequest::new("x");
        request.filters = SearchFilters {
            min_seeders: 10,
            max_size: Some("1GB".to_string()),
        };
        request.sort_by = SortBy::Seeders;
        request.sort_order = SortOrder::Asc;

        let outcome = aggregator.search(&request).await.unwrap();
        let titles: Vec<_> = outcome.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["mid", "high"]);
        assert_eq!(outcome.sources_queried, 2);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let connector = Arc::new(MockSourceConnector::new());
        let delay = Duration::from_millis(50);
        let instances: Vec<_> = (1..=5)
            .map(|id| {
                let name = format!("J{}", id);
                connector.set_delay(&name, delay);
                instance(id, &name, SourceKind::Jackett)
            })
            .collect();
        let aggregator = aggregator(instances, connector.clone(), 2);

        let started = Instant::now();
        let outcome = aggregator.search(&SearchRequest::new("x")).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.sources_queried, 5);
        assert_eq!(connector.peak_in_flight(), 2);
        // ceil(5 / 2) rounds of the fixed delay
        assert!(elapsed >= delay * 3, "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_missing_credential_is_per_instance_error() {
        let connector = Arc::new(MockSourceConnector::new());
        connector.set_results("J", vec![result_with("ok", 1, 1)]);
        let mut broken = instance(2, "NoKey", SourceKind::Jackett);
        broken.credential = "env:SEARCHARR_AGGREGATOR_TEST_UNSET".to_string();

        let aggregator = aggregator(
            vec![instance(1, "J", SourceKind::Jackett), broken],
            connector,
            5,
        );

        let outcome = aggregator.search(&SearchRequest::new("x")).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("SEARCHARR_AGGREGATOR_TEST_UNSET"));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_scheduling() {
        let connector = Arc::new(MockSourceConnector::new());
        let aggregator = aggregator(
            vec![instance(1, "J", SourceKind::Jackett)],
            connector.clone(),
            5,
        );

        let err = aggregator.search(&SearchRequest::new("  ")).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidRequest(_)));
        assert_eq!(connector.search_count(), 0);
    }

    #[tokio::test]
    async fn test_instance_statuses() {
        let connector = Arc::new(MockSourceConnector::new());
        connector.set_connection("P", ConnectionTest::failed("Invalid API key"));
        let aggregator = aggregator(
            vec![
                instance(1, "J", SourceKind::Jackett),
                instance(2, "P", SourceKind::Prowlarr),
            ],
            connector,
            5,
        );

        let statuses = aggregator.instance_statuses().await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].status, Availability::Online);
        assert_eq!(statuses[1].status, Availability::Offline);
    }

    #[tokio::test]
    async fn test_test_instance_unknown() {
        let connector = Arc::new(MockSourceConnector::new());
        let aggregator = aggregator(vec![instance(1, "J", SourceKind::Jackett)], connector, 5);

        assert!(aggregator
            .test_instance(SourceKind::Prowlarr, 1)
            .await
            .unwrap()
            .is_none());
        let test = aggregator
            .test_instance(SourceKind::Jackett, 1)
            .await
            .unwrap()
            .unwrap();
        assert!(test.success);
    }

    #[test]
    fn test_list_instances_masks_keys() {
        let connector = Arc::new(MockSourceConnector::new());
        let mut long_key = instance(1, "J", SourceKind::Jackett);
        long_key.credential = "abcdefghijklmnop".to_string();
        let aggregator = aggregator(vec![long_key], connector, 5);

        let summaries = aggregator.list_instances().unwrap();
        assert_eq!(summaries[0].api_key.as_deref(), Some("abcd...mnop"));
    }
}
