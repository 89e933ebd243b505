//! Mock indexer sources for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::instance::{Instance, SourceKind};
use crate::searcher::{
    ConnectionTest, IndexerSource, SearchCategory, SearchError, SearchResult, SourceConnector,
};

/// A search call recorded for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub instance: String,
    pub query: String,
    pub category: SearchCategory,
}

/// Scripted behavior, keyed by instance name.
#[derive(Debug, Default)]
struct Script {
    results: HashMap<String, Vec<SearchResult>>,
    errors: HashMap<String, SearchError>,
    delays: HashMap<String, Duration>,
    connections: HashMap<String, ConnectionTest>,
    searches: Vec<RecordedSearch>,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<Script>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Script> {
    shared.script.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock [`SourceConnector`] whose sources answer from a script.
///
/// Instances are matched by name, since ids may repeat across kinds.
/// Unscripted instances return no results and report a healthy connection.
///
/// # Example
///
/// ```rust,ignore
/// let connector = Arc::new(MockSourceConnector::new());
/// connector.set_results("Home Jackett", vec![fixtures::search_result("Ubuntu")]);
/// connector.set_error("Prowlarr", SearchError::Timeout);
/// ```
#[derive(Debug, Default)]
pub struct MockSourceConnector {
    shared: Arc<Shared>,
}

impl MockSourceConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned by the named instance. `source` and `source_type`
    /// are rewritten to match the instance.
    pub fn set_results(&self, instance: &str, results: Vec<SearchResult>) {
        lock(&self.shared).results.insert(instance.to_string(), results);
    }

    /// Make every search of the named instance fail.
    pub fn set_error(&self, instance: &str, error: SearchError) {
        lock(&self.shared).errors.insert(instance.to_string(), error);
    }

    /// Delay each search of the named instance.
    pub fn set_delay(&self, instance: &str, delay: Duration) {
        lock(&self.shared).delays.insert(instance.to_string(), delay);
    }

    /// Connection test result reported by the named instance.
    pub fn set_connection(&self, instance: &str, test: ConnectionTest) {
        lock(&self.shared).connections.insert(instance.to_string(), test);
    }

    /// Number of searches performed so far.
    pub fn search_count(&self) -> usize {
        lock(&self.shared).searches.len()
    }

    /// Every search performed so far, in start order.
    pub fn searches(&self) -> Vec<RecordedSearch> {
        lock(&self.shared).searches.clone()
    }

    /// Highest number of searches observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.shared.peak.load(Ordering::SeqCst)
    }
}

impl SourceConnector for MockSourceConnector {
    fn connect(
        &self,
        instance: &Instance,
        _secret: &str,
    ) -> Result<Arc<dyn IndexerSource>, SearchError> {
        Ok(Arc::new(MockIndexerSource {
            name: instance.name.clone(),
            kind: instance.kind,
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// A source handed out by [`MockSourceConnector`].
#[derive(Debug)]
pub struct MockIndexerSource {
    name: String,
    kind: SourceKind,
    shared: Arc<Shared>,
}

#[async_trait]
impl IndexerSource for MockIndexerSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        query: &str,
        category: SearchCategory,
        source_name: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak.fetch_max(now, Ordering::SeqCst);

        let delay = {
            let mut script = lock(&self.shared);
            script.searches.push(RecordedSearch {
                instance: self.name.clone(),
                query: query.to_string(),
                category,
            });
            script.delays.get(&self.name).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let script = lock(&self.shared);
            match script.errors.get(&self.name) {
                Some(error) => Err(error.clone()),
                None => Ok(script
                    .results
                    .get(&self.name)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|mut result| {
                        result.source = source_name.to_string();
                        result.source_type = self.kind;
                        result
                    })
                    .collect()),
            }
        };

        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    async fn test_connection(&self) -> ConnectionTest {
        lock(&self.shared)
            .connections
            .get(&self.name)
            .cloned()
            .unwrap_or_else(|| ConnectionTest::ok(Some(1)))
    }
}
