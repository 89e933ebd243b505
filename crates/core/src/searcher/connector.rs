//! Builds the protocol client for a configured instance.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::instance::{Instance, SourceKind};

use super::jackett::JackettClient;
use super::prowlarr::ProwlarrClient;
use super::{IndexerSource, SearchError};

/// Turns an instance and its resolved secret into an [`IndexerSource`].
pub trait SourceConnector: Send + Sync {
    fn connect(&self, instance: &Instance, secret: &str)
        -> Result<Arc<dyn IndexerSource>, SearchError>;
}

/// Connector producing real HTTP clients, dispatching on [`SourceKind`].
#[derive(Debug, Clone)]
pub struct HttpSourceConnector {
    jackett_timeout: Duration,
    prowlarr_timeout: Duration,
}

impl HttpSourceConnector {
    pub fn new(jackett_timeout: Duration, prowlarr_timeout: Duration) -> Self {
        Self {
            jackett_timeout,
            prowlarr_timeout,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            Duration::from_secs(config.jackett_timeout_secs as u64),
            Duration::from_secs(config.prowlarr_timeout_secs as u64),
        )
    }
}

impl Default for HttpSourceConnector {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SourceConnector for HttpSourceConnector {
    fn connect(
        &self,
        instance: &Instance,
        secret: &str,
    ) -> Result<Arc<dyn IndexerSource>, SearchError> {
        Ok(match instance.kind {
            SourceKind::Jackett => Arc::new(JackettClient::new(
                &instance.url,
                secret,
                self.jackett_timeout,
            )?),
            SourceKind::Prowlarr => Arc::new(ProwlarrClient::new(
                &instance.url,
                secret,
                self.prowlarr_timeout,
            )?),
        })
    }
}
