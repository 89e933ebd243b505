//! Read-only lookup of configured instances.

use crate::config::{Config, InstanceConfig};
use crate::searcher::SearchError;

use super::{Instance, SourceKind};

/// Source of instance records for the aggregator.
///
/// Implementations must not be mutated by the search path; every call
/// returns an independent snapshot.
pub trait InstanceDirectory: Send + Sync {
    /// Instances of `kind`. `None` selects all of them, `Some(ids)` only the
    /// matching ones (unknown ids are ignored).
    fn instances(&self, kind: SourceKind, ids: Option<&[i64]>)
        -> Result<Vec<Instance>, SearchError>;

    /// A single instance by id.
    fn get(&self, kind: SourceKind, id: i64) -> Result<Option<Instance>, SearchError> {
        Ok(self.instances(kind, Some(&[id]))?.into_iter().next())
    }
}

/// Directory backed by the `[[jackett]]` and `[[prowlarr]]` config tables.
#[derive(Debug, Clone, Default)]
pub struct ConfigInstanceDirectory {
    instances: Vec<Instance>,
}

impl ConfigInstanceDirectory {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn from_config(config: &Config) -> Self {
        let jackett = config
            .jackett
            .iter()
            .map(|c| to_instance(c, SourceKind::Jackett));
        let prowlarr = config
            .prowlarr
            .iter()
            .map(|c| to_instance(c, SourceKind::Prowlarr));
        Self::new(jackett.chain(prowlarr).collect())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn to_instance(config: &InstanceConfig, kind: SourceKind) -> Instance {
    Instance {
        id: config.id,
        name: config.name.clone(),
        url: config.url.trim_end_matches('/').to_string(),
        kind,
        credential: config.api_key.clone(),
    }
}

impl InstanceDirectory for ConfigInstanceDirectory {
    fn instances(
        &self,
        kind: SourceKind,
        ids: Option<&[i64]>,
    ) -> Result<Vec<Instance>, SearchError> {
        Ok(self
            .instances
            .iter()
            .filter(|i| i.kind == kind)
            .filter(|i| ids.map(|ids| ids.contains(&i.id)).unwrap_or(true))
            .cloned()
            .collect())
    }
}
