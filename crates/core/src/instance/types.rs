//! Types describing configured indexer instances.

use serde::{Deserialize, Serialize};

/// Upstream protocol spoken by an instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Torznab proxy (XML feed, API key in the query string).
    Jackett,
    /// Indexer manager (JSON REST API, API key header).
    Prowlarr,
}

impl SourceKind {
    /// Returns the string representation for API responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Jackett => "jackett",
            SourceKind::Prowlarr => "prowlarr",
        }
    }

    /// Human-facing product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Jackett => "Jackett",
            SourceKind::Prowlarr => "Prowlarr",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jackett" => Ok(SourceKind::Jackett),
            "prowlarr" => Ok(SourceKind::Prowlarr),
            other => Err(format!("unknown instance kind: {}", other)),
        }
    }
}

/// A snapshot of one configured instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: i64,
    /// Display name, used as the `source` of every result it produces.
    pub name: String,
    /// Base URL without trailing slash.
    pub url: String,
    pub kind: SourceKind,
    /// Opaque credential handle, resolved through a `CredentialResolver`.
    pub credential: String,
}
