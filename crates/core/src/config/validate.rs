use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Search concurrency limit and timeouts are positive
/// - Instance and client ids are unique per table, names and URLs non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.concurrent_limit == 0 {
        return Err(ConfigError::ValidationError(
            "search.concurrent_limit must be at least 1".to_string(),
        ));
    }

    if config.search.jackett_timeout_secs == 0 || config.search.prowlarr_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search timeouts must be at least 1 second".to_string(),
        ));
    }

    for (table, instances) in [("jackett", &config.jackett), ("prowlarr", &config.prowlarr)] {
        check_entries(
            table,
            instances.iter().map(|i| (i.id, i.name.as_str(), i.url.as_str())),
        )?;
    }

    check_entries(
        "download_clients",
        config
            .download_clients
            .iter()
            .map(|c| (c.id, c.name.as_str(), c.url.as_str())),
    )?;

    if let Some(client) = config.download_clients.iter().find(|c| c.timeout_secs == 0) {
        return Err(ConfigError::ValidationError(format!(
            "download_clients: timeout_secs for '{}' must be at least 1 second",
            client.name
        )));
    }

    Ok(())
}

fn check_entries<'a>(
    table: &str,
    entries: impl Iterator<Item = (i64, &'a str, &'a str)>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (id, name, url) in entries {
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "{}: duplicate id {}",
                table, id
            )));
        }
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{}: entry {} has an empty name",
                table, id
            )));
        }
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{}: entry '{}' has an empty url",
                table, name
            )));
        }
    }
    Ok(())
}
