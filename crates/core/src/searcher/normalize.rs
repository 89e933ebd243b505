//! Shared normalization helpers for both upstream protocols.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::instance::SourceKind;

use super::SearchResult;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with the largest unit that keeps the value under 1024.
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// Content fingerprint for a result: md5 over source, indexer, title and
/// size, truncated to 12 hex characters.
pub fn result_fingerprint(source: &str, indexer: &str, title: &str, size: u64) -> String {
    let digest = md5::compute(format!("{}:{}:{}:{}", source, indexer, title, size));
    let mut hex = format!("{:x}", digest);
    hex.truncate(12);
    hex
}

/// Parse a Torznab `pubDate`: RFC 1123 with zone, ISO 8601 with zone, then
/// a bare `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

/// Parse an ISO 8601 timestamp. A trailing `Z` is UTC, and a timestamp
/// without any zone is taken as UTC.
pub fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

/// Accumulates the fields of one upstream item before it becomes a
/// [`SearchResult`].
#[derive(Debug, Default)]
pub(crate) struct ResultBuilder {
    pub title: Option<String>,
    pub indexer: Option<String>,
    pub size: Option<u64>,
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    /// Total peers, used for leechers when no direct count is present.
    pub peers: Option<u32>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub magnet_link: Option<String>,
    pub torrent_url: Option<String>,
    pub info_url: Option<String>,
    pub guid: Option<String>,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the result, or `None` if the item has no title.
    pub fn build(self, source: &str, kind: SourceKind) -> Option<SearchResult> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let indexer = self
            .indexer
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let size = self.size.unwrap_or(0);
        let seeders = self.seeders.unwrap_or(0);
        let leechers = self
            .leechers
            .or_else(|| self.peers.map(|p| p.saturating_sub(seeders)))
            .unwrap_or(0);

        Some(SearchResult {
            id: result_fingerprint(source, &indexer, &title, size),
            source: source.to_string(),
            source_type: kind,
            size_formatted: format_size(size),
            title,
            indexer,
            size,
            seeders,
            leechers,
            date: self.date,
            category: self
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Other".to_string()),
            magnet_link: self.magnet_link.filter(|s| !s.is_empty()),
            torrent_url: self.torrent_url.filter(|s| !s.is_empty()),
            info_url: self.info_url.or(self.guid).filter(|s| !s.is_empty()),
        })
    }
}

/// Clamp a signed upstream count into the unsigned range.
pub(crate) fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
