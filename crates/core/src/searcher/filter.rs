//! Filtering and sorting of merged search results.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::cmp::Ordering;

use super::{SearchFilters, SearchResult, SortBy, SortOrder};

static SIZE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([KMGT]?B?)$").ok());

/// Parse a size string such as "10GB", "500 mb" or "1.5T" into bytes,
/// using 1024-based multipliers. Returns `None` if it cannot be parsed.
pub fn parse_size(raw: &str) -> Option<u64> {
    let normalized = raw.trim().to_uppercase();
    let captures = SIZE_PATTERN.as_ref()?.captures(&normalized)?;

    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let exponent = match captures.get(2).map(|m| m.as_str()).unwrap_or("") {
        "" | "B" => 0,
        "K" | "KB" => 1,
        "M" | "MB" => 2,
        "G" | "GB" => 3,
        "T" | "TB" => 4,
        _ => return None,
    };

    Some((value * 1024f64.powi(exponent)) as u64)
}

/// Apply the seeder threshold and size ceiling.
///
/// A `max_size` that does not parse disables the size filter.
pub fn apply_filters(results: Vec<SearchResult>, filters: &SearchFilters) -> Vec<SearchResult> {
    let max_bytes = filters.max_size.as_deref().and_then(parse_size);
    if filters.min_seeders == 0 && max_bytes.is_none() {
        return results;
    }

    results
        .into_iter()
        .filter(|r| r.seeders >= filters.min_seeders)
        .filter(|r| max_bytes.map(|max| r.size <= max).unwrap_or(true))
        .collect()
}

/// Stable sort by the requested key. Missing dates count as the earliest
/// possible value; names compare case-insensitively.
pub fn sort_results(results: &mut [SearchResult], sort_by: SortBy, order: SortOrder) {
    let compare: fn(&SearchResult, &SearchResult) -> Ordering = match sort_by {
        SortBy::Seeders => |a, b| a.seeders.cmp(&b.seeders),
        SortBy::Size => |a, b| a.size.cmp(&b.size),
        // Option orders None before Some.
        SortBy::Date => |a, b| a.date.cmp(&b.date),
        SortBy::Name => |a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    };

    match order {
        SortOrder::Asc => results.sort_by(compare),
        SortOrder::Desc => results.sort_by(|a, b| compare(b, a)),
    }
}
