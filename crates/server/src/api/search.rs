//! Search API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use searcharr_core::{SearchCategory, SearchRequest, SearchResult};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub category: SearchCategory,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
    pub sources_queried: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<SearchCategory>,
}

/// POST /api/v1/search
///
/// Search every selected Jackett and Prowlarr instance. Upstream failures
/// are reported in `errors`; only an invalid request fails the call.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = body.validate()?;
    let outcome = state.aggregator().search(&request).await?;

    info!(
        query = %request.query,
        results = outcome.results.len(),
        sources = outcome.sources_queried,
        errors = outcome.errors.len(),
        duration_ms = outcome.duration_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query: request.query,
        category: request.category,
        total_results: outcome.results.len(),
        results: outcome.results,
        sources_queried: outcome.sources_queried,
        errors: outcome.errors,
        duration_ms: outcome.duration_ms,
    }))
}

/// GET /api/v1/search/categories
pub async fn list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: SearchCategory::ALL.to_vec(),
    })
}
