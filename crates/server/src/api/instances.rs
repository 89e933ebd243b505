//! Jackett and Prowlarr instance handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use searcharr_core::searcher::{Availability, ConnectionTest, InstanceStatus, InstanceSummary};
use searcharr_core::SourceKind;
use serde::Serialize;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InstancesResponse {
    pub instances: Vec<InstanceSummary>,
}

#[derive(Debug, Serialize)]
pub struct InstancesStatusResponse {
    pub jackett: Vec<InstanceStatus>,
    pub prowlarr: Vec<InstanceStatus>,
    pub total_online: usize,
}

/// GET /api/v1/instances
pub async fn list_instances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InstancesResponse>, ApiError> {
    let instances = state.aggregator().list_instances()?;
    Ok(Json(InstancesResponse { instances }))
}

/// GET /api/v1/instances/status
///
/// Probe every configured instance.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InstancesStatusResponse>, ApiError> {
    let statuses = state.aggregator().instance_statuses().await?;

    let total_online = statuses
        .iter()
        .filter(|s| s.status == Availability::Online)
        .count();
    let (jackett, prowlarr): (Vec<_>, Vec<_>) = statuses
        .into_iter()
        .partition(|s| s.instance.kind == SourceKind::Jackett);

    Ok(Json(InstancesStatusResponse {
        jackett,
        prowlarr,
        total_online,
    }))
}

/// POST /api/v1/instances/{kind}/{id}/test
pub async fn test_instance(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ConnectionTest>, ApiError> {
    let kind: SourceKind = kind.parse().map_err(ApiError::not_found)?;

    state
        .aggregator()
        .test_instance(kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("{} instance {} not found", kind.display_name(), id)))
}
