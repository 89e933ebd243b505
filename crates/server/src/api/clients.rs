//! Download client handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use searcharr_core::download_client::{ClientStatus, ClientSummary};
use searcharr_core::{DispatchError, DownloadReceipt, DownloadRequest};
use serde::Serialize;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClientsResponse {
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Serialize)]
pub struct ClientsStatusResponse {
    pub clients: Vec<ClientStatus>,
    pub total_online: usize,
}

#[derive(Debug, Serialize)]
pub struct ClientTestResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/v1/clients
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<ClientsResponse> {
    Json(ClientsResponse {
        clients: state.dispatcher().list_clients(),
    })
}

/// GET /api/v1/clients/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ClientsStatusResponse> {
    let clients = state.dispatcher().client_statuses().await;
    let total_online = clients.iter().filter(|c| c.online).count();
    Json(ClientsStatusResponse {
        clients,
        total_online,
    })
}

/// POST /api/v1/clients/{id}/test
///
/// A client that cannot be reached is reported with `success: false`; only
/// an unknown id is an error.
pub async fn test_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ClientTestResponse>, ApiError> {
    match state.dispatcher().test_client(id).await {
        Ok(message) => Ok(Json(ClientTestResponse {
            success: true,
            message,
        })),
        Err(e @ DispatchError::ClientNotFound(_)) => Err(e.into()),
        Err(e) => Ok(Json(ClientTestResponse {
            success: false,
            message: e.to_string(),
        })),
    }
}

/// POST /api/v1/download
///
/// Hand a search result to a download client.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DownloadRequest>,
) -> Result<Json<DownloadReceipt>, ApiError> {
    Ok(Json(state.dispatcher().send(&body).await?))
}
