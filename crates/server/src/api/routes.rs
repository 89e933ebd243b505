use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{clients, handlers, instances, middleware::metrics_middleware, search};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Search
        .route("/search", post(search::search))
        .route("/search/categories", get(search::list_categories))
        // Jackett and Prowlarr instances
        .route("/instances", get(instances::list_instances))
        .route("/instances/status", get(instances::get_status))
        .route("/instances/{kind}/{id}/test", post(instances::test_instance))
        // Download clients
        .route("/clients", get(clients::list_clients))
        .route("/clients/status", get(clients::get_status))
        .route("/clients/{id}/test", post(clients::test_client))
        .route("/download", post(clients::download))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
