//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    aggregate_state, health, item_types, items, metrics, ready, refresh, refresh_backend_items,
    refresh_health, refresh_items, AppState,
};
use crate::client::Transport;

/// Create the API router.
pub fn create_router<T: Transport>(state: AppState<T>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready::<T>))
        // Aggregate reads
        .route("/api/v1/state", get(aggregate_state::<T>))
        .route("/api/v1/items", get(items::<T>))
        .route("/api/v1/items/types", get(item_types::<T>))
        // User-triggered loads
        .route("/api/v1/refresh", post(refresh::<T>))
        .route("/api/v1/refresh/health", post(refresh_health::<T>))
        .route("/api/v1/refresh/items", post(refresh_items::<T>))
        .route("/api/v1/refresh/items/:backend", post(refresh_backend_items::<T>))
        .route("/metrics", get(metrics::<T>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
