//! HTTP API handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::client::Transport;
use crate::endpoint::Backend;
use crate::fetcher::DataItem;
use crate::store::{AggregateState, AggregateStore, Phase, TypeCount};

/// Application state shared with handlers.
pub struct AppState<T> {
    /// The aggregate store.
    pub store: Arc<AggregateStore<T>>,
    /// Prometheus render handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T: Transport> AppState<T> {
    /// Create new app state.
    pub fn new(store: Arc<AggregateStore<T>>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether a health cycle has settled.
    pub ready: bool,
    /// Current store phase.
    pub phase: Phase,
}

/// Merged listing, in the same envelope the backends use.
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    /// Merged items.
    pub data: Vec<DataItem>,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// What went wrong.
    pub error: String,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once ready, 503 otherwise.
pub async fn ready<T: Transport>(State(state): State<AppState<T>>) -> impl IntoResponse {
    let phase = state.store.snapshot().phase;
    let ready = phase == Phase::Ready;
    let response = ReadyResponse { ready, phase };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Full aggregate state.
pub async fn aggregate_state<T: Transport>(
    State(state): State<AppState<T>>,
) -> Json<AggregateState> {
    Json(state.store.snapshot())
}

/// Merged items.
pub async fn items<T: Transport>(State(state): State<AppState<T>>) -> Json<ItemsResponse> {
    Json(ItemsResponse {
        data: state.store.snapshot().merged,
    })
}

/// Item counts per type.
pub async fn item_types<T: Transport>(State(state): State<AppState<T>>) -> Json<Vec<TypeCount>> {
    Json(state.store.snapshot().type_counts())
}

/// Reload health and listings, then return the new state.
pub async fn refresh<T: Transport>(State(state): State<AppState<T>>) -> Json<AggregateState> {
    state.store.refresh().await;
    Json(state.store.snapshot())
}

/// Reload health, then return the new state.
pub async fn refresh_health<T: Transport>(
    State(state): State<AppState<T>>,
) -> Json<AggregateState> {
    state.store.load_health().await;
    Json(state.store.snapshot())
}

/// Reload all listings, then return the new state.
pub async fn refresh_items<T: Transport>(
    State(state): State<AppState<T>>,
) -> Json<AggregateState> {
    state.store.load_all_items().await;
    Json(state.store.snapshot())
}

/// Reload one backend's listing. Unknown backends are 404.
pub async fn refresh_backend_items<T: Transport>(
    State(state): State<AppState<T>>,
    Path(backend): Path<String>,
) -> impl IntoResponse {
    let Ok(backend) = Backend::from_str(&backend) else {
        let body = ErrorResponse {
            error: format!("unknown backend: {}", backend),
        };
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    state.store.load_backend_items(backend).await;
    Json(state.store.snapshot()).into_response()
}

/// Prometheus text exposition. 404 when metrics are disabled.
pub async fn metrics<T: Transport>(State(state): State<AppState<T>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
