//! Concurrent health probing of both backends.

use std::collections::BTreeMap;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::client::Transport;
use crate::endpoint::{Backend, Endpoints, ServiceEndpoint};
use crate::metrics;

/// Marker used when a backend answered with something that is not JSON.
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable";

/// Snapshot of one backend's health.
///
/// Either the status fields or `error` is populated. Replaced wholesale on
/// every probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, e.g. "healthy".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Reporting service name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Timestamp as reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// Error marker carrying `message`.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the backend reported a status and no error.
    pub fn is_healthy(&self) -> bool {
        self.status.is_some() && self.error.is_none()
    }

    /// Parse a response body.
    ///
    /// Anything but a JSON object carrying `status` or `error` is unavailable.
    pub fn from_body(body: &str) -> Self {
        let parsed = match serde_json::from_str::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value::<Self>(value).ok(),
            _ => None,
        };

        match parsed {
            Some(health) if health.status.is_some() || health.error.is_some() => health,
            _ => Self::unavailable(SERVICE_UNAVAILABLE),
        }
    }
}

/// Probe one endpoint. Never fails; failures become error markers.
#[instrument(skip_all, fields(backend = %backend))]
pub async fn probe_endpoint<T: Transport>(
    transport: &T,
    backend: Backend,
    endpoint: &ServiceEndpoint,
) -> HealthStatus {
    let url = endpoint.url(backend.health_path());
    let start = Instant::now();

    let health = match transport.get(&url).await {
        Ok(response) => {
            if !response.is_success() {
                debug!(status = response.status, "Non-success health response");
            }
            HealthStatus::from_body(&response.body)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Health probe failed");
            HealthStatus::unavailable(e.to_string())
        }
    };

    metrics::record_probe_latency(start, backend);
    if !health.is_healthy() {
        metrics::inc_probe_failures(backend);
    }

    health
}

/// Probe every endpoint concurrently and return once all have settled.
#[instrument(skip_all)]
pub async fn probe_health<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
) -> BTreeMap<Backend, HealthStatus> {
    let probes = endpoints.iter().map(|(backend, endpoint)| async move {
        (backend, probe_endpoint(transport, backend, endpoint).await)
    });

    join_all(probes).await.into_iter().collect()
}
