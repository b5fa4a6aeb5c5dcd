//! Aggregate store: the single owner of per-backend health and listings.
//!
//! Every mutation goes through a store operation and is published to
//! subscribers over a `watch` channel. Overlapping operations are not
//! serialized or cancelled: whichever completes last wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use strum::{Display, IntoEnumIterator};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::client::{HttpTransport, Transport};
use crate::config::Config;
use crate::endpoint::{Backend, Endpoints};
use crate::error::{AggregatorError, Result};
use crate::fetcher::{fetch_backend_listing, DataItem};

pub use crate::fetcher::BackendItems;
use crate::metrics;
use crate::probe::{probe_health, HealthStatus};

/// Store lifecycle. There is no error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A health cycle is in flight.
    Loading,
    /// At least one health cycle has settled.
    Ready,
}

/// Item count for one `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    /// Item type, `unknown` when absent.
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of merged items of this type.
    pub count: usize,
}

/// Everything the presentation layer reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateState {
    /// Latest health per backend; `None` until first probed.
    pub health: BTreeMap<Backend, Option<HealthStatus>>,
    /// Latest listing per backend; `None` until first fetched.
    pub items: BTreeMap<Backend, Option<BackendItems>>,
    /// Concatenation of all listings in backend order.
    pub merged: Vec<DataItem>,
    /// Whether a health cycle is in flight.
    pub loading: bool,
    /// Store lifecycle.
    pub phase: Phase,
    /// When the state last changed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Default for AggregateState {
    fn default() -> Self {
        Self {
            health: Backend::iter().map(|backend| (backend, None)).collect(),
            items: Backend::iter().map(|backend| (backend, None)).collect(),
            merged: Vec::new(),
            loading: false,
            phase: Phase::Idle,
            updated_at: None,
        }
    }
}

impl AggregateState {
    /// Health for `backend`, if probed.
    pub fn health_of(&self, backend: Backend) -> Option<&HealthStatus> {
        self.health.get(&backend).and_then(Option::as_ref)
    }

    /// Items for `backend`, if fetched. A failed fetch reads as empty.
    pub fn items_of(&self, backend: Backend) -> Option<&[DataItem]> {
        self.items
            .get(&backend)
            .and_then(Option::as_ref)
            .map(BackendItems::items)
    }

    /// Item counts per `type` in first-seen order over the merged list.
    pub fn type_counts(&self) -> Vec<TypeCount> {
        let mut counts: Vec<TypeCount> = Vec::new();

        for item in &self.merged {
            let kind = item.kind().unwrap_or("unknown");
            match counts.iter_mut().find(|c| c.kind == kind) {
                Some(existing) => existing.count += 1,
                None => counts.push(TypeCount {
                    kind: kind.to_string(),
                    count: 1,
                }),
            }
        }

        counts
    }

    /// Rebuild `merged` from the per-backend listings.
    fn recompute_merged(&mut self) {
        self.merged = self
            .items
            .values()
            .flatten()
            .flat_map(|listing| listing.items().iter().cloned())
            .collect();
    }

    fn touch(&mut self) {
        self.updated_at = Some(OffsetDateTime::now_utc());
    }
}

/// Process-wide state container driving the probe and fetcher.
#[derive(Debug)]
pub struct AggregateStore<T> {
    transport: Arc<T>,
    endpoints: Endpoints,
    state: watch::Sender<AggregateState>,
}

impl AggregateStore<HttpTransport> {
    /// Validate `config` and build a store over the HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().map_err(AggregatorError::InvalidConfig)?;
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), config.endpoints()))
    }
}

impl<T: Transport> AggregateStore<T> {
    /// Create a store over an injected transport and resolved endpoints.
    pub fn new(transport: Arc<T>, endpoints: Endpoints) -> Self {
        let (state, _) = watch::channel(AggregateState::default());
        Self {
            transport,
            endpoints,
            state,
        }
    }

    /// Resolved endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Injected transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receive every published state.
    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.state.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AggregateState {
        self.state.borrow().clone()
    }

    /// Probe both backends and replace their health entries.
    #[instrument(skip(self))]
    pub async fn load_health(&self) {
        metrics::inc_refresh_cycles("health");
        self.state.send_modify(|state| {
            state.loading = true;
            state.phase = Phase::Loading;
        });

        let results = probe_health(self.transport.as_ref(), &self.endpoints).await;
        let healthy = results.values().filter(|h| h.is_healthy()).count();

        self.state.send_modify(|state| {
            for (backend, health) in results {
                state.health.insert(backend, Some(health));
            }
            state.loading = false;
            state.phase = Phase::Ready;
            state.touch();
        });

        info!(healthy, total = Backend::iter().count(), "Health cycle settled");
    }

    /// Fetch one backend's listing and recompute the merge.
    #[instrument(skip_all, fields(backend = %backend))]
    pub async fn load_backend_items(&self, backend: Backend) {
        let endpoint = self.endpoints.get(backend);
        let listing = fetch_backend_listing(self.transport.as_ref(), backend, endpoint).await;
        if !listing.is_failed() {
            debug!(count = listing.items().len(), "Listing loaded");
        }

        self.state.send_modify(|state| {
            state.items.insert(backend, Some(listing));
            state.recompute_merged();
            state.touch();
        });
    }

    /// Fetch every backend's listing concurrently.
    #[instrument(skip(self))]
    pub async fn load_all_items(&self) {
        metrics::inc_refresh_cycles("items");
        join_all(Backend::iter().map(|backend| self.load_backend_items(backend))).await;

        debug!(merged = self.state.borrow().merged.len(), "Item cycle settled");
    }

    /// Health and listings together.
    pub async fn refresh(&self) {
        tokio::join!(self.load_health(), self.load_all_items());
    }
}
