//! Listing and greeting fetches against a single backend.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::client::Transport;
use crate::endpoint::{Backend, ServiceEndpoint};
use crate::error::FetchError;
use crate::metrics;

/// One listed item, passed through exactly as the backend sent it.
///
/// Expected shape is `{id, name, type, ...}` but nothing is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataItem(Value);

impl DataItem {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Integer `id`, if present.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// `name`, if present and a string.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// `type`, if present and a string.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The raw value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the raw value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for DataItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Latest listing outcome for one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BackendItems {
    /// The backend returned a listing.
    Loaded {
        /// Items as received.
        items: Vec<DataItem>,
    },
    /// The fetch failed; contributes no items.
    Failed {
        /// Why the fetch failed.
        reason: String,
    },
}

impl BackendItems {
    /// Items to merge. Empty for a failed fetch.
    pub fn items(&self) -> &[DataItem] {
        match self {
            BackendItems::Loaded { items } => items,
            BackendItems::Failed { .. } => &[],
        }
    }

    /// Consume into the items to merge.
    pub fn into_items(self) -> Vec<DataItem> {
        match self {
            BackendItems::Loaded { items } => items,
            BackendItems::Failed { .. } => Vec::new(),
        }
    }

    /// Whether the fetch failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, BackendItems::Failed { .. })
    }
}

/// Reply of a backend's hello endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// Greeting text.
    pub message: String,
    /// Service version.
    #[serde(default)]
    pub version: Option<String>,
}

/// GET `url` and parse the body as JSON, whatever the status.
async fn get_json<T: Transport>(transport: &T, url: &str) -> Result<Value, FetchError> {
    let response = transport.get(url).await?;

    if !response.is_success() {
        debug!(url = %url, status = response.status, "Non-success response");
    }

    serde_json::from_str(&response.body).map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Extract the `data` array from a listing body.
///
/// `data: null` is an empty listing.
fn extract_items(url: &str, body: Value) -> Result<Vec<DataItem>, FetchError> {
    let Value::Object(mut body) = body else {
        return Err(FetchError::MissingData {
            url: url.to_string(),
        });
    };

    match body.remove("data") {
        Some(Value::Array(items)) => Ok(items.into_iter().map(DataItem::from).collect()),
        Some(Value::Null) => Ok(Vec::new()),
        _ => Err(FetchError::MissingData {
            url: url.to_string(),
        }),
    }
}

/// Fetch a backend's listing, reporting why it failed.
#[instrument(skip(transport, endpoint), fields(base_url = %endpoint.base_url()))]
pub async fn fetch_items<T: Transport>(
    transport: &T,
    endpoint: &ServiceEndpoint,
    path: &str,
) -> Result<Vec<DataItem>, FetchError> {
    let url = endpoint.url(path);
    let body = get_json(transport, &url).await?;
    let items = extract_items(&url, body)?;

    debug!(count = items.len(), "Fetched items");

    Ok(items)
}

/// Fetch a backend's listing; any failure yields no items.
pub async fn fetch_items_or_empty<T: Transport>(
    transport: &T,
    endpoint: &ServiceEndpoint,
    path: &str,
) -> Vec<DataItem> {
    degrade(endpoint, fetch_items(transport, endpoint, path).await).into_items()
}

/// Fetch the listing for `backend`, recording metrics.
pub(crate) async fn fetch_backend_listing<T: Transport>(
    transport: &T,
    backend: Backend,
    endpoint: &ServiceEndpoint,
) -> BackendItems {
    let start = Instant::now();
    let result = fetch_items(transport, endpoint, backend.items_path()).await;
    metrics::record_fetch_latency(start, backend);

    match &result {
        Ok(items) => metrics::add_items_fetched(backend, items.len()),
        Err(_) => metrics::inc_fetch_failures(backend),
    }

    degrade(endpoint, result)
}

/// Keep a failed fetch as an empty listing with its reason.
fn degrade(
    endpoint: &ServiceEndpoint,
    result: Result<Vec<DataItem>, FetchError>,
) -> BackendItems {
    match result {
        Ok(items) => BackendItems::Loaded { items },
        Err(e) => {
            warn!(
                endpoint = %endpoint.name(),
                error = %e,
                "Listing unavailable, treating as empty"
            );
            BackendItems::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Fetch a backend's greeting.
#[instrument(skip(transport, endpoint), fields(base_url = %endpoint.base_url()))]
pub async fn fetch_greeting<T: Transport>(
    transport: &T,
    endpoint: &ServiceEndpoint,
    path: &str,
) -> Result<Greeting, FetchError> {
    let url = endpoint.url(path);
    let body = get_json(transport, &url).await?;

    serde_json::from_value(body).map_err(|e| FetchError::Malformed {
        url,
        reason: e.to_string(),
    })
}
