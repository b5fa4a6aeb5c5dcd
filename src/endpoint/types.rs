//! Backend identities and resolved endpoints.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::resolver::resolve;

/// One of the two independently deployed backends.
///
/// Declaration order is the merge order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// Node.js flavored service.
    Node,
    /// Go flavored service.
    Go,
}

impl Backend {
    /// Local address used when no value is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::Node => "http://localhost:3001",
            Backend::Go => "http://localhost:3002",
        }
    }

    /// Listing path. Differs per backend.
    pub fn items_path(self) -> &'static str {
        match self {
            Backend::Node => "/api/node/data",
            Backend::Go => "/api/go/data",
        }
    }

    /// Greeting path.
    pub fn greeting_path(self) -> &'static str {
        match self {
            Backend::Node => "/api/node/hello",
            Backend::Go => "/api/go/hello",
        }
    }

    /// Health path, shared by both backends.
    pub fn health_path(self) -> &'static str {
        "/api/health"
    }
}

/// A backend's resolved base URL plus its logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEndpoint {
    name: String,
    base_url: String,
}

impl ServiceEndpoint {
    /// Create an endpoint from an already resolved base URL.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// Logical backend name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// The fixed pair of endpoints, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    node: ServiceEndpoint,
    go: ServiceEndpoint,
}

impl Endpoints {
    /// Build from explicit endpoints.
    pub fn new(node: ServiceEndpoint, go: ServiceEndpoint) -> Self {
        Self { node, go }
    }

    /// Resolve both endpoints from raw configuration values.
    pub fn resolve(node_raw: Option<&str>, go_raw: Option<&str>) -> Self {
        let build = |backend: Backend, raw: Option<&str>| {
            ServiceEndpoint::new(
                backend.to_string(),
                resolve(raw, backend.default_base_url()),
            )
        };

        Self {
            node: build(Backend::Node, node_raw),
            go: build(Backend::Go, go_raw),
        }
    }

    /// Local defaults for both backends.
    pub fn local() -> Self {
        Self::resolve(None, None)
    }

    /// Endpoint for a backend.
    pub fn get(&self, backend: Backend) -> &ServiceEndpoint {
        match backend {
            Backend::Node => &self.node,
            Backend::Go => &self.go,
        }
    }

    /// Endpoints in backend order.
    pub fn iter(&self) -> impl Iterator<Item = (Backend, &ServiceEndpoint)> + '_ {
        Backend::iter().map(move |backend| (backend, self.get(backend)))
    }
}
