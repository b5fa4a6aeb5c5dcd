//! Unified client for two independently deployed backends.
//!
//! Both backends expose a health endpoint and a data listing. This library
//! resolves where they live, probes and fetches them concurrently, and keeps
//! one merged view that survives either backend being unreachable.
//!
//! ```text
//! NODE_API_URL=my-node-svc      -> https://my-node-svc.onrender.com
//! GO_API_URL=go.example.org     -> https://go.example.org
//! (unset)                       -> http://localhost:3001 / :3002
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`endpoint`]: Backend identities and base URL resolution
//! - [`client`]: Transport seam, HTTP and mock transports
//! - [`probe`]: Concurrent health probing
//! - [`fetcher`]: Listing and greeting fetches
//! - [`store`]: Aggregate state and load operations
//! - [`api`]: HTTP API over the aggregate state
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod probe;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AggregatorError, Result};
pub use store::{AggregateState, AggregateStore};
