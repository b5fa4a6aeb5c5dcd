//! Backend addressing.
//!
//! This module handles:
//! - The fixed set of backends and their paths
//! - Resolving raw configuration values into base URLs
//! - The resolved endpoint pair handed to the store

pub mod resolver;
pub mod types;

pub use resolver::resolve;
pub use types::{Backend, Endpoints, ServiceEndpoint};
