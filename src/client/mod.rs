//! Transport layer used by the probe and fetcher.
//!
//! This module handles:
//! - The `Transport` seam injected into the store
//! - The reqwest-backed HTTP transport
//! - A scripted mock transport for testing

pub mod http;
pub mod mock;

use std::future::Future;

use crate::error::FetchError;

pub use http::HttpTransport;
pub use mock::{MockReply, MockTransport};

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl RawResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound GET transport.
///
/// `Err` means the request never produced a response. Any HTTP status,
/// including 5xx, comes back as `Ok`.
pub trait Transport: Send + Sync + 'static {
    /// Issue a single GET to `url`.
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}
