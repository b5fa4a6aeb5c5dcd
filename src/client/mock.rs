//! Mock transport for unit testing.
//!
//! Replies are scripted per URL: queued one-shot replies are consumed first,
//! then the URL's fallback reply is repeated. An unscripted URL behaves like
//! a refused connection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{RawResponse, Transport};
use crate::error::FetchError;

/// Message returned for URLs with no scripted reply.
const UNSCRIPTED_MESSAGE: &str = "connection refused";

/// A scripted outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Produce an HTTP response.
    Respond {
        /// Status code.
        status: u16,
        /// Body text.
        body: String,
        /// Simulated latency.
        delay: Duration,
    },
    /// Fail at the network level.
    Fail {
        /// Transport error message.
        message: String,
        /// Simulated latency.
        delay: Duration,
    },
}

impl MockReply {
    /// Response with the given status and raw body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Respond {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// 200 response carrying `value` as JSON.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::status(200, value.to_string())
    }

    /// Network failure with `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail {
            message: message.into(),
            delay: Duration::ZERO,
        }
    }

    /// Delay this reply by `latency`.
    pub fn after(self, latency: Duration) -> Self {
        match self {
            MockReply::Respond { status, body, .. } => MockReply::Respond {
                status,
                body,
                delay: latency,
            },
            MockReply::Fail { message, .. } => MockReply::Fail {
                message,
                delay: latency,
            },
        }
    }

    fn delay(&self) -> Duration {
        match self {
            MockReply::Respond { delay, .. } | MockReply::Fail { delay, .. } => *delay,
        }
    }
}

/// Scripted in-memory transport.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// One-shot replies by URL.
    queued: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    /// Repeating replies by URL.
    fallback: Arc<Mutex<HashMap<String, MockReply>>>,
    /// URLs requested so far, in order.
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    /// Create a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to every request for `url` with `reply`.
    pub fn on(&self, url: impl Into<String>, reply: MockReply) -> &Self {
        self.fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), reply);
        self
    }

    /// Reply to the next unanswered request for `url` with `reply`.
    pub fn once(&self, url: impl Into<String>, reply: MockReply) -> &Self {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.into())
            .or_default()
            .push_back(reply);
        self
    }

    /// Number of requests issued for `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    /// All requested URLs, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear all scripted replies and the request log.
    pub fn clear(&self) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn next_reply(&self, url: &str) -> MockReply {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        queued
            .or_else(|| {
                self.fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(url)
                    .cloned()
            })
            .unwrap_or_else(|| MockReply::fail(UNSCRIPTED_MESSAGE))
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let reply = self.next_reply(url);

        let delay = reply.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Respond { status, body, .. } => Ok(RawResponse { status, body }),
            MockReply::Fail { message, .. } => Err(FetchError::Transport(message)),
        }
    }
}
