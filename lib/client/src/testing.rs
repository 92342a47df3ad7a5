//! In-memory fakes for exercising the client without a server.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates.

use crate::error::TransportError;
use crate::navigator::Navigator;
use crate::request::{ApiRequest, ApiResponse, Method};
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Route = (Method, String);

/// A transport that answers from per-route queues of scripted replies.
///
/// Every request is recorded. Each call yields to the runtime once before
/// answering, so concurrently driven requests interleave the way real
/// network calls do.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<Route, VecDeque<Result<ApiResponse, TransportError>>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next request to `method path`.
    #[must_use]
    pub fn reply(self, method: Method, path: &str, status: u16, body: JsonValue) -> Self {
        self.push(method, path, Ok(ApiResponse::new(status, body)));
        self
    }

    /// Queues a transport failure for the next request to `method path`.
    #[must_use]
    pub fn fail(self, method: Method, path: &str, error: TransportError) -> Self {
        self.push(method, path, Err(error));
        self
    }

    fn push(&self, method: Method, path: &str, reply: Result<ApiResponse, TransportError>) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Returns every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the requests sent to `method path`, in order.
    #[must_use]
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    /// Returns true if every scripted reply has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.replies.lock().unwrap().values().all(VecDeque::is_empty)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;

        let route = (request.method, request.path.clone());
        self.replies
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::RequestFailed {
                    reason: format!("no scripted reply for {} {}", route.0, route.1),
                })
            })
    }
}

/// A navigator that records every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Creates a navigator with no recorded redirects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded redirect targets, in order.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}
