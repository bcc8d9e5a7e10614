//! Mock transport for testing
//!
//! Serves canned JSON bodies by URL and records every request so tests can
//! assert how many upstream fetches actually happened.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{RawResponse, RequestOptions, Transport};
use crate::error::{ApiError, Result};

/// Canned reply for one URL
#[derive(Debug, Clone)]
enum MockReply {
    Json(Value),
    Status(u16),
}

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    pub method: Method,
    pub url: String,
}

/// Mock transport for testing.
///
/// # Example
/// ```ignore
/// let mock = MockTransport::new()
///     .with_json("https://swapi.test/api/people/1/", json!({"name": "Luke"}));
/// let fetcher = Fetcher::new(Arc::new(mock.clone()), cache);
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Replies keyed by full URL (query included)
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Artificial latency per request
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.replies
            .try_lock()
            .expect("mock not shared yet")
            .insert(url.to_string(), MockReply::Json(body));
        self
    }

    /// Fail requests to `url` with the given status
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.replies
            .try_lock()
            .expect("mock not shared yet")
            .insert(url.to_string(), MockReply::Status(status));
        self
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all captured requests
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Number of requests sent to exactly this URL
    pub async fn call_count(&self, url: &str) -> usize {
        self.captured_requests
            .lock()
            .await
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Number of requests sent in total
    pub async fn total_calls(&self) -> usize {
        self.captured_requests.lock().await.len()
    }
}

fn full_url(url: &str, options: &RequestOptions) -> String {
    if options.params.is_empty() {
        return url.to_string();
    }
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().extend_pairs(options.params.iter());
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
        _body: Option<&Value>,
    ) -> Result<RawResponse> {
        let url = full_url(url, options);
        self.captured_requests.lock().await.push(CapturedRequest {
            method,
            url: url.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().await.get(&url).cloned();
        match reply {
            Some(MockReply::Json(body)) => Ok(RawResponse {
                url,
                status: 200,
                body,
            }),
            Some(MockReply::Status(404)) | None => Err(ApiError::NotFound(url).into()),
            Some(MockReply::Status(429)) => {
                Err(ApiError::RateLimit(Duration::from_secs(60)).into())
            }
            Some(MockReply::Status(status)) if status >= 500 => {
                Err(ApiError::ServerError(format!("{} returned {}", url, status)).into())
            }
            Some(MockReply::Status(status)) => {
                Err(ApiError::BadRequest(format!("{} returned {}", url, status)).into())
            }
        }
    }
}
