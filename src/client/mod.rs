//! Upstream API client
//!
//! [`Transport`] is the raw HTTP seam. [`Fetcher`] wraps it with the
//! read-through raw-response cache and fetch counting; the pagination and
//! parallel helpers build collection reads on top of the fetcher.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{ApiError, Result};

pub mod fetcher;
pub mod flight;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod parallel;

pub use fetcher::Fetcher;
pub use flight::FlightGroup;
pub use http::HttpTransport;
#[cfg(test)]
pub use mock::MockTransport;
pub use pagination::fetch_all_pages;

/// A decoded upstream response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// URL the request was sent to (without extra query params)
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// JSON body, `Null` for an empty body
    pub body: Value,
}

impl RawResponse {
    /// Decode the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", self.url, e))
                .into()
        })
    }
}

/// Per-call request options.
///
/// Everything except `use_cache` is part of the raw-response cache key.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOptions {
    /// Extra query parameters
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Read and write the raw-response cache for this call
    #[serde(skip)]
    pub use_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            params: BTreeMap::new(),
            use_cache: true,
        }
    }
}

impl RequestOptions {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[allow(dead_code)]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Bypass the raw-response cache for this call
    #[allow(dead_code)]
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Raw HTTP transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Non-2xx statuses come back as [`ApiError`]s.
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
        body: Option<&Value>,
    ) -> Result<RawResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_serialization_skips_cache_flag() {
        let plain = RequestOptions::new();
        assert_eq!(serde_json::to_string(&plain).unwrap(), "{}");

        let uncached = RequestOptions::new().no_cache();
        assert_eq!(serde_json::to_string(&uncached).unwrap(), "{}");
        assert!(!uncached.use_cache);

        let with_params = RequestOptions::new().param("format", "wookiee");
        assert_eq!(
            serde_json::to_string(&with_params).unwrap(),
            r#"{"params":{"format":"wookiee"}}"#
        );
    }

    #[test]
    fn test_raw_response_json() {
        #[derive(Deserialize)]
        struct Named {
            name: String,
        }

        let raw = RawResponse {
            url: "https://swapi.dev/api/people/1/".to_string(),
            status: 200,
            body: json!({"name": "Luke Skywalker"}),
        };
        let named: Named = raw.json().unwrap();
        assert_eq!(named.name, "Luke Skywalker");

        let err = raw.json::<Vec<String>>().unwrap_err();
        assert!(err.to_string().contains("people/1"));
    }
}
