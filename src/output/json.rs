//! JSON output formatting

use chrono::Utc;
use serde::Serialize;

use crate::swapi::RequestCounters;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 time the output was produced
    pub timestamp: String,

    /// CLI version
    pub version: String,

    /// Cache and fetch counters of the request that produced `data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<RequestCounters>,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                counters: None,
            },
        }
    }

    pub fn with_counters(mut self, counters: Option<RequestCounters>) -> Self {
        self.meta.counters = counters;
        self
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Format data as pretty-printed JSON, reporting the request's counters
pub fn format_json_with_counters<T: Serialize + ?Sized>(
    data: &T,
    counters: Option<RequestCounters>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data).with_counters(counters))
}
