//! Key-value store abstraction used by the cache facade
//!
//! Values are opaque byte strings. Keys are ASCII and carry their own
//! namespace (`person:1`, `GET_<url>_<options>`, ...).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// A key-value store with optional per-entry TTL.
///
/// A `ttl` of `None` inherits the store's default; a zero duration (or a zero
/// default) means the entry never expires.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write (or overwrite) a value
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove a value. Removing a missing key is not an error.
    #[allow(dead_code)]
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically add `delta` to the integer counter stored at `key` and
    /// return the new total. A missing or expired counter starts at zero.
    ///
    /// Counters are stored as their decimal text, so `get` on the same key
    /// yields JSON-decodable bytes.
    async fn increment(&self, key: &str, delta: u64) -> Result<u64, CacheError>;
}

/// Resolve the lifetime of an entry from a per-call TTL and the store default.
pub fn effective_ttl(ttl: Option<Duration>, default: Option<Duration>) -> Option<Duration> {
    ttl.or(default).filter(|d| !d.is_zero())
}

/// Parse a stored counter value.
pub fn parse_counter(bytes: &[u8]) -> Result<u64, CacheError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| CacheError::Codec("counter value is not an unsigned integer".to_string()))
}
