//! Local cache for API responses and mapped entities
//!
//! A [`CacheStore`] holds opaque bytes (in-process LRU or SQLite with file
//! blobs). [`CacheManager`] sits on top and counts lookups and hits for the
//! current request. Raw responses go through the [`graph`] codec.

pub mod graph;
pub mod manager;
pub mod memory;
pub mod storage;
pub mod store;

use std::time::Duration;

/// Cache TTL configuration per data type
///
/// `None` inherits the store default, which is "never expires" out of the box.
pub struct CacheTtl;

impl CacheTtl {
    // Entity mappings and raw responses inherit the store default
    pub const ENTITY: Option<Duration> = None;
    pub const RAW_RESPONSE: Option<Duration> = None;

    // Whole results of list/get operations
    pub const RESPONSE: Duration = Duration::from_secs(60); // 1 min
}

/// Fixed key of the cumulative fetch counter
pub const FETCH_COUNTER_KEY: &str = "http:request-counter";

// Re-export main types
pub use manager::CacheManager;
pub use memory::MemoryStore;
pub use storage::SqliteStore;
pub use store::CacheStore;
