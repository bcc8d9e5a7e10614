//! Cache facade with request-scoped hit/lookup counters

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use super::store::CacheStore;
use crate::error::CacheError;

/// Snapshot of the facade's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub lookups: u64,
}

/// Uniform get/set/del over an injected [`CacheStore`].
///
/// Every `get` counts one lookup, and one hit when a value came back. Both
/// counters sit behind a single lock so a reader never sees a half-reset pair.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    counters: Mutex<CacheCounters>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            counters: Mutex::new(CacheCounters::default()),
        }
    }

    /// The underlying store, for callers that must not touch the counters
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    fn counters_mut(&self) -> MutexGuard<'_, CacheCounters> {
        // Counters are plain integers; a poisoned guard still holds valid data
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read raw bytes, counting the lookup
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.counters_mut().lookups += 1;
        let value = self.store.get(key).await?;
        if value.is_some() {
            self.counters_mut().hits += 1;
            log::debug!("Cache hit: {}", key);
        } else {
            log::debug!("Cache miss: {}", key);
        }
        Ok(value)
    }

    /// Read and decode a JSON value, counting the lookup
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Codec(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    pub async fn set_raw(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.store.set(key, value, ttl).await
    }

    /// Encode a value as JSON and store it
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Codec(e.to_string()))?;
        self.store.set(key, &bytes, ttl).await
    }

    #[allow(dead_code)]
    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.store.del(key).await
    }

    #[allow(dead_code)]
    pub fn hit_count(&self) -> u64 {
        self.counters_mut().hits
    }

    #[allow(dead_code)]
    pub fn lookup_count(&self) -> u64 {
        self.counters_mut().lookups
    }

    /// Both counters, read together
    #[allow(dead_code)]
    pub fn counters(&self) -> CacheCounters {
        *self.counters_mut()
    }

    #[allow(dead_code)]
    pub fn reset_counters(&self) {
        *self.counters_mut() = CacheCounters::default();
    }

    /// Read and zero both counters in one step
    pub fn take_counters(&self) -> CacheCounters {
        std::mem::take(&mut *self.counters_mut())
    }
}
