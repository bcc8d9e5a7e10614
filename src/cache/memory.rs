//! In-process LRU store with per-entry expiry

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::store::{CacheStore, effective_ttl, parse_counter};
use crate::error::CacheError;

struct MemoryEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local store. Capacity-bounded; least recently used entries go first.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, MemoryEntry>>,
    default_ttl: Option<Duration>,
}

impl MemoryStore {
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, LruCache<String, MemoryEntry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned("memory store"))
    }

    fn read_live(
        entries: &mut LruCache<String, MemoryEntry>,
        key: &str,
        now: Instant,
    ) -> Option<Vec<u8>> {
        let found = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.data.clone()));
        match found {
            Some(Some(data)) => Some(data),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries()?;
        Ok(Self::read_live(&mut entries, key, Instant::now()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = effective_ttl(ttl, self.default_ttl).map(|ttl| Instant::now() + ttl);
        self.entries()?.put(
            key.to_string(),
            MemoryEntry {
                data: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries()?.pop(key);
        Ok(())
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, CacheError> {
        let mut entries = self.entries()?;
        let current = match Self::read_live(&mut entries, key, Instant::now()) {
            Some(bytes) => parse_counter(&bytes)?,
            None => 0,
        };
        let total = current + delta;
        entries.put(
            key.to_string(),
            MemoryEntry {
                data: total.to_string().into_bytes(),
                expires_at: None,
            },
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let store = MemoryStore::new(16, None);

        store.set("person:1", b"luke", None).await.unwrap();
        assert_eq!(store.get("person:1").await.unwrap(), Some(b"luke".to_vec()));

        store.del("person:1").await.unwrap();
        assert_eq!(store.get("person:1").await.unwrap(), None);

        // Deleting a missing key is fine
        store.del("person:1").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let store = MemoryStore::new(16, None);
        store
            .set("film:1", b"a new hope", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("film:1").await.unwrap(), None);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let store = MemoryStore::new(16, Some(Duration::from_millis(10)));
        store.set("film:2", b"empire", None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("film:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let store = MemoryStore::new(2, None);
        store.set("a", b"1", None).await.unwrap();
        store.set("b", b"2", None).await.unwrap();

        // Touch "a" so "b" becomes the eviction candidate
        store.get("a").await.unwrap();
        store.set("c", b"3", None).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_increment_starts_at_zero() {
        let store = MemoryStore::new(16, None);

        assert_eq!(store.increment("counter", 3).await.unwrap(), 3);
        assert_eq!(store.increment("counter", 4).await.unwrap(), 7);
        assert_eq!(store.get("counter").await.unwrap(), Some(b"7".to_vec()));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_counter() {
        let store = MemoryStore::new(16, None);
        store.set("counter", b"{\"not\":1}", None).await.unwrap();

        assert!(store.increment("counter", 1).await.is_err());
    }
}
