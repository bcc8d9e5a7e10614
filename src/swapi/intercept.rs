//! Call interceptors composed around the public service operations
//!
//! Each takes a [`CallContext`] plus the operation itself as a plain
//! function, so the wrapping is visible at the call site.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::CacheStore;
use crate::error::Result;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// What is being called, with which arguments
#[derive(Debug, Clone)]
pub struct CallContext {
    pub operation: &'static str,
    /// Arguments as compact JSON
    pub args: String,
    /// Process-unique id tying the entry and exit log lines together
    pub request_id: u64,
}

impl CallContext {
    pub fn new(operation: &'static str, args: Value) -> Self {
        Self {
            operation,
            args: args.to_string(),
            request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Key of the whole-result cache entry for this call
    pub fn response_key(&self) -> String {
        format!("response:{}:{}", self.operation, self.args)
    }
}

/// Log entry, exit and duration of a call. The result passes through untouched.
pub async fn logged<T, F, Fut>(ctx: &CallContext, call: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug!(
        "[req {}] Method called - {} args={}",
        ctx.request_id, ctx.operation, ctx.args
    );
    let started = Instant::now();

    let result = call().await;

    let elapsed = started.elapsed().as_secs_f64() * 1000.0;
    match &result {
        Ok(_) => debug!(
            "[req {}] Method finished - {} in {:.2}ms",
            ctx.request_id, ctx.operation, elapsed
        ),
        Err(e) => warn!(
            "[req {}] Method failed - {} after {:.2}ms: {}",
            ctx.request_id, ctx.operation, elapsed, e
        ),
    }
    result
}

/// Serve a whole result from the store, or run the call and store its result
/// for `ttl`. `None` disables the cache.
///
/// Reads and writes go to the store directly, so the facade's request
/// counters only see the call's own lookups. Store trouble here degrades to
/// running the call.
pub async fn response_cached<T, F, Fut>(
    store: &dyn CacheStore,
    ttl: Option<Duration>,
    ctx: &CallContext,
    call: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(ttl) = ttl.filter(|t| !t.is_zero()) else {
        return call().await;
    };
    let key = ctx.response_key();

    match store.get(&key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!("Response cache hit: {}", key);
                return Ok(value);
            }
            Err(e) => warn!("Discarding unreadable response cache entry {}: {}", key, e),
        },
        Ok(None) => debug!("Response cache miss: {}", key),
        Err(e) => warn!("Response cache unavailable for {}: {}", key, e),
    }

    let value = call().await?;

    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            if let Err(e) = store.set(&key, &bytes, Some(ttl)).await {
                warn!("Failed to store response cache entry {}: {}", key, e);
            }
        }
        Err(e) => warn!("Failed to encode response for {}: {}", key, e),
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::error::{ApiError, Error};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_context_ids_are_unique() {
        let a = CallContext::new("list_people", json!({"search": "luke"}));
        let b = CallContext::new("list_people", json!({"search": "luke"}));

        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.response_key(), b.response_key());
        assert_eq!(a.response_key(), r#"response:list_people:{"search":"luke"}"#);
    }

    #[tokio::test]
    async fn test_logged_passes_result_through() {
        let ctx = CallContext::new("get_film_by_id", json!({"id": "1"}));

        let ok = logged(&ctx, || async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32> = logged(&ctx, || async {
            Err(ApiError::NotFound("films/99".to_string()).into())
        })
        .await;
        assert!(matches!(err, Err(Error::Api(ApiError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_response_cache_serves_second_call() {
        let store = MemoryStore::new(16, None);
        let ctx = CallContext::new("list_films", json!({"search": null}));
        let calls = AtomicUsize::new(0);
        let call = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["A New Hope".to_string()])
        };

        let ttl = Some(Duration::from_secs(60));
        let first = response_cached(&store, ttl, &ctx, call).await.unwrap();
        let second = response_cached(&store, ttl, &ctx, call).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_cache_disabled() {
        let store = MemoryStore::new(16, None);
        let ctx = CallContext::new("list_films", json!({}));
        let calls = AtomicUsize::new(0);
        let call = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(1u32)
        };

        response_cached(&store, None, &ctx, call).await.unwrap();
        response_cached(&store, Some(Duration::ZERO), &ctx, call).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.get(&ctx.response_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_call_is_not_cached() {
        let store = MemoryStore::new(16, None);
        let ctx = CallContext::new("get_person_by_id", json!({"id": "1"}));

        let result: Result<u32> =
            response_cached(&store, Some(Duration::from_secs(60)), &ctx, || async {
                Err(ApiError::ServerError("down".to_string()).into())
            })
            .await;

        assert!(result.is_err());
        assert!(store.get(&ctx.response_key()).await.unwrap().is_none());
    }
}
