//! Read-through fetcher with raw-response caching and fetch counting

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{FlightGroup, RawResponse, RequestOptions, Transport};
use crate::cache::store::parse_counter;
use crate::cache::{CacheManager, CacheTtl, FETCH_COUNTER_KEY, graph};
use crate::error::{CacheError, Error, Result};

/// Deduplicating fetcher.
///
/// GETs read through the cache facade under `<METHOD>_<url>_<options>`;
/// concurrent misses on the same key share one upstream request. Writes are
/// never cached. Every real upstream request bumps the fetch counter, which
/// [`Fetcher::reset_fetch_counter`] folds into the cumulative counter kept
/// in the store.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<CacheManager>,
    fetch_count: AtomicU64,
    flights: FlightGroup<RawResponse>,
    cache_enabled: bool,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<CacheManager>) -> Self {
        Self {
            transport,
            cache,
            fetch_count: AtomicU64::new(0),
            flights: FlightGroup::new(),
            cache_enabled: true,
        }
    }

    /// Disable raw-response caching for every call (`--no-cache`)
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Cache key for a request: method, URL and the serialized options
    /// (without the cache flag).
    pub fn cache_key(method: &Method, url: &str, options: &RequestOptions) -> Result<String> {
        let options = serde_json::to_string(options)?;
        Ok(format!("{}_{}_{}", method, url, options))
    }

    /// GET through the raw-response cache
    pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<RawResponse> {
        if !(self.cache_enabled && options.use_cache) {
            return self.fetch(Method::GET, url, options, None).await;
        }

        let key = Self::cache_key(&Method::GET, url, options)?;
        if let Some(bytes) = self.cache.get_raw(&key).await? {
            return Ok(decode_response(&bytes)?);
        }

        self.flights
            .run(&key, || async {
                let response = self.fetch(Method::GET, url, options, None).await?;
                let bytes = encode_response(&response)?;
                self.cache
                    .set_raw(&key, &bytes, CacheTtl::RAW_RESPONSE)
                    .await?;
                Ok::<_, Error>(response)
            })
            .await
    }

    /// GET with default options and decode the body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get(url, &RequestOptions::default()).await?.json()
    }

    #[allow(dead_code)]
    pub async fn post(&self, url: &str, body: &Value) -> Result<RawResponse> {
        self.fetch(Method::POST, url, &RequestOptions::new(), Some(body))
            .await
    }

    #[allow(dead_code)]
    pub async fn patch(&self, url: &str, body: &Value) -> Result<RawResponse> {
        self.fetch(Method::PATCH, url, &RequestOptions::new(), Some(body))
            .await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, url: &str) -> Result<RawResponse> {
        self.fetch(Method::DELETE, url, &RequestOptions::new(), None)
            .await
    }

    /// One real upstream request
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let started = Instant::now();
        let result = self.transport.send(method.clone(), url, options, body).await;
        match &result {
            Ok(_) => {
                self.fetch_count.fetch_add(1, Ordering::SeqCst);
                debug!("{} {} {}ms", method, url, started.elapsed().as_millis());
            }
            Err(e) => warn!("{} {} failed: {}", method, url, e),
        }
        result
    }

    /// Upstream requests since the last reset
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Fold the current count into the cumulative counter and zero it.
    ///
    /// Returns the new cumulative total. If the store fails, the taken count
    /// is put back so a later reset can still record it.
    pub async fn reset_fetch_counter(&self) -> Result<u64> {
        let taken = self.fetch_count.swap(0, Ordering::SeqCst);
        match self.cache.store().increment(FETCH_COUNTER_KEY, taken).await {
            Ok(total) => Ok(total),
            Err(e) => {
                self.fetch_count.fetch_add(taken, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Cumulative fetch count across resets, `None` if never recorded
    pub async fn cumulative_fetch_count(&self) -> Result<Option<u64>> {
        match self.cache.store().get(FETCH_COUNTER_KEY).await? {
            Some(bytes) => Ok(Some(parse_counter(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode_response(response: &RawResponse) -> std::result::Result<Vec<u8>, CacheError> {
    let value = serde_json::to_value(response).map_err(|e| CacheError::Codec(e.to_string()))?;
    graph::to_bytes(&value)
}

fn decode_response(bytes: &[u8]) -> std::result::Result<RawResponse, CacheError> {
    let value = graph::from_bytes(bytes)?;
    serde_json::from_value(value).map_err(|e| CacheError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::manager::CacheCounters;
    use crate::cache::{CacheStore, MemoryStore};
    use crate::client::MockTransport;
    use crate::error::ApiError;
    use serde_json::json;
    use std::time::Duration;

    const LUKE: &str = "https://swapi.test/api/people/1/";

    fn setup(mock: MockTransport) -> (Fetcher, Arc<CacheManager>) {
        let cache = Arc::new(CacheManager::new(Arc::new(MemoryStore::new(64, None))));
        let fetcher = Fetcher::new(Arc::new(mock), cache.clone());
        (fetcher, cache)
    }

    #[test]
    fn test_cache_key_format() {
        let key = Fetcher::cache_key(&Method::GET, LUKE, &RequestOptions::new()).unwrap();
        assert_eq!(key, format!("GET_{}_{{}}", LUKE));

        // The cache flag is not part of the key
        let uncached =
            Fetcher::cache_key(&Method::GET, LUKE, &RequestOptions::new().no_cache()).unwrap();
        assert_eq!(key, uncached);

        let with_param =
            Fetcher::cache_key(&Method::GET, LUKE, &RequestOptions::new().param("a", "b"))
                .unwrap();
        assert_ne!(key, with_param);
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_cache() {
        let mock = MockTransport::new().with_json(LUKE, json!({"name": "Luke Skywalker"}));
        let (fetcher, cache) = setup(mock.clone());

        let first = fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();
        let second = fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.call_count(LUKE).await, 1);
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(cache.counters(), CacheCounters { hits: 1, lookups: 2 });
    }

    #[tokio::test]
    async fn test_cached_response_keeps_nested_structure() {
        let body = json!({
            "count": 2,
            "next": null,
            "results": [
                {"name": "X-wing", "films": ["https://swapi.test/api/films/1/"]},
                {"name": "X-wing", "films": ["https://swapi.test/api/films/1/"]}
            ]
        });
        let url = "https://swapi.test/api/starships/?search=x-wing&page=1";
        let mock = MockTransport::new().with_json(url, body.clone());
        let (fetcher, _cache) = setup(mock);

        fetcher.get(url, &RequestOptions::new()).await.unwrap();
        let cached = fetcher.get(url, &RequestOptions::new()).await.unwrap();

        assert_eq!(cached.body, body);
    }

    #[tokio::test]
    async fn test_no_cache_bypasses_read_and_write() {
        let mock = MockTransport::new().with_json(LUKE, json!({"name": "Luke Skywalker"}));
        let (fetcher, cache) = setup(mock.clone());
        let options = RequestOptions::new().no_cache();

        fetcher.get(LUKE, &options).await.unwrap();
        fetcher.get(LUKE, &options).await.unwrap();

        assert_eq!(mock.call_count(LUKE).await, 2);
        assert_eq!(cache.lookup_count(), 0);

        // Nothing was written either
        let key = Fetcher::cache_key(&Method::GET, LUKE, &options).unwrap();
        assert!(cache.store().get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_disabled_fetcher() {
        let mock = MockTransport::new().with_json(LUKE, json!({"name": "Luke Skywalker"}));
        let (fetcher, cache) = setup(mock.clone());
        let fetcher = fetcher.with_cache_enabled(false);

        fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();
        fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();

        assert_eq!(mock.total_calls().await, 2);
        assert_eq!(cache.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let mock = MockTransport::new()
            .with_json(LUKE, json!({"name": "Luke Skywalker"}))
            .with_delay(Duration::from_millis(20));
        let (fetcher, _cache) = setup(mock.clone());

        let options = RequestOptions::new();
        let results =
            futures::future::join_all((0..4).map(|_| fetcher.get(LUKE, &options))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(mock.call_count(LUKE).await, 1);
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_uncached() {
        let mock = MockTransport::new().with_status(LUKE, 503);
        let (fetcher, _cache) = setup(mock.clone());

        let err = fetcher.get(LUKE, &RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::ServerError(_))));

        // A failure is neither counted nor cached, so the next call goes upstream
        assert_eq!(fetcher.fetch_count(), 0);
        fetcher.get(LUKE, &RequestOptions::new()).await.unwrap_err();
        assert_eq!(mock.call_count(LUKE).await, 2);
    }

    #[tokio::test]
    async fn test_writes_are_not_cached() {
        let url = "https://swapi.test/api/people/";
        let mock = MockTransport::new().with_json(url, json!({"name": "Rey"}));
        let (fetcher, cache) = setup(mock.clone());

        fetcher.post(url, &json!({"name": "Rey"})).await.unwrap();
        fetcher.post(url, &json!({"name": "Rey"})).await.unwrap();
        fetcher.patch(url, &json!({"name": "Rey"})).await.unwrap();
        fetcher.delete(url).await.unwrap();

        assert_eq!(mock.total_calls().await, 4);
        assert_eq!(fetcher.fetch_count(), 4);
        assert_eq!(cache.lookup_count(), 0);

        let methods: Vec<Method> = mock
            .captured_requests()
            .await
            .into_iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(
            methods,
            vec![Method::POST, Method::POST, Method::PATCH, Method::DELETE]
        );
    }

    #[tokio::test]
    async fn test_reset_folds_into_cumulative_counter() {
        let film = "https://swapi.test/api/films/1/";
        let mock = MockTransport::new()
            .with_json(LUKE, json!({"name": "Luke Skywalker"}))
            .with_json(film, json!({"title": "A New Hope"}));
        let (fetcher, _cache) = setup(mock);

        assert_eq!(fetcher.cumulative_fetch_count().await.unwrap(), None);

        fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();
        fetcher.get(film, &RequestOptions::new()).await.unwrap();
        assert_eq!(fetcher.reset_fetch_counter().await.unwrap(), 2);
        assert_eq!(fetcher.fetch_count(), 0);

        // Cached: no new fetch, cumulative unchanged
        fetcher.get(LUKE, &RequestOptions::new()).await.unwrap();
        assert_eq!(fetcher.reset_fetch_counter().await.unwrap(), 2);

        fetcher.get(LUKE, &RequestOptions::new().no_cache()).await.unwrap();
        assert_eq!(fetcher.reset_fetch_counter().await.unwrap(), 3);
        assert_eq!(fetcher.cumulative_fetch_count().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_resets_do_not_undercount() {
        let mock = MockTransport::new().with_json(LUKE, json!({"name": "Luke Skywalker"}));
        let (fetcher, _cache) = setup(mock);
        let options = RequestOptions::new().no_cache();

        for _ in 0..5 {
            fetcher.get(LUKE, &options).await.unwrap();
        }
        let (a, b) = tokio::join!(fetcher.reset_fetch_counter(), fetcher.reset_fetch_counter());
        a.unwrap();
        b.unwrap();

        assert_eq!(fetcher.cumulative_fetch_count().await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_get_json() {
        #[derive(serde::Deserialize)]
        struct Named {
            name: String,
        }
        let mock = MockTransport::new().with_json(LUKE, json!({"name": "Luke Skywalker"}));
        let (fetcher, _cache) = setup(mock);

        let named: Named = fetcher.get_json(LUKE).await.unwrap();
        assert_eq!(named.name, "Luke Skywalker");
    }
}
