//! Aggregation service: the operations the CLI calls
//!
//! Every top-level operation runs through the logging and response-cache
//! interceptors, then logs the request's cache hit ratio and fetch count and
//! resets both counters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::intercept::{CallContext, logged, response_cached};
use super::{Entity, Film, Person, Resolver, Starship};
use crate::cache::CacheManager;
use crate::client::{Fetcher, fetch_all_pages};
use crate::error::Result;

/// Wiring parameters for [`SwapiService`]
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Upstream API root, ending in `/`
    pub api_base_url: String,
    /// Root for image URLs, ending in `/`
    pub app_url: String,
    /// Fan-out bound for page fetches and entity resolution
    pub max_concurrent: usize,
    /// Whole-result cache lifetime, `None` to disable
    pub response_ttl: Option<Duration>,
}

/// Counters of one top-level operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounters {
    pub cache_hits: u64,
    pub cache_lookups: u64,
    pub fetch_count: u64,
}

pub struct SwapiService {
    cache: Arc<CacheManager>,
    fetcher: Arc<Fetcher>,
    resolver: Resolver,
    settings: ServiceSettings,
    last_counters: Mutex<Option<RequestCounters>>,
}

impl SwapiService {
    pub fn new(cache: Arc<CacheManager>, fetcher: Arc<Fetcher>, settings: ServiceSettings) -> Self {
        let resolver = Resolver::new(
            fetcher.clone(),
            cache.clone(),
            settings.api_base_url.clone(),
            settings.app_url.clone(),
            settings.max_concurrent,
        );
        Self {
            cache,
            fetcher,
            resolver,
            settings,
            last_counters: Mutex::new(None),
        }
    }

    pub async fn list_people(&self, search: Option<&str>) -> Result<Vec<Person>> {
        let ctx = CallContext::new("list_people", json!({ "search": search }));
        self.intercepted(&ctx, || self.aggregate::<Person>(search))
            .await
    }

    pub async fn get_person_by_id(&self, id: &str) -> Result<Person> {
        let ctx = CallContext::new("get_person_by_id", json!({ "id": id }));
        self.intercepted(&ctx, || self.by_id::<Person>(id)).await
    }

    pub async fn list_films(&self, search: Option<&str>) -> Result<Vec<Film>> {
        let ctx = CallContext::new("list_films", json!({ "search": search }));
        self.intercepted(&ctx, || self.aggregate::<Film>(search))
            .await
    }

    pub async fn get_film_by_id(&self, id: &str) -> Result<Film> {
        let ctx = CallContext::new("get_film_by_id", json!({ "id": id }));
        self.intercepted(&ctx, || self.by_id::<Film>(id)).await
    }

    pub async fn list_starships(&self, search: Option<&str>) -> Result<Vec<Starship>> {
        let ctx = CallContext::new("list_starships", json!({ "search": search }));
        self.intercepted(&ctx, || self.aggregate::<Starship>(search))
            .await
    }

    pub async fn get_starship_by_id(&self, id: &str) -> Result<Starship> {
        let ctx = CallContext::new("get_starship_by_id", json!({ "id": id }));
        self.intercepted(&ctx, || self.by_id::<Starship>(id))
            .await
    }

    /// Cumulative upstream fetch count, `None` if nothing was ever recorded
    pub async fn get_cumulative_fetch_count(&self) -> Result<Option<u64>> {
        let ctx = CallContext::new("get_cumulative_fetch_count", Value::Null);
        logged(&ctx, || self.fetcher.cumulative_fetch_count()).await
    }

    /// Counters logged by the most recent top-level operation
    pub fn last_counters(&self) -> Option<RequestCounters> {
        *self.last_counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn intercepted<T, F, Fut>(&self, ctx: &CallContext, call: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        // A response-cache hit skips aggregation and records no counters
        *self.last_counters.lock().unwrap_or_else(|e| e.into_inner()) = None;
        let store = self.cache.store().as_ref();
        let ttl = self.settings.response_ttl;
        logged(ctx, || response_cached(store, ttl, ctx, call)).await
    }

    /// Fetch every page of a collection and map all of it, in source order
    async fn aggregate<E: Entity>(&self, search: Option<&str>) -> Result<Vec<E>> {
        let result = async {
            let base_url = self.resolver.collection_url(E::COLLECTION);
            let raws: Vec<E::Raw> = fetch_all_pages(
                &self.fetcher,
                &base_url,
                search,
                self.settings.max_concurrent,
            )
            .await?;
            self.resolver.resolve_all::<E>(&raws).await
        }
        .await;

        // Counters belong to this request even when it failed
        let finished = self.finish_request().await;
        let items = result?;
        finished?;
        Ok(items)
    }

    async fn by_id<E: Entity>(&self, id: &str) -> Result<E> {
        let result = self.resolver.resolve_by_id::<E>(id).await;
        let finished = self.finish_request().await;
        let entity = result?;
        finished?;
        Ok(entity)
    }

    /// Log this request's counters, then reset them
    async fn finish_request(&self) -> Result<RequestCounters> {
        let cache = self.cache.take_counters();
        let counters = RequestCounters {
            cache_hits: cache.hits,
            cache_lookups: cache.lookups,
            fetch_count: self.fetcher.fetch_count(),
        };

        info!(
            "Cache hit/lookup ratio for current req: {}/{}",
            counters.cache_hits, counters.cache_lookups
        );
        info!("Requests fetched for current req: {}", counters.fetch_count);

        *self.last_counters.lock().unwrap_or_else(|e| e.into_inner()) = Some(counters);
        self.fetcher.reset_fetch_counter().await?;
        Ok(counters)
    }
}
