//! Per-entity cache-or-compute resolution

use std::sync::Arc;

use serde_json::Value;

use super::{Collection, Entity, entity_id};
use crate::cache::{CacheManager, CacheTtl};
use crate::client::parallel::resolve_in_order;
use crate::client::{Fetcher, FlightGroup};
use crate::error::{Error, Result};

/// Maps raw records to cached output entities.
///
/// A mapped entity is looked up under `<namespace>:<id>` and trusted as-is on
/// a hit. On a miss it is mapped (resolving nested references through the
/// same resolver), stored without a TTL override and returned. Concurrent
/// misses on the same key share a single mapping.
pub struct Resolver {
    fetcher: Arc<Fetcher>,
    cache: Arc<CacheManager>,
    api_base_url: String,
    app_url: String,
    max_concurrent: usize,
    flights: FlightGroup<Value>,
}

impl Resolver {
    /// `api_base_url` and `app_url` must end with `/`
    pub fn new(
        fetcher: Arc<Fetcher>,
        cache: Arc<CacheManager>,
        api_base_url: impl Into<String>,
        app_url: impl Into<String>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            api_base_url: api_base_url.into(),
            app_url: app_url.into(),
            max_concurrent,
            flights: FlightGroup::new(),
        }
    }

    pub fn cache_key(collection: Collection, id: &str) -> String {
        format!("{}:{}", collection.namespace(), id)
    }

    /// `<app_url>public/static/assets/img/<collection>/<id>.jpg`
    pub fn image_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}public/static/assets/img/{}/{}.jpg",
            self.app_url,
            collection.path(),
            id
        )
    }

    /// First-page base URL of a collection
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}{}/", self.api_base_url, collection.path())
    }

    /// URL of a single entity
    pub fn entity_url(&self, collection: Collection, id: &str) -> String {
        format!("{}{}/{}/", self.api_base_url, collection.path(), id)
    }

    /// Resolve one raw record
    pub async fn resolve<E: Entity>(&self, raw: &E::Raw) -> Result<E> {
        let id = entity_id(E::url(raw))?;
        let key = Self::cache_key(E::COLLECTION, &id);

        if let Some(cached) = self.cache.get::<E>(&key).await? {
            return Ok(cached);
        }
        self.compute_and_store(&key, raw, &id).await
    }

    /// Resolve raw records concurrently, keeping their order
    pub async fn resolve_all<E: Entity>(&self, raws: &[E::Raw]) -> Result<Vec<E>> {
        resolve_in_order(raws, |raw| self.resolve::<E>(raw), self.max_concurrent).await
    }

    /// Fetch a referenced URL and resolve the record behind it
    pub async fn resolve_url<E: Entity>(&self, url: &str) -> Result<E> {
        let raw: E::Raw = self.fetcher.get_json(url).await?;
        self.resolve::<E>(&raw).await
    }

    /// Resolve referenced URLs concurrently, keeping their order
    pub async fn resolve_urls<E: Entity>(&self, urls: &[String]) -> Result<Vec<E>> {
        resolve_in_order(
            urls.iter().cloned(),
            move |url: String| async move { self.resolve_url::<E>(&url).await },
            self.max_concurrent,
        )
        .await
    }

    /// Resolve an entity by id: cached mapping first, then the upstream record
    pub async fn resolve_by_id<E: Entity>(&self, id: &str) -> Result<E> {
        let key = Self::cache_key(E::COLLECTION, id);
        if let Some(cached) = self.cache.get::<E>(&key).await? {
            return Ok(cached);
        }
        self.resolve_url::<E>(&self.entity_url(E::COLLECTION, id))
            .await
    }

    async fn compute_and_store<E: Entity>(&self, key: &str, raw: &E::Raw, id: &str) -> Result<E> {
        let value = self
            .flights
            .run(key, || async {
                let mapped = E::map(raw, id, self).await?;
                self.cache.set(key, &mapped, CacheTtl::ENTITY).await?;
                Ok::<_, Error>(serde_json::to_value(&mapped)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
