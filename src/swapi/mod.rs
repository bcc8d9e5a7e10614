//! Star Wars API domain: collections, raw records and mapped entities
//!
//! Raw records are what the upstream API returns. Mapped entities are the
//! flattened output shape, cached per id under `<namespace>:<id>`. A person
//! embeds its starships and films by value.

pub mod intercept;
pub mod resolver;
pub mod service;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

pub use resolver::Resolver;
pub use service::{RequestCounters, ServiceSettings, SwapiService};

/// Upstream collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    People,
    Films,
    Starships,
}

impl Collection {
    /// Path segment under the API base URL
    pub fn path(self) -> &'static str {
        match self {
            Collection::People => "people",
            Collection::Films => "films",
            Collection::Starships => "starships",
        }
    }

    /// Cache namespace of the mapped entities
    pub fn namespace(self) -> &'static str {
        match self {
            Collection::People => "person",
            Collection::Films => "film",
            Collection::Starships => "starship",
        }
    }
}

/// Identifier of an entity: the last non-empty path segment of its URL.
pub fn entity_id(url: &str) -> Result<String> {
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    match trimmed.rsplit('/').next() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ApiError::InvalidResponse(format!("Entity URL has no identifier: '{}'", url)).into()),
    }
}

/// A mapped entity with its raw source shape.
#[async_trait]
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Upstream record this entity is mapped from
    type Raw: DeserializeOwned + Send + Sync;

    const COLLECTION: Collection;

    /// Canonical URL of a raw record
    fn url(raw: &Self::Raw) -> &str;

    /// Build the output shape, resolving cross-references through `resolver`
    async fn map(raw: &Self::Raw, id: &str, resolver: &Resolver) -> Result<Self>;
}

// ============================================================================
// Raw records
// ============================================================================

/// Person as returned by `/people/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPerson {
    pub name: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub mass: String,
    #[serde(default)]
    pub gender: String,
    /// Starship URLs
    #[serde(default)]
    pub starships: Vec<String>,
    /// Film URLs
    #[serde(default)]
    pub films: Vec<String>,
    pub url: String,
}

/// Film as returned by `/films/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFilm {
    pub title: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub release_date: String,
    pub url: String,
}

/// Starship as returned by `/starships/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStarship {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub starship_class: String,
    pub url: String,
}

// ============================================================================
// Mapped entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub height: String,
    pub mass: String,
    pub gender: String,
    pub starships: Vec<Starship>,
    pub films: Vec<Film>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: String,
    pub title: String,
    pub director: String,
    pub producer: String,
    pub release_date: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Starship {
    pub id: String,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub vehicle_class: String,
    pub image: String,
}

#[async_trait]
impl Entity for Person {
    type Raw = RawPerson;
    const COLLECTION: Collection = Collection::People;

    fn url(raw: &RawPerson) -> &str {
        &raw.url
    }

    async fn map(raw: &RawPerson, id: &str, resolver: &Resolver) -> Result<Self> {
        // Cross-references only point person -> starship/film, so no cycle check
        let (starships, films) = tokio::try_join!(
            resolver.resolve_urls::<Starship>(&raw.starships),
            resolver.resolve_urls::<Film>(&raw.films),
        )?;

        Ok(Person {
            id: id.to_string(),
            name: raw.name.clone(),
            height: raw.height.clone(),
            mass: raw.mass.clone(),
            gender: raw.gender.clone(),
            starships,
            films,
            image: resolver.image_url(Self::COLLECTION, id),
        })
    }
}

#[async_trait]
impl Entity for Film {
    type Raw = RawFilm;
    const COLLECTION: Collection = Collection::Films;

    fn url(raw: &RawFilm) -> &str {
        &raw.url
    }

    async fn map(raw: &RawFilm, id: &str, resolver: &Resolver) -> Result<Self> {
        Ok(Film {
            id: id.to_string(),
            title: raw.title.clone(),
            director: raw.director.clone(),
            producer: raw.producer.clone(),
            release_date: raw.release_date.clone(),
            image: resolver.image_url(Self::COLLECTION, id),
        })
    }
}

#[async_trait]
impl Entity for Starship {
    type Raw = RawStarship;
    const COLLECTION: Collection = Collection::Starships;

    fn url(raw: &RawStarship) -> &str {
        &raw.url
    }

    async fn map(raw: &RawStarship, id: &str, resolver: &Resolver) -> Result<Self> {
        Ok(Starship {
            id: id.to_string(),
            name: raw.name.clone(),
            model: raw.model.clone(),
            manufacturer: raw.manufacturer.clone(),
            vehicle_class: raw.starship_class.clone(),
            image: resolver.image_url(Self::COLLECTION, id),
        })
    }
}
