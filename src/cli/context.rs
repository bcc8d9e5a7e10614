//! Command execution context
//!
//! Merges config file and global flags, then wires store, cache manager,
//! transport, fetcher and service together.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::cache::{CacheManager, CacheStore, MemoryStore, SqliteStore};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{Fetcher, HttpTransport};
use crate::config::{CacheBackend, Config};
use crate::error::Result;
use crate::swapi::{ServiceSettings, SwapiService};

/// Context for command execution containing config, service and runtime options.
pub struct CommandContext {
    /// Config file merged with CLI/env overrides
    pub config: Config,
    /// Aggregation service (Arc-wrapped so handlers can move it into futures)
    pub service: Arc<SwapiService>,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Self::load_config(opts)?;

        let store = open_store(&config)?;
        let cache = Arc::new(CacheManager::new(store));
        let transport = Arc::new(HttpTransport::new(config.request_timeout())?);
        let fetcher =
            Arc::new(Fetcher::new(transport, cache.clone()).with_cache_enabled(!opts.no_cache));

        let service = Arc::new(SwapiService::new(
            cache,
            fetcher,
            ServiceSettings {
                api_base_url: config.api_base_url.clone(),
                app_url: config.app_url.clone(),
                max_concurrent: config.max_concurrent,
                response_ttl: config.cache.response_ttl(),
            },
        ));

        Ok(Self {
            config,
            service,
            format: opts.format,
        })
    }

    /// Config file with CLI/env overrides applied
    pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
        let mut config = Config::load_at(opts.config_ref())?;

        if let Some(url) = opts.api_url_ref() {
            config.api_base_url = url.to_string();
        }
        if let Some(url) = opts.app_url_ref() {
            config.app_url = url.to_string();
        }
        if opts.memory {
            config.cache.backend = CacheBackend::Memory;
        }

        config.normalized()
    }
}

/// Directory of the sqlite store for this config
pub fn sqlite_dir(config: &Config) -> Result<PathBuf> {
    match &config.cache.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(SqliteStore::cache_dir()?),
    }
}

/// Open the sqlite store for this config regardless of the selected backend
pub fn open_sqlite(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::open_at(
        &sqlite_dir(config)?,
        config.cache.default_ttl(),
    )?)
}

/// Open the store the config selects
pub fn open_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Memory => {
            debug!(
                "Using in-process cache ({} entries)",
                config.cache.max_entries
            );
            Arc::new(MemoryStore::new(
                config.cache.max_entries,
                config.cache.default_ttl(),
            ))
        }
        CacheBackend::Sqlite => {
            let store = open_sqlite(config)?;
            debug!("Using sqlite cache at {}", store.dir().display());
            Arc::new(store)
        }
    };
    Ok(store)
}
