//! Configuration management for holocron

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheTtl;
use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Root for image URLs
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fan-out bound for page fetches and entity resolution
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Which store backs the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Store-wide default lifetime, 0 for entries that never expire
    #[serde(default)]
    pub default_ttl_secs: u64,

    /// Capacity of the memory backend
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Whole-result cache lifetime, 0 to turn it off
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,

    /// Directory of the sqlite backend, defaults to the user cache dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "https://swapi.dev/api/".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    32
}

fn default_max_entries() -> usize {
    4000
}

fn default_response_ttl_secs() -> u64 {
    CacheTtl::RESPONSE.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            default_ttl_secs: 0,
            max_entries: default_max_entries(),
            response_ttl_secs: default_response_ttl_secs(),
            dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_url: default_app_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            cache: CacheConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.default_ttl_secs)
    }

    pub fn response_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.response_ttl_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Append a trailing `/` so relative paths join under the URL
pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".holocron").join("config.yaml"))
    }

    /// Explicit path if given, otherwise the default one
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        config.normalized()
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Validate values and make both URLs end in `/`
    pub fn normalized(mut self) -> Result<Self> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()).into());
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid("max_concurrent must be at least 1".to_string()).into());
        }
        if self.cache.backend == CacheBackend::Memory && self.cache.max_entries == 0 {
            return Err(
                ConfigError::Invalid("cache.max_entries must be at least 1".to_string()).into(),
            );
        }
        self.api_base_url = with_trailing_slash(self.api_base_url.trim());
        self.app_url = with_trailing_slash(self.app_url.trim());
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
