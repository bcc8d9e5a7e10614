//! SQLite-based cache store with file blob support
//!
//! Small values live inline in SQLite, large ones (>10KB) as sharded files.
//! Survives across process runs, which keeps the cumulative fetch counter
//! meaningful for a CLI that does one operation per invocation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use sha2::{Digest, Sha256};

use super::store::{CacheStore, effective_ttl, parse_counter};
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Values larger than this are stored as external blobs
const INLINE_THRESHOLD: usize = 10 * 1024; // 10KB

type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed cache store with file blob support
pub struct SqliteStore {
    conn: Mutex<Connection>,
    blobs_dir: PathBuf,
    dir: PathBuf,
    default_ttl: Option<Duration>,
}

impl SqliteStore {
    /// Get the cache directory path (~/.cache/holocron on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("holocron"))
    }

    /// Open the store in a specific directory
    pub fn open_at(cache_dir: &Path, default_ttl: Option<Duration>) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let blobs_dir = cache_dir.join("blobs");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create blobs dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path, &blobs_dir)?;
            return Self::open_at(cache_dir, default_ttl);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                namespace TEXT NOT NULL,
                data BLOB,
                blob_path TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expires_at ON cache_entries(expires_at);
            CREATE INDEX IF NOT EXISTS idx_namespace ON cache_entries(namespace);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            blobs_dir,
            dir: cache_dir.to_path_buf(),
            default_ttl,
        })
    }

    /// Directory this store lives in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Poisoned("sqlite store"))
    }

    fn read(&self, conn: &Connection, key: &str, now: i64) -> Result<Option<Vec<u8>>> {
        let result: Option<(Option<Vec<u8>>, Option<String>)> = conn
            .query_row(
                "SELECT data, blob_path FROM cache_entries
                 WHERE cache_key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match result {
            Some((Some(data), None)) => Ok(Some(data)),
            Some((None, Some(blob_path))) => {
                let full_path = self.blobs_dir.join(&blob_path);
                match std::fs::read(&full_path) {
                    Ok(data) => Ok(Some(data)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        log::warn!("Blob {} vanished, dropping entry", blob_path);
                        conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1", [key])?;
                        Ok(None)
                    }
                    Err(e) => Err(CacheError::Io(format!(
                        "Failed to read blob {}: {}",
                        blob_path, e
                    ))),
                }
            }
            _ => Ok(None),
        }
    }

    fn write(
        &self,
        conn: &Connection,
        key: &str,
        data: &[u8],
        expires_at: Option<i64>,
        now: i64,
    ) -> Result<()> {
        let namespace = namespace_of(key);

        if data.len() <= INLINE_THRESHOLD {
            self.remove_blob(conn, key)?;
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_key, namespace, data, blob_path, created_at, expires_at, size_bytes)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
                params![key, namespace, data, now, expires_at, data.len()],
            )?;
        } else {
            let blob_path = self.write_blob(key, data)?;
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_key, namespace, data, blob_path, created_at, expires_at, size_bytes)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6)",
                params![key, namespace, blob_path, now, expires_at, data.len()],
            )?;
        }
        Ok(())
    }

    /// Delete the blob file behind `key`, if it has one
    fn remove_blob(&self, conn: &Connection, key: &str) -> Result<()> {
        let blob_path: Option<String> = conn
            .query_row(
                "SELECT blob_path FROM cache_entries WHERE cache_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        if let Some(blob_path) = blob_path {
            match std::fs::remove_file(self.blobs_dir.join(&blob_path)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io(format!(
                        "Failed to remove blob {}: {}",
                        blob_path, e
                    )));
                }
            }
        }
        Ok(())
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        conn.execute("DELETE FROM cache_entries", [])?;

        if self.blobs_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.blobs_dir) {
                log::warn!("Failed to clear blobs directory: {}", e);
            }
            std::fs::create_dir_all(&self.blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        }

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp_millis();

        let total_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        let valid_entries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE expires_at IS NULL OR expires_at > ?1",
            [now],
            |r| r.get(0),
        )?;

        let total_size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries",
            [],
            |r| r.get(0),
        )?;

        let oldest: Option<i64> = conn
            .query_row(
                "SELECT MIN(created_at) FROM cache_entries
                 WHERE expires_at IS NULL OR expires_at > ?1",
                [now],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        let newest: Option<i64> = conn
            .query_row(
                "SELECT MAX(created_at) FROM cache_entries
                 WHERE expires_at IS NULL OR expires_at > ?1",
                [now],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        Ok(CacheStats {
            total_entries: total_entries as usize,
            valid_entries: valid_entries as usize,
            expired_entries: (total_entries - valid_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }

    /// Write a blob file, sharded by the first 2 chars of the hashed key
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<String> {
        let name = format!("{:x}", Sha256::digest(key.as_bytes()));
        let shard = &name[..2];
        let shard_dir = self.blobs_dir.join(shard);
        std::fs::create_dir_all(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create shard dir: {}", e)))?;

        let filename = format!("{}.bin", name);
        let rel_path = format!("{}/{}", shard, filename);

        std::fs::write(shard_dir.join(&filename), data)
            .map_err(|e| CacheError::Io(format!("Failed to write blob: {}", e)))?;

        Ok(rel_path)
    }

    /// Nuke the cache (delete DB and all blobs)
    fn nuke(db_path: &Path, blobs_dir: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        if blobs_dir.exists() {
            std::fs::remove_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to remove blobs dir: {}", e)))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        self.read(&conn, key, Utc::now().timestamp_millis())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let expires_at =
            effective_ttl(ttl, self.default_ttl).map(|ttl| now + ttl.as_millis() as i64);
        let conn = self.conn()?;
        self.write(&conn, key, value, expires_at, now)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        self.remove_blob(&conn, key)?;
        conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1", [key])?;
        Ok(())
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front so concurrent processes
        // serialize their read-modify-write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = Utc::now().timestamp_millis();
        let current = match self.read(&tx, key, now)? {
            Some(bytes) => parse_counter(&bytes)?,
            None => 0,
        };
        let total = current + delta;
        self.write(&tx, key, total.to_string().as_bytes(), None, now)?;
        tx.commit()?;
        Ok(total)
    }
}

/// Namespace column value: the key prefix before its first `:` or `_`
fn namespace_of(key: &str) -> &str {
    key.split([':', '_']).next().unwrap_or(key)
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    /// Unix epoch milliseconds
    pub oldest_entry: Option<i64>,
    /// Unix epoch milliseconds
    pub newest_entry: Option<i64>,
}
