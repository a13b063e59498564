use std::future::Future;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, warn};

/// Derives the storage key for a memoized call: SHA-256 over the function
/// name and the JSON encoding of its argument tuple.
pub fn cache_key<A: Serialize + ?Sized>(function: &str, args: &A) -> Result<String> {
    let encoded = serde_json::to_vec(args).context("failed to encode cache arguments")?;
    let mut hasher = Sha256::new();
    hasher.update(function.as_bytes());
    hasher.update([0u8]);
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Persistent key-value store used for cache-aside memoization of network
/// calls. Entries never expire; an entry is only replaced by recomputing the
/// same key.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pool: SqlitePool,
    name: String,
}

impl CacheStore {
    /// Opens (creating if needed) a SQLite-backed store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create cache directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open cache {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache".to_owned());
        Self::init(pool, name).await
    }

    /// Store that lives as long as the process. The pool is pinned to one
    /// connection because every SQLite memory connection is its own database.
    pub async fn in_memory(name: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory cache")?;
        Self::init(pool, name.to_owned()).await
    }

    async fn init(pool: SqlitePool, name: String) -> Result<Self> {
        sqlx::query(
            "
                CREATE TABLE IF NOT EXISTS cache_entries (
                    key TEXT PRIMARY KEY NOT NULL,
                    function TEXT NOT NULL,
                    value TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
            ",
        )
        .execute(&pool)
        .await
        .context("failed to create cache table")?;
        Ok(Self { pool, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a key. An entry that no longer decodes as `V` counts as a miss.
    pub async fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read from cache {}", self.name))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("value")?;
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding undecodable entry {} in cache {}: {}", key, self.name, e);
                Ok(None)
            }
        }
    }

    pub async fn put<V: Serialize + ?Sized>(&self, key: &str, function: &str, value: &V) -> Result<()> {
        let raw = serde_json::to_string(value).context("failed to encode cache value")?;
        sqlx::query(
            "
                INSERT INTO cache_entries (key, function, value, created_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (key) DO UPDATE SET
                    value = excluded.value,
                    created_at = excluded.created_at
            ",
        )
        .bind(key)
        .bind(function)
        .bind(raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write to cache {}", self.name))?;
        Ok(())
    }

    pub async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drops every entry, returning how many were removed.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Cache-aside lookup. On a hit the stored value is returned and `compute`
    /// is never polled. On a miss `compute` runs; its value is stored only when
    /// `store_if` accepts it, and errors are passed through without storing.
    pub async fn get_or_compute<A, V, E, P, F, Fut>(
        &self,
        function: &str,
        args: &A,
        store_if: P,
        compute: F,
    ) -> std::result::Result<V, E>
    where
        A: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        E: From<anyhow::Error>,
        P: FnOnce(&V) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let key = cache_key(function, args)?;
        if let Some(value) = self.get(&key).await? {
            debug!("Cache hit in {} for {}", self.name, function);
            return Ok(value);
        }

        debug!("Cache miss in {} for {}", self.name, function);
        let value = compute().await?;
        if store_if(&value) {
            self.put(&key, function, &value).await?;
        } else {
            debug!("Not storing result of {} in {}", function, self.name);
        }
        Ok(value)
    }
}
