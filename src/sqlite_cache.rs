//! SQLite-backed persistent [`CacheTier`].
//!
//! One `cache_entries` table keyed by the semantic cache key, with an
//! absolute unix-seconds expiry. Expired rows are dropped lazily when a
//! read finds them, plus in bulk by [`SqliteCache::purge_expired`].

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::cache::CacheTier;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
    key        TEXT PRIMARY KEY,
    value      BLOB NOT NULL,
    expires_at INTEGER NOT NULL
)";

/// Persistent cache tier over a SQLite database file.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open (creating if missing) the cache database and ensure the schema.
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Delete every expired row. Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now_secs())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl CacheTier for SqliteCache {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value, expires_at FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let expires_at: i64 = row.get("expires_at");
        if expires_at <= now_secs() {
            sqlx::query("DELETE FROM cache_entries WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(row.get::<Vec<u8>, _>("value")))
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(now_secs() + ttl_secs as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{catalog_key, zip_key};
    use tempfile::TempDir;

    async fn scratch_cache() -> (TempDir, SqliteCache) {
        let tmp = TempDir::new().unwrap();
        let cache = SqliteCache::connect(&tmp.path().join("cache.sqlite"))
            .await
            .unwrap();
        (tmp, cache)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let (_tmp, cache) = scratch_cache().await;
        cache.set("k", b"value", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(&b"value"[..]));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let (_tmp, cache) = scratch_cache().await;
        cache.set("k", b"first", 60).await.unwrap();
        cache.set("k", b"second", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn expired_rows_read_as_miss_and_purge() {
        let (_tmp, cache) = scratch_cache().await;
        cache.set("dead", b"value", 0).await.unwrap();
        cache.set("live", b"value", 600).await.unwrap();

        assert_eq!(cache.get("dead").await.unwrap(), None);
        assert!(cache.get("live").await.unwrap().is_some());

        // "dead" was already dropped by the read above.
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn catalog_and_zip_keys_are_independent() {
        let (_tmp, cache) = scratch_cache().await;
        let ck = catalog_key("en", "unfoldingWord", "prod");
        let zk = zip_key("unfoldingWord", "en_ult", "v86");

        cache.set(&ck, b"catalog-json", 0).await.unwrap();
        cache.set(&zk, b"zip-bytes", 600).await.unwrap();

        // The catalog entry expiring must not affect the archive.
        assert_eq!(cache.get(&ck).await.unwrap(), None);
        assert_eq!(cache.get(&zk).await.unwrap().as_deref(), Some(&b"zip-bytes"[..]));
    }
}
