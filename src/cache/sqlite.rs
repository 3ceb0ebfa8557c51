use rusqlite::{Connection, params, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CacheStats, CacheStore};
use crate::error::{Result, ValuationError};

/// SQLite-backed durable cache tier
///
/// ```sql
/// CREATE TABLE valuation_cache (
///     cache_key TEXT PRIMARY KEY,
///     payload TEXT NOT NULL,
///     ttl_secs INTEGER NOT NULL,
///     created_at TEXT NOT NULL,
///     expires_at INTEGER NOT NULL
/// );
/// ```
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Open (or create) the cache database
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS valuation_cache (
                cache_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                ttl_secs INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_expires_at ON valuation_cache(expires_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ValuationError::Cache("connection lock poisoned".to_string()))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT payload, ttl_secs, created_at FROM valuation_cache WHERE cache_key = ?",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload, ttl_secs, created_at)) = row else {
            return Ok(None);
        };

        // An unreadable timestamp makes the row unusable; treat as a miss
        let Some(created_at) = parse_timestamp(&created_at) else {
            tracing::warn!("Unreadable created_at for cache key {}", key);
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            payload,
            created_at,
            ttl: Duration::from_secs(ttl_secs.max(0) as u64),
        }))
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO valuation_cache (cache_key, payload, ttl_secs, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key,
                entry.payload,
                entry.ttl.as_secs() as i64,
                entry.created_at.to_rfc3339(),
                entry.expires_at().timestamp(),
            ],
        )?;

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        let total_entries: u64 = conn.query_row(
            "SELECT COUNT(*) FROM valuation_cache",
            [],
            |row| row.get(0),
        )?;

        let expired_entries: u64 = conn.query_row(
            "SELECT COUNT(*) FROM valuation_cache WHERE expires_at <= ?",
            params![now],
            |row| row.get(0),
        )?;

        let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM valuation_cache",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CacheStats {
            total_entries,
            expired_entries,
            oldest_entry: oldest.as_deref().and_then(parse_timestamp),
            newest_entry: newest.as_deref().and_then(parse_timestamp),
        })
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM valuation_cache WHERE expires_at <= ?",
            params![now.timestamp()],
        )?;

        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{PLAYER_CONTEXT_TTL, VALUATION_TTL};

    #[tokio::test]
    async fn test_cache_create() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert!(stats.oldest_entry.is_none());
    }

    #[tokio::test]
    async fn test_cache_put_and_get() {
        let cache = SqliteCache::new(":memory:").await.unwrap();

        let entry = CacheEntry::new(&vec![1, 2, 3], VALUATION_TTL).unwrap();
        cache.put("valuation:x", &entry).await.unwrap();

        let cached = cache.get("valuation:x").await.unwrap().unwrap();
        assert_eq!(cached.payload, "[1,2,3]");
        assert_eq!(cached.ttl, VALUATION_TTL);
        assert_eq!(cached.created_at.timestamp(), entry.created_at.timestamp());

        assert!(cache.get("valuation:y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_replace() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        cache.put("k", &CacheEntry::new(&1, VALUATION_TTL).unwrap()).await.unwrap();
        cache.put("k", &CacheEntry::new(&2, VALUATION_TTL).unwrap()).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().unwrap().payload, "2");
        assert_eq!(cache.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_cache_stats_and_purge() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        let old = CacheEntry::new(&1, PLAYER_CONTEXT_TTL)
            .unwrap()
            .created_at(Utc::now() - chrono::Duration::hours(2));
        cache.put("old", &old).await.unwrap();
        cache.put("fresh", &CacheEntry::new(&2, VALUATION_TTL).unwrap()).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert!(stats.oldest_entry.unwrap() < stats.newest_entry.unwrap());

        let deleted = cache.purge_expired(Utc::now()).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(cache.get("old").await.unwrap().is_none());
        assert!(cache.get("fresh").await.unwrap().is_some());
    }
}
