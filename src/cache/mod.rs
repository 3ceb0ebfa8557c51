pub mod memory;
pub mod sqlite;
pub mod tiered;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::error::Result;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use tiered::TieredCache;

/// TTL for valuations and quick analyses
pub const VALUATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL for player news/context lookups
pub const PLAYER_CONTEXT_TTL: Duration = Duration::from_secs(60 * 60);

/// Trait for durable cache stores
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the entry stored under `key`, expired or not
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry under `key`
    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<()>;

    /// Get cache statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Delete entries that are no longer valid at `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// A serialized value with its creation time and lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        Ok(Self {
            payload: serde_json::to_string(value)?,
            created_at: Utc::now(),
            ttl,
        })
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + chrono::Duration::seconds(self.ttl.as_secs() as i64)
    }

    /// Valid iff `now - created_at < ttl`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (now - self.created_at).to_std() {
            Ok(age) => age < self.ttl,
            // created in the future (clock skew between writers)
            Err(_) => true,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: u64,
    pub expired_entries: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}
