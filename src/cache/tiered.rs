use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, CacheStore, MemoryCache};
use crate::error::Result;

/// In-process map in front of an optional durable store.
///
/// Reads check memory first, then the durable store (repopulating memory on
/// a hit). Writes go to both; a failed durable write is logged and ignored.
pub struct TieredCache {
    memory: MemoryCache,
    durable: Option<Arc<dyn CacheStore>>,
}

impl TieredCache {
    pub fn new(durable: Arc<dyn CacheStore>) -> Self {
        Self {
            memory: MemoryCache::new(),
            durable: Some(durable),
        }
    }

    /// Memory tier only
    pub fn in_memory() -> Self {
        Self {
            memory: MemoryCache::new(),
            durable: None,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    /// Lookup as of `now`; stale entries are misses in both tiers
    pub async fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        if let Some(entry) = self.memory.get(key, now) {
            tracing::debug!("Memory cache hit for {}", key);
            return decode(key, &entry);
        }

        let durable = self.durable.as_ref()?;
        let entry = match durable.get(key).await {
            Ok(Some(entry)) if entry.is_valid_at(now) => entry,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!("Durable cache read for {} failed: {}", key, e);
                return None;
            }
        };

        tracing::debug!("Durable cache hit for {}", key);
        let value = decode(key, &entry);
        if value.is_some() {
            self.memory.put(key, entry);
        }
        value
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match CacheEntry::new(value, ttl) {
            Ok(entry) => self.put_entry(key, entry).await,
            Err(e) => tracing::warn!("Could not serialize cache value for {}: {}", key, e),
        }
    }

    /// Store a prepared entry in both tiers
    pub async fn put_entry(&self, key: &str, entry: CacheEntry) {
        if let Some(durable) = &self.durable {
            if let Err(e) = durable.put(key, &entry).await {
                tracing::warn!("Failed to persist cache entry {}: {}", key, e);
            }
        }
        self.memory.put(key, entry);
    }

    /// Durable tier statistics (memory-only caches report zeros)
    pub async fn stats(&self) -> Result<CacheStats> {
        match &self.durable {
            Some(durable) => durable.stats().await,
            None => Ok(CacheStats {
                total_entries: self.memory.len() as u64,
                ..Default::default()
            }),
        }
    }

    /// Sweep stale entries from both tiers. Reports the durable count, or the
    /// memory count for a memory-only cache.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let from_memory = self.memory.purge_expired(now) as u64;
        match &self.durable {
            Some(durable) => durable.purge_expired(now).await,
            None => Ok(from_memory),
        }
    }

    /// Entries held in the in-process tier
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Drop the in-process tier (the durable tier is untouched)
    pub fn clear_memory(&self) {
        self.memory.clear();
    }
}

fn decode<T: DeserializeOwned>(key: &str, entry: &CacheEntry) -> Option<T> {
    match serde_json::from_str(&entry.payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
            None
        }
    }
}
