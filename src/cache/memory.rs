use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::cache::CacheEntry;

/// In-process tier. Concurrent writes to one key are last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid entry for `key`; an expired one is evicted
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if entry.is_valid_at(now) => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
        None
    }

    pub fn put(&self, key: &str, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), entry);
        }
    }

    /// Drop every entry stale at `now`; returns how many were dropped
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.is_valid_at(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
