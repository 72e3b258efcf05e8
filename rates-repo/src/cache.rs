//! In-process object cache with per-entry expiry.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use rates_types::{ObjectCache, Record};

/// A cached snapshot and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Record,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(snapshot: Record, ttl: Duration) -> Self {
        Self {
            snapshot,
            expires_at: Instant::now() + ttl,
        }
    }

    /// An entry set at `t0` with ttl `d` is expired from `t0 + d` on.
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-wide [`ObjectCache`] backed by a concurrent map.
///
/// Expired entries are dropped lazily on read, or in bulk by
/// [`MemoryCache::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl ObjectCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Record> {
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired() {
                return Some(entry.snapshot.clone());
            }
        }
        // Read guard must be dropped before removing from the same shard.
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        None
    }

    async fn set(&self, key: &str, snapshot: Record, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(snapshot, ttl));
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
