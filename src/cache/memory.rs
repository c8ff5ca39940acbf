//! In-Memory Store Module
//!
//! HashMap storage with LRU capacity eviction and passive TTL expiry,
//! wrapped behind the async [`CacheStore`] trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{
    CacheEntry, CacheStats, CacheStore, HitCounters, KeyPattern, LruTracker, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// Synchronous cache engine; [`MemoryStore`] shares it behind a lock.
#[derive(Debug)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    counters: HitCounters,
    max_entries: usize,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_entries` newsletters.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: HitCounters::default(),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores a value with a TTL, overwriting any previous entry.
    ///
    /// When the cache is full and `key` is new, the least recently used
    /// entry is evicted first.
    pub fn set(&mut self, key: String, value: String, ttl: Duration) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                debug!("Evicting least recently used key {}", evicted);
                self.entries.remove(&evicted);
                self.counters.record_eviction();
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        self.lru.touch(&key);
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`.
    ///
    /// Expired entries are dropped on read and counted as misses. Reads do
    /// not change the expiration.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                self.remove_entry(key);
                None
            }
            None => None,
        };

        match value {
            Some(value) => {
                self.counters.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining)
    }

    // == Delete ==
    /// Removes `key`; returns whether a live entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.remove_entry(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Removes every live entry matched by `pattern`.
    pub fn delete_matching(&mut self, pattern: &KeyPattern) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        keys.iter().filter(|key| self.delete(key.as_str())).count()
    }

    /// Live keys matched by `pattern`, sorted.
    pub fn keys(&self, pattern: &KeyPattern) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, entry)| pattern.matches(key) && !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Cleanup Expired ==
    /// Removes all expired entries; returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    pub fn counters(&self) -> HitCounters {
        self.counters
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }
}

// == Memory Store ==
/// Shared, cloneable in-memory [`CacheStore`].
///
/// Availability can be toggled to exercise degraded mode.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    cache: Arc<RwLock<MemoryCache>>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(MemoryCache::new(max_entries))),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle on the underlying cache, for the expiry sweep.
    pub fn cache(&self) -> Arc<RwLock<MemoryCache>> {
        self.cache.clone()
    }

    /// Marks the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(CacheError::StoreUnavailable(
                "in-memory store is marked unavailable".to_string(),
            ))
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        Ok(self.cache.write().await.get(key))
    }

    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>> {
        self.ensure_available()?;
        Ok(self.cache.read().await.ttl_remaining(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_available()?;
        self.cache
            .write()
            .await
            .set(key.to_string(), value.to_string(), ttl)
            .map_err(|e| CacheError::StoreWriteFailed(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.cache.write().await.delete(key))
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<usize> {
        self.ensure_available()?;
        Ok(self.cache.write().await.delete_matching(pattern))
    }

    async fn list_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        self.ensure_available()?;
        Ok(self.cache.read().await.keys(pattern))
    }

    async fn stats(&self) -> Result<CacheStats> {
        let cache = self.cache.read().await;
        let count = cache.keys(&KeyPattern::all()).len();
        Ok(CacheStats::new(self.backend(), self.is_available(), count)
            .with_counters(cache.counters()))
    }
}
