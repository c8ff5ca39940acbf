//! Disabled Store Module
//!
//! Stand-in store used when caching is switched off or unconfigured.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheStats, CacheStore, KeyPattern};
use crate::error::{CacheError, Result};

/// A store that is never available; the gateway treats every lookup as a
/// miss and skips write-through.
#[derive(Debug, Clone)]
pub struct DisabledStore {
    reason: String,
}

impl DisabledStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(CacheError::StoreUnavailable(self.reason.clone()))
    }
}

#[async_trait]
impl CacheStore for DisabledStore {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.unavailable()
    }

    async fn ttl_remaining(&self, _key: &str) -> Result<Option<Duration>> {
        self.unavailable()
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.unavailable()
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        self.unavailable()
    }

    async fn delete_matching(&self, _pattern: &KeyPattern) -> Result<usize> {
        self.unavailable()
    }

    async fn list_keys(&self, _pattern: &KeyPattern) -> Result<Vec<String>> {
        self.unavailable()
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats::new(self.backend(), false, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_store_rejects_everything() {
        let store = DisabledStore::new("REDIS_URL not set");

        assert!(!store.is_available());
        let err = store.get("newsletter_chef_day").await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("REDIS_URL not set"));
        assert!(store
            .delete_matching(&KeyPattern::all())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_disabled_store_stats() {
        let stats = DisabledStore::new("off").stats().await.unwrap();
        assert_eq!(stats.backend, "disabled");
        assert!(!stats.connected);
        assert_eq!(stats.newsletter_count, 0);
    }
}
