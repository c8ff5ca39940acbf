//! Cache Store Module
//!
//! The capability set every backing store exposes to the gateway and the
//! invalidation manager.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheStats, KeyPattern};
use crate::error::{CacheError, Result};

// == Bounded ==
/// Runs a store call under a deadline; overrunning it is a `Timeout`,
/// which callers treat like an unreachable store.
pub async fn bounded<T, F>(deadline: Duration, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Timeout(format!(
            "store {} exceeded {} ms",
            operation,
            deadline.as_millis()
        ))),
    }
}

// == Cache Store Trait ==
/// Key-value store with expiration.
///
/// Expiration is enforced by the implementation: `get` never returns an
/// expired value and reads never extend a TTL. Each method is atomic at
/// single-key granularity, so callers hold no locks of their own.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Short backend name for logs and stats.
    fn backend(&self) -> &'static str;

    /// Whether the store can currently be reached.
    fn is_available(&self) -> bool;

    /// Returns the live value for `key`; absent or expired is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remaining lifetime of a live key.
    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>>;

    /// Stores `value`, replacing any previous value and resetting the TTL.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Deletes one key; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Deletes every key matched by `pattern`; returns how many were removed.
    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<usize>;

    /// Lists the keys matched by `pattern`.
    async fn list_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>>;

    /// Snapshot for monitoring.
    async fn stats(&self) -> Result<CacheStats>;
}
