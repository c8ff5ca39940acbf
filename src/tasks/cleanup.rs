//! Expiry Sweep Task
//!
//! Periodically drops expired newsletters from the in-memory backend so
//! entries nobody reads again do not hold memory until evicted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns the sweep loop; abort the returned handle on shutdown.
///
/// The write lock is held only for the sweep itself.
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<MemoryCache>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep every {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("Expiry sweep removed {} newsletters", removed);
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_expired_only() {
        let cache = Arc::new(RwLock::new(MemoryCache::new(100)));
        {
            let mut guard = cache.write().await;
            guard
                .set(
                    "newsletter_chef_day".to_string(),
                    "stale".to_string(),
                    Duration::from_secs(1),
                )
                .unwrap();
            guard
                .set(
                    "newsletter_chef_month".to_string(),
                    "fresh".to_string(),
                    Duration::from_secs(3600),
                )
                .unwrap();
        }

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        {
            let guard = cache.read().await;
            assert_eq!(guard.len(), 1, "Only the expired entry should be swept");
            assert!(guard.ttl_remaining("newsletter_chef_month").is_some());
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let cache = Arc::new(RwLock::new(MemoryCache::new(10)));
        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
