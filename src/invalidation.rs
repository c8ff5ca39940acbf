//! Invalidation Manager
//!
//! Removes cached newsletters before they expire, either one
//! `(profession, time_period)` entry or every period of a profession.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{bounded, build_key, CacheStore, KeyPattern, TimePeriod};
use crate::gateway::DEFAULT_STORE_TIMEOUT;

/// Both operations are idempotent and never fail: an unreachable store,
/// an empty profession or a store error all report nothing removed.
pub struct InvalidationManager {
    store: Arc<dyn CacheStore>,
    store_timeout: Duration,
}

impl InvalidationManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    // == Clear Entry ==
    /// Deletes the single key for `(profession, time_period)`; returns
    /// whether it existed.
    pub async fn clear_entry(&self, profession: &str, time_period: TimePeriod) -> bool {
        if !self.store.is_available() {
            warn!("Cannot clear {} ({}): store unavailable", profession, time_period);
            return false;
        }

        let key = match build_key(profession, time_period) {
            Ok(key) => key,
            Err(e) => {
                warn!("Cannot clear entry: {}", e);
                return false;
            }
        };

        match bounded(self.store_timeout, "delete", self.store.delete(key.as_str())).await {
            Ok(removed) => {
                if removed {
                    info!("Cleared cached newsletter {}", key);
                }
                removed
            }
            Err(e) => {
                warn!("Cache clear error for {}: {}", key, e);
                false
            }
        }
    }

    // == Clear Profession ==
    /// Deletes every period's entry for `profession`; returns how many
    /// were removed.
    pub async fn clear_profession(&self, profession: &str) -> usize {
        if !self.store.is_available() {
            warn!("Cannot clear {}: store unavailable", profession);
            return 0;
        }

        let pattern = match KeyPattern::profession(profession) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Cannot clear profession: {}", e);
                return 0;
            }
        };

        match bounded(
            self.store_timeout,
            "delete_matching",
            self.store.delete_matching(&pattern),
        )
        .await
        {
            Ok(removed) => {
                if removed > 0 {
                    info!("Cleared {} cached newsletters for {}", removed, profession);
                }
                removed
            }
            Err(e) => {
                warn!("Cache clear error for {}: {}", pattern, e);
                0
            }
        }
    }
}
