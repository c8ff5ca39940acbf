//! Response DTOs for the newsletter API
//!
//! Bodies returned by the invalidation and health endpoints. Newsletter and
//! stats responses serialize [`crate::gateway::NewsletterResult`] and
//! [`crate::cache::CacheStats`] directly.

use serde::Serialize;

use crate::cache::TimePeriod;

/// Response body for `DELETE /cache/:profession`
#[derive(Debug, Clone, Serialize)]
pub struct ClearProfessionResponse {
    pub profession: String,
    /// Number of entries removed
    pub removed: usize,
}

impl ClearProfessionResponse {
    pub fn new(profession: impl Into<String>, removed: usize) -> Self {
        Self {
            profession: profession.into(),
            removed,
        }
    }
}

/// Response body for `DELETE /cache/:profession/:period`
#[derive(Debug, Clone, Serialize)]
pub struct ClearEntryResponse {
    pub profession: String,
    pub time_period: TimePeriod,
    /// Whether an entry existed and was removed
    pub removed: bool,
}

impl ClearEntryResponse {
    pub fn new(profession: impl Into<String>, time_period: TimePeriod, removed: bool) -> Self {
        Self {
            profession: profession.into(),
            time_period,
            removed,
        }
    }
}

/// Response body for the health endpoint (`GET /health`)
///
/// The service stays healthy without a cache; `cache_available` reports
/// whether lookups are currently being served from the store.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub cache_backend: String,
    pub cache_available: bool,
}

impl HealthResponse {
    pub fn healthy(cache_backend: impl Into<String>, cache_available: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache_backend: cache_backend.into(),
            cache_available,
        }
    }
}
