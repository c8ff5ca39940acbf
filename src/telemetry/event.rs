//! Cache Operation Events
//!
//! Builds `cache_operation` telemetry records in the newsletter event schema.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// Schema version of the cache key layout
pub const CACHE_KEY_VERSION: &str = "v1";

// == Miss Reason ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Key absent or expired
    NotFound,
    /// Lookup skipped or failed because the store was unreachable
    StoreUnavailable,
}

// == Cache Operation Event ==
/// One hit or miss, as shipped to a telemetry sink.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheOperationEvent {
    pub event_id: String,
    pub event_ts: String,
    pub event_type: &'static str,
    pub session_id: String,
    pub app_version: String,
    pub env: String,
    pub region: String,
    pub query_fingerprint: String,
    pub cache_hit: bool,
    pub cache_key_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_item_age_s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_remaining_s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_assigned_s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss_reason: Option<MissReason>,
}

// == Event Builder ==
/// Stamps events with the deployment metadata they share.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    app_version: String,
    env: String,
    region: String,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), "dev", "us-east-1")
    }
}

impl EventBuilder {
    pub fn new(
        app_version: impl Into<String>,
        env: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            app_version: app_version.into(),
            env: env.into(),
            region: region.into(),
        }
    }

    fn base(&self, session_id: &str, fingerprint: &str, cache_hit: bool) -> CacheOperationEvent {
        CacheOperationEvent {
            event_id: Uuid::new_v4().to_string(),
            event_ts: chrono::Utc::now().to_rfc3339(),
            event_type: "cache_operation",
            session_id: session_id.to_string(),
            app_version: self.app_version.clone(),
            env: self.env.clone(),
            region: self.region.clone(),
            query_fingerprint: fingerprint.to_string(),
            cache_hit,
            cache_key_version: CACHE_KEY_VERSION,
            cache_item_age_s: None,
            ttl_remaining_s: None,
            ttl_assigned_s: None,
            miss_reason: None,
        }
    }

    /// Event for a served cache entry.
    pub fn cache_hit(
        &self,
        session_id: &str,
        fingerprint: &str,
        age: Option<Duration>,
        ttl_remaining: Option<Duration>,
    ) -> CacheOperationEvent {
        CacheOperationEvent {
            cache_item_age_s: age.map(|d| d.as_secs()),
            ttl_remaining_s: ttl_remaining.map(|d| d.as_secs()),
            ..self.base(session_id, fingerprint, true)
        }
    }

    /// Event for a lookup that fell through to generation.
    pub fn cache_miss(
        &self,
        session_id: &str,
        fingerprint: &str,
        ttl_assigned: Option<Duration>,
        reason: MissReason,
    ) -> CacheOperationEvent {
        CacheOperationEvent {
            ttl_assigned_s: ttl_assigned.map(|d| d.as_secs()),
            miss_reason: Some(reason),
            ..self.base(session_id, fingerprint, false)
        }
    }
}
