//! Cache Statistics Module
//!
//! Counters kept by the in-memory backend and the backend-neutral snapshot
//! reported by every store.

use serde::Serialize;

// == Hit Counters ==
/// Hit, miss and eviction counters of the in-memory backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl HitCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Server Info ==
/// Fields lifted from a server's `INFO` reply; absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub used_memory_human: Option<String>,
    pub uptime_in_seconds: Option<u64>,
}

impl ServerInfo {
    /// Parses the `field:value` lines of an `INFO` reply.
    ///
    /// Section headers, blank lines and unknown fields are skipped.
    pub fn parse(reply: &str) -> Self {
        let mut info = Self::default();
        for line in reply.lines() {
            let Some((field, value)) = line.trim().split_once(':') else {
                continue;
            };
            match field {
                "used_memory_human" => info.used_memory_human = Some(value.to_string()),
                "uptime_in_seconds" => info.uptime_in_seconds = value.parse().ok(),
                _ => {}
            }
        }
        info
    }
}

// == Cache Stats ==
/// Snapshot of a store, served on `GET /stats`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    /// Backend name (`memory`, `redis`, `disabled`)
    pub backend: String,
    /// Whether the store is reachable right now
    pub connected: bool,
    /// Live keys in the newsletter namespace
    pub newsletter_count: usize,
    /// Only tracked by backends that count lookups themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evictions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate: Option<f64>,
    /// Server memory as reported by Redis `INFO` (e.g. `1.05M`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_memory_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_in_seconds: Option<u64>,
}

impl CacheStats {
    /// Snapshot for a backend without lookup counters.
    pub fn new(backend: impl Into<String>, connected: bool, newsletter_count: usize) -> Self {
        Self {
            backend: backend.into(),
            connected,
            newsletter_count,
            hits: None,
            misses: None,
            evictions: None,
            hit_rate: None,
            used_memory_human: None,
            uptime_in_seconds: None,
        }
    }

    /// Attaches server details reported by the backend.
    pub fn with_server_info(mut self, info: ServerInfo) -> Self {
        self.used_memory_human = info.used_memory_human;
        self.uptime_in_seconds = info.uptime_in_seconds;
        self
    }

    /// Attaches lookup counters and derives the hit rate.
    ///
    /// Hit rate is hits / (hits + misses), or 0.0 before any lookup.
    pub fn with_counters(mut self, counters: HitCounters) -> Self {
        let total = counters.hits + counters.misses;
        self.hits = Some(counters.hits);
        self.misses = Some(counters.misses);
        self.evictions = Some(counters.evictions);
        self.hit_rate = Some(if total == 0 {
            0.0
        } else {
            counters.hits as f64 / total as f64
        });
        self
    }
}
