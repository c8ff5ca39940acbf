//! Cache Module
//!
//! Key construction, TTL policy and the interchangeable stores behind the
//! newsletter gateway.

mod disabled;
mod entry;
mod key;
mod lru;
mod memory;
mod period;
mod redis;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use disabled::DisabledStore;
pub use entry::CacheEntry;
pub use key::{build_key, normalize_profession, CacheKey, KeyPattern, KEY_NAMESPACE};
pub use lru::LruTracker;
pub use memory::{MemoryCache, MemoryStore};
pub use period::TimePeriod;
pub use redis::RedisStore;
pub use stats::{CacheStats, HitCounters, ServerInfo};
pub use store::{bounded, CacheStore};
pub use ttl::{TtlPolicy, DAY_TTL, MONTH_TTL, WEEK_TTL};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed newsletter size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
