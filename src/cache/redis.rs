//! Redis Store Module
//!
//! Networked [`CacheStore`] backed by a `fred` connection pool. Expiry is
//! enforced server-side with `SET .. EX`.

use std::time::Duration;

use async_trait::async_trait;
use fred::clients::Pool;
use fred::interfaces::ServerInterface;
use fred::prelude::*;
use fred::types::scan::ScanType;
use fred::types::{Builder, Expiration};
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, KeyPattern, ServerInfo};
use crate::error::{CacheError, Result};

/// Keys requested per SCAN page
const SCAN_PAGE_SIZE: u32 = 250;

// == Redis Store ==
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    // == Connect ==
    /// Connects a pool of `pool_size` clients to `url`.
    ///
    /// `timeout` bounds both connection setup and each command.
    pub async fn connect(url: &str, pool_size: usize, timeout: Duration) -> Result<Self> {
        let config = Config::from_url(url).map_err(|e| CacheError::Config(e.to_string()))?;

        let pool = Builder::from_config(config)
            .with_connection_config(|cfg| {
                cfg.connection_timeout = timeout;
                cfg.internal_command_timeout = timeout;
                cfg.max_command_attempts = 1;
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 5_000, 2))
            .build_pool(pool_size.max(1))
            .map_err(|e| CacheError::Config(e.to_string()))?;

        pool.init()
            .await
            .map_err(|e| CacheError::StoreUnavailable(e.to_string()))?;

        info!("Connected to Redis with {} clients", pool_size.max(1));
        Ok(Self { pool })
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) -> Result<()> {
        self.pool
            .quit()
            .await
            .map_err(|e| CacheError::StoreUnavailable(e.to_string()))
    }

    fn map_expiration(ttl: Duration) -> Expiration {
        if ttl < Duration::from_secs(1) {
            Expiration::PX(ttl.as_millis().max(1) as i64)
        } else {
            Expiration::EX(ttl.as_secs() as i64)
        }
    }

    fn unavailable(e: Error) -> CacheError {
        CacheError::StoreUnavailable(e.to_string())
    }

    // == Scan Keys ==
    /// Walks the keyspace with SCAN and keeps the keys `pattern` matches.
    async fn scan_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        let glob = pattern.to_glob();
        let mut cursor = "0".to_string();
        let mut matched = Vec::new();

        loop {
            let (next_cursor, keys): (String, Vec<String>) = self
                .pool
                .scan_page::<(String, Vec<String>), String, String>(
                    cursor,
                    glob.clone(),
                    Some(SCAN_PAGE_SIZE),
                    None::<ScanType>,
                )
                .await
                .map_err(Self::unavailable)?;

            matched.extend(filter_page(pattern, keys));

            if next_cursor == "0" {
                break;
            }
            cursor = next_cursor;
        }

        matched.sort();
        matched.dedup();
        Ok(matched)
    }

    /// Memory and uptime from `INFO`; omitted when the call fails.
    async fn server_info(&self) -> ServerInfo {
        match self.pool.next().info::<String>(None).await {
            Ok(reply) => ServerInfo::parse(&reply),
            Err(e) => {
                debug!("Redis INFO unavailable: {}", e);
                ServerInfo::default()
            }
        }
    }
}

/// Keeps the keys of one SCAN page that `pattern` really matches.
///
/// The glob sent to the server over-matches (`newsletter_data_*` also
/// returns `newsletter_data_science_week`), so every key is rechecked.
fn filter_page(pattern: &KeyPattern, keys: Vec<String>) -> Vec<String> {
    keys.into_iter().filter(|key| pattern.matches(key)).collect()
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    fn is_available(&self) -> bool {
        self.pool.clients().iter().any(|client| client.is_connected())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.pool
            .get::<Option<String>, _>(key)
            .await
            .map_err(Self::unavailable)
    }

    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>> {
        // -2: missing, -1: no expiry
        let secs: i64 = self.pool.ttl(key).await.map_err(Self::unavailable)?;
        Ok((secs >= 0).then(|| Duration::from_secs(secs as u64)))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.pool
            .set::<(), _, _>(key, value, Some(Self::map_expiration(ttl)), None, false)
            .await
            .map_err(|e| CacheError::StoreWriteFailed(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .pool
            .del::<i64, _>(key)
            .await
            .map_err(Self::unavailable)?;
        Ok(removed > 0)
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<usize> {
        let keys = self.scan_keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        debug!("Deleting {} keys matching {}", keys.len(), pattern);
        let removed = self
            .pool
            .del::<i64, _>(keys)
            .await
            .map_err(Self::unavailable)?;
        Ok(removed.max(0) as usize)
    }

    async fn list_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        self.scan_keys(pattern).await
    }

    async fn stats(&self) -> Result<CacheStats> {
        let connected = self.is_available();
        if !connected {
            return Ok(CacheStats::new(self.backend(), false, 0));
        }
        let count = self.scan_keys(&KeyPattern::all()).await?.len();
        let info = self.server_info().await;
        Ok(CacheStats::new(self.backend(), connected, count).with_server_info(info))
    }
}
