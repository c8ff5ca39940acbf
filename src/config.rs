//! Configuration Module
//!
//! Loads service configuration from an ordered list of sources. Each source
//! either yields a value for a key or declines; a key no source knows is
//! reported as [`Setting::Unconfigured`] rather than silently defaulted.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::cache::TtlPolicy;
use crate::error::{CacheError, Result};

// == Config Sources ==
/// Outcome of asking one source for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    Declined,
}

/// A provider of raw configuration values.
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &str;
    fn lookup(&self, key: &str) -> Lookup;
}

/// Process environment. Empty values decline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn lookup(&self, key: &str) -> Lookup {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Lookup::Found(value),
            _ => Lookup::Declined,
        }
    }
}

/// Fixed key-value pairs, e.g. a parsed `.env` file or test fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    values: HashMap<String, String>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Reads a dotenv file; a missing or unreadable file yields an empty source.
    pub fn from_dotenv(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut source = Self::new(path.display().to_string());

        match dotenvy::from_path_iter(path) {
            Ok(iter) => {
                for (key, value) in iter.flatten() {
                    source.values.insert(key, value);
                }
            }
            Err(e) => debug!("No dotenv file loaded from {}: {}", path.display(), e),
        }
        source
    }
}

impl ConfigSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Lookup {
        match self.values.get(key) {
            Some(value) if !value.trim().is_empty() => Lookup::Found(value.clone()),
            _ => Lookup::Declined,
        }
    }
}

// == Config Chain ==
/// Result of resolving a key across the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Found { value: String, source: String },
    Unconfigured,
}

impl Setting {
    pub fn value(&self) -> Option<&str> {
        match self {
            Setting::Found { value, .. } => Some(value),
            Setting::Unconfigured => None,
        }
    }
}

/// Sources tried in order; the first one that answers wins.
#[derive(Default)]
pub struct ConfigChain {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Process environment first, then `./.env`.
    pub fn standard() -> Self {
        Self::new()
            .with_source(EnvSource)
            .with_source(StaticSource::from_dotenv(".env"))
    }

    pub fn resolve(&self, key: &str) -> Setting {
        for source in &self.sources {
            if let Lookup::Found(value) = source.lookup(key) {
                return Setting::Found {
                    value,
                    source: source.name().to_string(),
                };
            }
        }
        Setting::Unconfigured
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.resolve(key) {
            Setting::Found { value, source } => value.trim().parse().map(Some).map_err(|_| {
                CacheError::Config(format!("{} from {} is not valid: '{}'", key, source, value))
            }),
            Setting::Unconfigured => Ok(None),
        }
    }

    /// Durations and other counts where zero would disable the feature.
    fn parse_nonzero(&self, key: &str) -> Result<Option<u64>> {
        match self.parse::<u64>(key)? {
            Some(0) => {
                let source = match self.resolve(key) {
                    Setting::Found { source, .. } => source,
                    Setting::Unconfigured => String::new(),
                };
                Err(CacheError::Config(format!(
                    "{} from {} must be greater than zero",
                    key, source
                )))
            }
            other => Ok(other),
        }
    }

    fn parse_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.resolve(key) {
            Setting::Found { value, source } => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(CacheError::Config(format!(
                    "{} from {} is not a boolean: '{}'",
                    key, source, value
                ))),
            },
            Setting::Unconfigured => Ok(None),
        }
    }
}

// == Store Backend ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
    Disabled,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store selected for the cache
    pub backend: StoreBackend,
    /// Redis connection string
    pub redis_url: Option<String>,
    /// Connections in the Redis pool
    pub redis_pool_size: usize,
    /// Capacity of the in-memory backend
    pub max_entries: usize,
    /// Expiry sweep interval of the in-memory backend, in seconds
    pub cleanup_interval: u64,
    /// Deadline for each store operation
    pub store_timeout: Duration,
    /// Endpoint of the newsletter generator
    pub generator_url: Option<String>,
    /// Deadline for one generator call
    pub generator_timeout: Duration,
    /// Per-period expiration
    pub ttl: TtlPolicy,
    /// HTTP server port
    pub server_port: u16,
    pub telemetry_enabled: bool,
    pub telemetry_dir: PathBuf,
    pub app_env: String,
    pub app_version: String,
    pub aws_region: String,
}

impl Config {
    /// Loads configuration from the process environment and `./.env`.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Master switch for caching (default: true)
    /// - `CACHE_BACKEND` - `redis`, `memory` or `none` (default: `redis` when
    ///   `REDIS_URL` is set, otherwise `none`)
    /// - `REDIS_URL` - Redis connection string
    /// - `REDIS_POOL_SIZE` - Redis connections (default: 4)
    /// - `MAX_ENTRIES` - In-memory capacity (default: 1000)
    /// - `CLEANUP_INTERVAL` - In-memory sweep frequency in seconds (default: 60)
    /// - `STORE_TIMEOUT_MS` - Store operation deadline (default: 2000)
    /// - `GENERATOR_URL` - Generator endpoint
    /// - `GENERATOR_TIMEOUT_SECS` - Generator deadline (default: 120)
    /// - `TTL_DAY_SECS`, `TTL_WEEK_SECS`, `TTL_MONTH_SECS` - TTL overrides
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `TELEMETRY_ENABLED` - Write cache events (default: false)
    /// - `TELEMETRY_DIR` - Event directory (default: ./.telemetry)
    /// - `APP_ENV`, `APP_VERSION`, `AWS_REGION` - Event metadata
    pub fn from_env() -> Result<Self> {
        Self::from_chain(&ConfigChain::standard())
    }

    pub fn from_chain(chain: &ConfigChain) -> Result<Self> {
        let defaults = Self::default();

        let redis_url = chain.resolve("REDIS_URL").value().map(str::to_string);
        let cache_enabled = chain.parse_bool("CACHE_ENABLED")?.unwrap_or(true);

        let backend = if !cache_enabled {
            StoreBackend::Disabled
        } else {
            match chain.resolve("CACHE_BACKEND").value().map(str::to_ascii_lowercase) {
                Some(name) => match name.trim() {
                    "redis" if redis_url.is_some() => StoreBackend::Redis,
                    "redis" => {
                        return Err(CacheError::Config(
                            "CACHE_BACKEND=redis requires REDIS_URL".to_string(),
                        ))
                    }
                    "memory" => StoreBackend::Memory,
                    "none" | "disabled" => StoreBackend::Disabled,
                    other => {
                        return Err(CacheError::Config(format!(
                            "Unknown CACHE_BACKEND '{}'",
                            other
                        )))
                    }
                },
                None if redis_url.is_some() => StoreBackend::Redis,
                None => StoreBackend::Disabled,
            }
        };

        let secs = |key: &str| -> Result<Option<Duration>> {
            Ok(chain.parse_nonzero(key)?.map(Duration::from_secs))
        };

        Ok(Self {
            backend,
            redis_url,
            redis_pool_size: chain
                .parse("REDIS_POOL_SIZE")?
                .unwrap_or(defaults.redis_pool_size),
            max_entries: chain.parse("MAX_ENTRIES")?.unwrap_or(defaults.max_entries),
            cleanup_interval: chain
                .parse("CLEANUP_INTERVAL")?
                .unwrap_or(defaults.cleanup_interval),
            store_timeout: chain
                .parse_nonzero("STORE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            generator_url: chain.resolve("GENERATOR_URL").value().map(str::to_string),
            generator_timeout: secs("GENERATOR_TIMEOUT_SECS")?
                .unwrap_or(defaults.generator_timeout),
            ttl: TtlPolicy::with_overrides(
                secs("TTL_DAY_SECS")?,
                secs("TTL_WEEK_SECS")?,
                secs("TTL_MONTH_SECS")?,
            ),
            server_port: chain.parse("SERVER_PORT")?.unwrap_or(defaults.server_port),
            telemetry_enabled: chain
                .parse_bool("TELEMETRY_ENABLED")?
                .unwrap_or(defaults.telemetry_enabled),
            telemetry_dir: chain
                .resolve("TELEMETRY_DIR")
                .value()
                .map(PathBuf::from)
                .unwrap_or(defaults.telemetry_dir),
            app_env: chain
                .resolve("APP_ENV")
                .value()
                .map(str::to_string)
                .unwrap_or(defaults.app_env),
            app_version: chain
                .resolve("APP_VERSION")
                .value()
                .map(str::to_string)
                .unwrap_or(defaults.app_version),
            aws_region: chain
                .resolve("AWS_REGION")
                .value()
                .map(str::to_string)
                .unwrap_or(defaults.aws_region),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Disabled,
            redis_url: None,
            redis_pool_size: 4,
            max_entries: 1000,
            cleanup_interval: 60,
            store_timeout: Duration::from_millis(2000),
            generator_url: None,
            generator_timeout: Duration::from_secs(120),
            ttl: TtlPolicy::default(),
            server_port: 3000,
            telemetry_enabled: false,
            telemetry_dir: PathBuf::from("./.telemetry"),
            app_env: "dev".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            aws_region: "us-east-1".to_string(),
        }
    }
}
