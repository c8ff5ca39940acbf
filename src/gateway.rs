//! Cache Gateway
//!
//! Decides hit vs. miss for a newsletter request, regenerates on a miss and
//! writes the result back with the period's TTL.
//!
//! The gateway never fails: every outcome is a [`NewsletterResult`] tagged
//! with where the content came from.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{bounded, build_key, normalize_profession, CacheKey, CacheStore, TimePeriod, TtlPolicy};
use crate::error::{CacheError, Result};
use crate::generator::Generator;
use crate::telemetry::{CacheOperationEvent, EventBuilder, MissReason, NullTelemetry, Telemetry};

/// Default deadline for a single store operation
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default deadline for a single generator call
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_secs(120);

// == Source ==
/// Provenance of a newsletter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Fresh,
    Error,
}

// == Newsletter Result ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterResult {
    /// Newsletter text, or a human-readable message when `source` is `Error`
    #[serde(rename = "newsletter")]
    pub content: String,
    pub source: Source,
    /// Normalized profession
    pub profession: String,
    pub time_period: TimePeriod,
    /// True when the content is in the store after this call
    pub cached: bool,
}

impl NewsletterResult {
    fn error(profession: String, time_period: TimePeriod, message: String) -> Self {
        Self {
            content: format!("Error generating newsletter: {}", message),
            source: Source::Error,
            profession,
            time_period,
            cached: false,
        }
    }
}

// == Cache Gateway ==
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    telemetry: Arc<dyn Telemetry>,
    events: EventBuilder,
    ttl: TtlPolicy,
    store_timeout: Duration,
    generator_timeout: Duration,
}

impl CacheGateway {
    /// Creates a gateway over `store` with the default TTL table, default
    /// deadlines and no telemetry.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            telemetry: Arc::new(NullTelemetry),
            events: EventBuilder::default(),
            ttl: TtlPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            generator_timeout: DEFAULT_GENERATOR_TIMEOUT,
        }
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeouts(mut self, store_timeout: Duration, generator_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self.generator_timeout = generator_timeout;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>, events: EventBuilder) -> Self {
        self.telemetry = telemetry;
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // == Fetch Or Generate ==
    /// Serves `(profession, time_period)` from the cache, or generates,
    /// stores and returns a fresh newsletter.
    ///
    /// Unknown periods are treated as `day`. A hit never resets the TTL.
    /// Generation is attempted once; its failure is reported as
    /// `Source::Error`. Store trouble only ever downgrades to a miss.
    pub async fn fetch_or_generate(
        &self,
        profession: &str,
        time_period: &str,
        generator: &dyn Generator,
    ) -> NewsletterResult {
        let period = TimePeriod::normalize(time_period);
        let (profession, key) = match normalize_profession(profession)
            .and_then(|p| build_key(&p, period).map(|key| (p, key)))
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Rejecting newsletter request: {}", e);
                return NewsletterResult::error(String::new(), period, e.to_string());
            }
        };

        let session_id = Uuid::new_v4().to_string();
        let fingerprint = key.fingerprint();

        let mut store_usable = self.store.is_available();
        if store_usable {
            match bounded(self.store_timeout, "get", self.store.get(key.as_str())).await {
                Ok(Some(content)) => {
                    info!("Cache HIT for {} ({})", profession, period);
                    self.record_hit(&session_id, &fingerprint, &key, period).await;
                    return NewsletterResult {
                        content,
                        source: Source::Cache,
                        profession,
                        time_period: period,
                        cached: true,
                    };
                }
                Ok(None) => info!("Cache MISS for {} ({})", profession, period),
                Err(e) => {
                    if e.is_unavailable() {
                        warn!("Cache unreachable for {}, continuing without cache: {}", key, e);
                    } else {
                        error!("Cache lookup failed for {}, continuing without cache: {}", key, e);
                    }
                    store_usable = false;
                }
            }
        } else {
            debug!("{} store unavailable, skipping lookup for {}", self.store.backend(), key);
        }

        let miss_reason = if store_usable {
            MissReason::NotFound
        } else {
            MissReason::StoreUnavailable
        };

        info!("Generating fresh newsletter for {} ({})", profession, period);
        let content = match self.generate(generator, &profession, period).await {
            Ok(content) => content,
            Err(e) => {
                error!("Error generating newsletter for {} ({}): {}", profession, period, e);
                self.emit(self.events.cache_miss(&session_id, &fingerprint, None, miss_reason));
                return NewsletterResult::error(profession, period, e.to_string());
            }
        };

        let ttl = self.ttl.ttl_for(period);
        let cached = store_usable && self.write_through(&key, &content, ttl).await;

        self.emit(self.events.cache_miss(
            &session_id,
            &fingerprint,
            cached.then_some(ttl),
            miss_reason,
        ));

        NewsletterResult {
            content,
            source: Source::Fresh,
            profession,
            time_period: period,
            cached,
        }
    }

    async fn generate(
        &self,
        generator: &dyn Generator,
        profession: &str,
        period: TimePeriod,
    ) -> Result<String> {
        match tokio::time::timeout(self.generator_timeout, generator.generate(profession, period)).await
        {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!(
                "generator exceeded {} s",
                self.generator_timeout.as_secs_f64()
            ))),
        }
    }

    /// Stores fresh content; failures are logged and reported as `false`.
    async fn write_through(&self, key: &CacheKey, content: &str, ttl: Duration) -> bool {
        match bounded(
            self.store_timeout,
            "set",
            self.store.set_with_ttl(key.as_str(), content, ttl),
        )
        .await
        {
            Ok(()) => {
                info!("Cached {} - expires in {} hours", key, ttl.as_secs() / 3600);
                true
            }
            Err(e) => {
                warn!("Cache write failed for {}, returning uncached content: {}", key, e);
                false
            }
        }
    }

    async fn record_hit(&self, session_id: &str, fingerprint: &str, key: &CacheKey, period: TimePeriod) {
        let remaining = bounded(
            self.store_timeout,
            "ttl",
            self.store.ttl_remaining(key.as_str()),
        )
        .await
        .unwrap_or_else(|e| {
            debug!("Could not read TTL for {}: {}", key, e);
            None
        });
        let age = estimate_age(self.ttl.ttl_for(period), remaining);

        self.emit(self.events.cache_hit(session_id, fingerprint, age, remaining));
    }

    fn emit(&self, event: CacheOperationEvent) {
        if let Err(e) = self.telemetry.record(&event) {
            warn!("Dropping telemetry event {}: {}", event.event_id, e);
        }
    }
}

/// Entry age inferred from the TTL this gateway would assign.
///
/// Stores only report remaining lifetime, so the age is `assigned - remaining`.
/// That is exact for entries written under the current policy. An entry
/// written under a longer TTL (e.g. by a process with other overrides) has
/// more time left than we could have assigned and yields `None`; one
/// written under a shorter TTL reads older than it is.
fn estimate_age(assigned: Duration, remaining: Option<Duration>) -> Option<Duration> {
    remaining
        .filter(|left| *left <= assigned)
        .map(|left| assigned - left)
}
