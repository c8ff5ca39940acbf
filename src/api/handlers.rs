//! API Handlers
//!
//! HTTP request handlers for the newsletter service endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{normalize_profession, CacheStats, CacheStore, TimePeriod};
use crate::config::Config;
use crate::error::Result;
use crate::gateway::{CacheGateway, NewsletterResult};
use crate::generator::Generator;
use crate::invalidation::InvalidationManager;
use crate::models::{ClearEntryResponse, ClearProfessionResponse, HealthResponse, NewsletterQuery};
use crate::telemetry::{EventBuilder, Telemetry};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CacheGateway>,
    pub invalidation: Arc<InvalidationManager>,
    pub generator: Arc<dyn Generator>,
}

impl AppState {
    /// State with default TTLs, deadlines and no telemetry.
    pub fn new(store: Arc<dyn CacheStore>, generator: Arc<dyn Generator>) -> Self {
        Self {
            gateway: Arc::new(CacheGateway::new(store.clone())),
            invalidation: Arc::new(InvalidationManager::new(store)),
            generator,
        }
    }

    /// State wired from configuration; the store is connected by the caller.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CacheStore>,
        generator: Arc<dyn Generator>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        let events = EventBuilder::new(
            config.app_version.clone(),
            config.app_env.clone(),
            config.aws_region.clone(),
        );
        let gateway = CacheGateway::new(store.clone())
            .with_ttl_policy(config.ttl)
            .with_timeouts(config.store_timeout, config.generator_timeout)
            .with_telemetry(telemetry, events);
        let invalidation =
            InvalidationManager::new(store).with_store_timeout(config.store_timeout);

        Self {
            gateway: Arc::new(gateway),
            invalidation: Arc::new(invalidation),
            generator,
        }
    }
}

/// Handler for GET /newsletter/:profession?period=
///
/// Always 200; provenance is reported in the body's `source`.
pub async fn newsletter_handler(
    State(state): State<AppState>,
    Path(profession): Path<String>,
    Query(query): Query<NewsletterQuery>,
) -> Json<NewsletterResult> {
    let result = state
        .gateway
        .fetch_or_generate(&profession, query.period(), state.generator.as_ref())
        .await;
    Json(result)
}

/// Handler for DELETE /cache/:profession
pub async fn clear_profession_handler(
    State(state): State<AppState>,
    Path(profession): Path<String>,
) -> Json<ClearProfessionResponse> {
    let removed = state.invalidation.clear_profession(&profession).await;
    let profession = normalize_profession(&profession).unwrap_or_default();
    Json(ClearProfessionResponse::new(profession, removed))
}

/// Handler for DELETE /cache/:profession/:period
///
/// Unlike lookups, an unknown period is rejected here rather than mapped
/// to `day`, so a typo cannot clear the wrong entry.
pub async fn clear_entry_handler(
    State(state): State<AppState>,
    Path((profession, period)): Path<(String, String)>,
) -> Result<Json<ClearEntryResponse>> {
    let period: TimePeriod = period.parse()?;
    let removed = state.invalidation.clear_entry(&profession, period).await;
    let profession = normalize_profession(&profession).unwrap_or_default();
    Ok(Json(ClearEntryResponse::new(profession, period, removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    let stats = state.gateway.store().stats().await?;
    Ok(Json(stats))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.gateway.store();
    Json(HealthResponse::healthy(store.backend(), store.is_available()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DisabledStore, MemoryStore};
    use crate::gateway::Source;
    use crate::generator::UnconfiguredGenerator;
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, profession: &str, period: TimePeriod) -> Result<String> {
            Ok(format!("{} digest for {}", period, profession))
        }
    }

    fn memory_state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new(100)), Arc::new(EchoGenerator))
    }

    #[tokio::test]
    async fn test_newsletter_handler_miss_then_hit() {
        let state = memory_state();

        let query = NewsletterQuery {
            period: Some("week".to_string()),
        };
        let first = newsletter_handler(
            State(state.clone()),
            Path("Musician".to_string()),
            Query(query.clone()),
        )
        .await;
        assert_eq!(first.source, Source::Fresh);
        assert_eq!(first.content, "week digest for musician");

        let second =
            newsletter_handler(State(state), Path("musician".to_string()), Query(query)).await;
        assert_eq!(second.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_newsletter_handler_generation_error() {
        let state = AppState::new(
            Arc::new(MemoryStore::new(10)),
            Arc::new(UnconfiguredGenerator),
        );

        let result = newsletter_handler(
            State(state),
            Path("chef".to_string()),
            Query(NewsletterQuery::default()),
        )
        .await;
        assert_eq!(result.source, Source::Error);
        assert!(result.content.contains("GENERATOR_URL"));
    }

    #[tokio::test]
    async fn test_clear_handlers() {
        let state = memory_state();
        for period in ["day", "week"] {
            newsletter_handler(
                State(state.clone()),
                Path("chef".to_string()),
                Query(NewsletterQuery {
                    period: Some(period.to_string()),
                }),
            )
            .await;
        }

        let entry = clear_entry_handler(
            State(state.clone()),
            Path(("Chef".to_string(), "day".to_string())),
        )
        .await
        .unwrap();
        assert!(entry.removed);
        assert_eq!(entry.profession, "chef");

        let all = clear_profession_handler(State(state), Path("chef".to_string())).await;
        assert_eq!(all.removed, 1);
    }

    #[tokio::test]
    async fn test_clear_entry_rejects_unknown_period() {
        let result = clear_entry_handler(
            State(memory_state()),
            Path(("chef".to_string(), "year".to_string())),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_and_health_handlers() {
        let state = AppState::new(
            Arc::new(DisabledStore::new("off")),
            Arc::new(EchoGenerator),
        );

        let stats = stats_handler(State(state.clone())).await.unwrap();
        assert_eq!(stats.backend, "disabled");

        let health = health_handler(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert!(!health.cache_available);
    }
}
