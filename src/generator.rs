//! Generator Module
//!
//! The collaborator that produces fresh newsletter text on a cache miss.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::TimePeriod;
use crate::error::{CacheError, Result};

// == Generator Trait ==
/// Produces a newsletter for a profession and period.
///
/// Implementations must not cache; the gateway owns that decision.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, profession: &str, time_period: TimePeriod) -> Result<String>;
}

// == Wire Types ==
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    profession: &'a str,
    time_period: TimePeriod,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    newsletter: String,
}

// == HTTP Generator ==
/// Delegates generation to an external pipeline over HTTP.
///
/// Sends `POST {endpoint}` with `{"profession", "time_period"}` and reads
/// `{"newsletter": ...}` back. Deadlines are applied by the gateway.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, profession: &str, time_period: TimePeriod) -> Result<String> {
        debug!("Requesting newsletter for {} ({}) from {}", profession, time_period, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                profession,
                time_period,
            })
            .send()
            .await
            .map_err(|e| CacheError::GenerationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::GenerationFailed(format!(
                "generator returned HTTP {}",
                status
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CacheError::GenerationFailed(e.to_string()))?;
        Ok(body.newsletter)
    }
}

// == Unconfigured Generator ==
/// Fails every call; used when no generator endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _profession: &str, _time_period: TimePeriod) -> Result<String> {
        Err(CacheError::GenerationFailed(
            "no generator configured (set GENERATOR_URL)".to_string(),
        ))
    }
}
