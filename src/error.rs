//! Error types for the newsletter cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
///
/// None of these cross the gateway boundary as failures: the gateway folds
/// them into a tagged [`crate::gateway::NewsletterResult`].
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store is unreachable or caching is disabled
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Write-through after generation failed
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// A store or generator call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The generator raised or returned an error indicator
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Unrecognized time period label
    #[error("Invalid time period: {0}")]
    InvalidTimePeriod(String),

    /// Profession empty after trimming
    #[error("Invalid profession: {0}")]
    InvalidProfession(String),

    /// Key or value outside the store limits
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// True for failures that mean "the store cannot be used right now".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable(_) | CacheError::Timeout(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidTimePeriod(_)
            | CacheError::InvalidProfession(_)
            | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            CacheError::StoreWriteFailed(_) | CacheError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
