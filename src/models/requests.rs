//! Request DTOs for the newsletter API
//!
//! Query parameters accepted by the HTTP endpoints.

use serde::Deserialize;

/// Query string for `GET /newsletter/:profession`
///
/// `period` is passed through leniently: missing or unknown values are
/// served as `day`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsletterQuery {
    #[serde(default)]
    pub period: Option<String>,
}

impl NewsletterQuery {
    pub fn period(&self) -> &str {
        self.period.as_deref().unwrap_or("day")
    }
}
