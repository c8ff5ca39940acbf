//! Time Period Module
//!
//! The three newsletter windows a cache entry can belong to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CacheError;

// == Time Period ==
/// Newsletter window; each variant is bound to a fixed TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl TimePeriod {
    /// All periods, in TTL order.
    pub const ALL: [TimePeriod; 3] = [TimePeriod::Day, TimePeriod::Week, TimePeriod::Month];

    /// Label used inside cache keys and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Day => "day",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
        }
    }

    // == Normalize ==
    /// Lenient parse: unknown or empty labels fall back to `Day`.
    pub fn normalize(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            warn!("Unknown time period '{}', defaulting to day", label);
            TimePeriod::Day
        })
    }
}

impl FromStr for TimePeriod {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(TimePeriod::Day),
            "week" => Ok(TimePeriod::Week),
            "month" => Ok(TimePeriod::Month),
            _ => Err(CacheError::InvalidTimePeriod(s.to_string())),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
