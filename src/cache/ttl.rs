//! TTL Policy Module
//!
//! Maps a time period to how long its newsletter stays cached.

use std::time::Duration;

use crate::cache::TimePeriod;

// == Default TTL Table ==
/// Default TTL for `day` newsletters (8 hours)
pub const DAY_TTL: Duration = Duration::from_secs(8 * 3600);

/// Default TTL for `week` newsletters (48 hours)
pub const WEEK_TTL: Duration = Duration::from_secs(48 * 3600);

/// Default TTL for `month` newsletters (168 hours)
pub const MONTH_TTL: Duration = Duration::from_secs(168 * 3600);

// == TTL Policy ==
/// Per-period expiration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    day: Duration,
    week: Duration,
    month: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            day: DAY_TTL,
            week: WEEK_TTL,
            month: MONTH_TTL,
        }
    }
}

impl TtlPolicy {
    /// Creates the default table, replacing any period given an override.
    pub fn with_overrides(
        day: Option<Duration>,
        week: Option<Duration>,
        month: Option<Duration>,
    ) -> Self {
        let base = Self::default();
        Self {
            day: day.unwrap_or(base.day),
            week: week.unwrap_or(base.week),
            month: month.unwrap_or(base.month),
        }
    }

    /// Uses one duration for every period.
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            day: ttl,
            week: ttl,
            month: ttl,
        }
    }

    // == TTL For ==
    /// Returns the expiration duration for a period.
    pub fn ttl_for(&self, period: TimePeriod) -> Duration {
        match period {
            TimePeriod::Day => self.day,
            TimePeriod::Week => self.week,
            TimePeriod::Month => self.month,
        }
    }

    /// Same as [`TtlPolicy::ttl_for`] on a raw label; unknown labels get the
    /// `day` duration instead of failing the write.
    pub fn ttl_for_label(&self, label: &str) -> Duration {
        self.ttl_for(TimePeriod::normalize(label))
    }
}
