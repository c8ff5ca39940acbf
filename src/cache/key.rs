//! Key Builder Module
//!
//! Deterministic cache keys, telemetry fingerprints and profession-scoped
//! key patterns.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::cache::TimePeriod;
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Namespace every newsletter key starts with
pub const KEY_NAMESPACE: &str = "newsletter";

/// Separator between key segments
pub const KEY_SEPARATOR: char = '_';

/// Number of hex characters kept from the SHA-256 fingerprint
const FINGERPRINT_LEN: usize = 16;

// == Normalize Profession ==
/// Trims and lower-cases a profession, rejecting empty input.
pub fn normalize_profession(profession: &str) -> Result<String> {
    let normalized = profession.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CacheError::InvalidProfession(
            "Profession cannot be empty".to_string(),
        ));
    }
    Ok(normalized)
}

// == Build Key ==
/// Builds the cache key for a `(profession, time_period)` pair.
///
/// Produces `newsletter_{profession}_{period}` with the profession trimmed
/// and lower-cased, so `"Doctor"` and `" doctor"` share one key.
pub fn build_key(profession: &str, time_period: TimePeriod) -> Result<CacheKey> {
    let profession = normalize_profession(profession)?;
    Ok(CacheKey(format!(
        "{}{}{}{}{}",
        KEY_NAMESPACE,
        KEY_SEPARATOR,
        profession,
        KEY_SEPARATOR,
        time_period.as_str()
    )))
}

// == Cache Key ==
/// A fully built cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    // == Fingerprint ==
    /// Short stable hash of the key, safe to ship in telemetry.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        digest
            .iter()
            .take(FINGERPRINT_LEN / 2)
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Key Pattern ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternScope {
    Namespace,
    Profession,
}

/// A set of keys addressed by prefix, used for bulk listing and deletion.
///
/// Profession patterns only match keys whose remainder is exactly one
/// period label, so the pattern for `data` leaves `data_day`'s keys alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    prefix: String,
    scope: PatternScope,
}

impl KeyPattern {
    /// Every key in the newsletter namespace.
    pub fn all() -> Self {
        Self {
            prefix: format!("{}{}", KEY_NAMESPACE, KEY_SEPARATOR),
            scope: PatternScope::Namespace,
        }
    }

    /// Every period's key for one profession.
    pub fn profession(profession: &str) -> Result<Self> {
        let profession = normalize_profession(profession)?;
        Ok(Self {
            prefix: format!(
                "{}{}{}{}",
                KEY_NAMESPACE, KEY_SEPARATOR, profession, KEY_SEPARATOR
            ),
            scope: PatternScope::Profession,
        })
    }

    // == Matches ==
    /// Returns true if `key` belongs to this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match key.strip_prefix(&self.prefix) {
            None => false,
            Some(rest) => match self.scope {
                PatternScope::Namespace => true,
                PatternScope::Profession => {
                    TimePeriod::ALL.iter().any(|period| period.as_str() == rest)
                }
            },
        }
    }

    // == To Glob ==
    /// Redis-style glob for server-side scans. It may over-match; callers
    /// filter the scanned keys through [`KeyPattern::matches`].
    pub fn to_glob(&self) -> String {
        let mut glob = String::with_capacity(self.prefix.len() + 1);
        for ch in self.prefix.chars() {
            if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
                glob.push('\\');
            }
            glob.push(ch);
        }
        glob.push('*');
        glob
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*", self.prefix)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = build_key("Filmmaker", TimePeriod::Week).unwrap();
        assert_eq!(key.as_str(), "newsletter_filmmaker_week");
    }

    #[test]
    fn test_key_case_insensitive() {
        let a = build_key("Doctor", TimePeriod::Day).unwrap();
        let b = build_key("  doctor ", TimePeriod::Day).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinct_periods() {
        let day = build_key("nurse", TimePeriod::Day).unwrap();
        let month = build_key("nurse", TimePeriod::Month).unwrap();
        assert_ne!(day, month);
    }

    #[test]
    fn test_empty_profession_rejected() {
        assert!(matches!(
            build_key("   ", TimePeriod::Day),
            Err(CacheError::InvalidProfession(_))
        ));
    }

    #[test]
    fn test_fingerprint_stable_and_short() {
        let key = build_key("musician", TimePeriod::Day).unwrap();
        let fp = key.fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, build_key("MUSICIAN", TimePeriod::Day).unwrap().fingerprint());
        assert_ne!(fp, build_key("musician", TimePeriod::Week).unwrap().fingerprint());
    }

    #[test]
    fn test_profession_pattern_scoping() {
        let pattern = KeyPattern::profession("Data").unwrap();
        assert!(pattern.matches("newsletter_data_day"));
        assert!(pattern.matches("newsletter_data_month"));
        assert!(!pattern.matches("newsletter_data_day_week"));
        assert!(!pattern.matches("newsletter_database_day"));
        assert!(!pattern.matches("newsletter_other_day"));
    }

    #[test]
    fn test_namespace_pattern() {
        let pattern = KeyPattern::all();
        assert!(pattern.matches("newsletter_anything_day"));
        assert!(!pattern.matches("session_abc"));
        assert_eq!(pattern.to_glob(), "newsletter_*");
    }

    #[test]
    fn test_glob_escapes_metacharacters() {
        let pattern = KeyPattern::profession("c*o?").unwrap();
        assert_eq!(pattern.to_glob(), "newsletter_c\\*o\\?_*");
    }
}
