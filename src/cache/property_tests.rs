//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key construction, TTL selection and the
//! in-memory store against arbitrary professions and operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{
    build_key, KeyPattern, MemoryCache, TimePeriod, TtlPolicy, DAY_TTL, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Professions as users type them, including underscores and spaces.
fn profession_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_ ]{0,24}".prop_map(|s| s)
}

fn period_strategy() -> impl Strategy<Value = TimePeriod> {
    prop_oneof![
        Just(TimePeriod::Day),
        Just(TimePeriod::Week),
        Just(TimePeriod::Month),
    ]
}

fn newsletter_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,]{0,256}".prop_map(|s| s)
}

/// Operations against a single store keyed by `(profession, period)`
#[derive(Debug, Clone)]
enum CacheOp {
    Set { profession: String, period: TimePeriod, value: String },
    Get { profession: String, period: TimePeriod },
    Delete { profession: String, period: TimePeriod },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (profession_strategy(), period_strategy(), newsletter_strategy()).prop_map(
            |(profession, period, value)| CacheOp::Set { profession, period, value }
        ),
        (profession_strategy(), period_strategy())
            .prop_map(|(profession, period)| CacheOp::Get { profession, period }),
        (profession_strategy(), period_strategy())
            .prop_map(|(profession, period)| CacheOp::Delete { profession, period }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Key construction is a pure function of the normalized inputs.
    #[test]
    fn prop_key_ignores_case_and_padding(
        profession in profession_strategy(),
        period in period_strategy()
    ) {
        let plain = build_key(&profession, period).unwrap();
        let shouted = build_key(&format!("  {}\t", profession.to_uppercase()), period).unwrap();

        prop_assert_eq!(&plain, &shouted);
        prop_assert_eq!(plain.fingerprint(), shouted.fingerprint());
        prop_assert!(plain.as_str().ends_with(period.as_str()));
    }

    // Distinct normalized pairs never share a key.
    #[test]
    fn prop_distinct_pairs_distinct_keys(
        pairs in prop::collection::vec((profession_strategy(), period_strategy()), 1..30)
    ) {
        let normalized: HashSet<(String, TimePeriod)> = pairs
            .iter()
            .map(|(p, t)| (p.trim().to_lowercase(), *t))
            .collect();
        let keys: HashSet<String> = normalized
            .iter()
            .map(|(p, t)| build_key(p, *t).unwrap().to_string())
            .collect();

        prop_assert_eq!(keys.len(), normalized.len());
    }

    // Unknown labels always fall back to the day TTL.
    #[test]
    fn prop_unknown_label_uses_day_ttl(label in "[a-z]{1,12}") {
        prop_assume!(!["day", "week", "month"].contains(&label.as_str()));

        prop_assert_eq!(TtlPolicy::default().ttl_for_label(&label), DAY_TTL);
        prop_assert_eq!(TimePeriod::normalize(&label), TimePeriod::Day);
    }

    // Hit and miss counters track every read.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { profession, period, value } => {
                    let key = build_key(&profession, period).unwrap();
                    cache.set(key.to_string(), value, TEST_TTL).unwrap();
                }
                CacheOp::Get { profession, period } => {
                    let key = build_key(&profession, period).unwrap();
                    match cache.get(key.as_str()) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Delete { profession, period } => {
                    let key = build_key(&profession, period).unwrap();
                    cache.delete(key.as_str());
                }
            }
        }

        let counters = cache.counters();
        prop_assert_eq!(counters.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(counters.misses, expected_misses, "Misses mismatch");
    }

    // A stored newsletter reads back unchanged until overwritten.
    #[test]
    fn prop_roundtrip_and_overwrite(
        profession in profession_strategy(),
        period in period_strategy(),
        first in newsletter_strategy(),
        second in newsletter_strategy()
    ) {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let key = build_key(&profession, period).unwrap().to_string();

        cache.set(key.clone(), first.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(cache.get(&key), Some(first));

        cache.set(key.clone(), second.clone(), TEST_TTL).unwrap();
        prop_assert_eq!(cache.get(&key), Some(second));
        prop_assert_eq!(cache.len(), 1);
    }

    // The entry count never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (profession_strategy(), period_strategy(), newsletter_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let mut cache = MemoryCache::new(max_entries);

        for (profession, period, value) in entries {
            let key = build_key(&profession, period).unwrap();
            cache.set(key.to_string(), value, TEST_TTL).unwrap();
            prop_assert!(
                cache.len() <= max_entries,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_entries
            );
        }
    }

    // Clearing a profession removes exactly its own periods.
    #[test]
    fn prop_profession_clear_is_scoped(
        professions in prop::collection::vec(profession_strategy(), 2..10)
    ) {
        let normalized: Vec<String> = professions
            .iter()
            .map(|p| p.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(normalized.len() >= 2);

        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        for profession in &normalized {
            for period in TimePeriod::ALL {
                let key = build_key(profession, period).unwrap();
                cache.set(key.to_string(), format!("{} {}", profession, period), TEST_TTL).unwrap();
            }
        }

        let target = &normalized[0];
        let removed = cache.delete_matching(&KeyPattern::profession(target).unwrap());
        prop_assert_eq!(removed, TimePeriod::ALL.len());

        for profession in normalized.iter().skip(1) {
            for period in TimePeriod::ALL {
                let key = build_key(profession, period).unwrap();
                prop_assert!(
                    cache.get(key.as_str()).is_some(),
                    "{} was removed while clearing {}",
                    key,
                    target
                );
            }
        }
        prop_assert_eq!(cache.len(), (normalized.len() - 1) * TimePeriod::ALL.len());
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Entries are unreadable once their TTL has elapsed.
    #[test]
    fn prop_ttl_expiration_behavior(
        profession in profession_strategy(),
        period in period_strategy(),
        value in newsletter_strategy()
    ) {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let key = build_key(&profession, period).unwrap().to_string();

        cache.set(key.clone(), value.clone(), Duration::from_millis(50)).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));

        std::thread::sleep(Duration::from_millis(80));

        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(cache.ttl_remaining(&key).is_none());
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error renders as JSON with a string "error" field.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::StoreUnavailable(error_msg.clone()),
            CacheError::StoreWriteFailed(error_msg.clone()),
            CacheError::Timeout(error_msg.clone()),
            CacheError::GenerationFailed(error_msg.clone()),
            CacheError::InvalidTimePeriod(error_msg.clone()),
            CacheError::InvalidProfession(error_msg.clone()),
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::Config(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async { to_bytes(response.into_body(), usize::MAX).await.unwrap() });
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}

// == Property Test for Concurrent Operation Correctness ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Concurrent gateway-style traffic through the shared store never
    // returns a value that was not written for that key.
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        use crate::cache::{CacheStore, MemoryStore};
        use std::sync::Arc;

        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = Arc::new(MemoryStore::new(TEST_MAX_ENTRIES));
            let mut handles = vec![];

            for op in operations {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Set { profession, period, value } => {
                            let key = build_key(&profession, period).unwrap();
                            let tagged = format!("{}|{}", key, value);
                            store.set_with_ttl(key.as_str(), &tagged, TEST_TTL).await.unwrap();
                            Ok::<_, String>(())
                        }
                        CacheOp::Get { profession, period } => {
                            let key = build_key(&profession, period).unwrap();
                            match store.get(key.as_str()).await.unwrap() {
                                Some(value) if !value.starts_with(&format!("{}|", key)) => {
                                    Err(format!("Key {} returned foreign value {}", key, value))
                                }
                                _ => Ok(()),
                            }
                        }
                        CacheOp::Delete { profession, period } => {
                            let key = build_key(&profession, period).unwrap();
                            store.delete(key.as_str()).await.unwrap();
                            Ok(())
                        }
                    }
                }));
            }

            for handle in handles {
                let result = handle.await.unwrap();
                prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
            }

            let stats = store.stats().await.unwrap();
            prop_assert!(stats.newsletter_count <= TEST_MAX_ENTRIES);
            if let Some(hit_rate) = stats.hit_rate {
                prop_assert!((0.0..=1.0).contains(&hit_rate), "Hit rate out of range: {}", hit_rate);
            }

            Ok(())
        })?;
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_validation() {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        assert!(cache.set(long_key, "value".to_string(), TEST_TTL).is_err());
    }

    #[test]
    fn test_value_size_validation() {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        assert!(cache.set("key".to_string(), large_value, TEST_TTL).is_err());
    }

    #[test]
    fn test_underscore_profession_is_not_cleared_by_its_prefix() {
        let mut cache = MemoryCache::new(TEST_MAX_ENTRIES);
        for profession in ["data", "data_day", "data_science"] {
            let key = build_key(profession, TimePeriod::Week).unwrap();
            cache.set(key.to_string(), profession.to_string(), TEST_TTL).unwrap();
        }

        let removed = cache.delete_matching(&KeyPattern::profession("data").unwrap());

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 2);
    }
}
