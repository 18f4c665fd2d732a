//! Caching layer for consensus results.
//!
//! In-memory, TTL-bounded cache keyed by the full evaluation identity:
//! question, roster, floor, and policy. The engine never consults it
//! (persistence is the caller's concern), but gateways that field repeated
//! questions can wrap their evaluations with it to avoid re-billing every
//! provider.

use moka::future::Cache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use auspex_core::{ConsensusPolicy, ConsensusResult, EvaluationQuestion};

use crate::config::RuntimeConfig;

/// Cache key for one evaluation identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    question_hash: u64,
    roster_hash: u64,
    floor_bits: u64,
    policy: ConsensusPolicy,
}

impl CacheKey {
    /// Build a key from the evaluation inputs.
    ///
    /// `providers` is the effective roster after subset filtering; two
    /// requests that dispatch to different subsets must not share a key.
    pub fn new(
        question: &EvaluationQuestion,
        config: &RuntimeConfig,
        providers: Option<&[String]>,
    ) -> Self {
        let mut q = DefaultHasher::new();
        question.question.hash(&mut q);
        question.option_a.hash(&mut q);
        question.option_b.hash(&mut q);

        let mut r = DefaultHasher::new();
        for spec in &config.providers {
            if providers.map_or(true, |f| f.contains(&spec.name)) {
                spec.name.hash(&mut r);
                spec.model.hash(&mut r);
            }
        }

        Self {
            question_hash: q.finish(),
            roster_hash: r.finish(),
            floor_bits: config.confidence_floor.to_bits(),
            policy: config.policy,
        }
    }
}

/// Consensus result cache using moka.
pub struct ConsensusCache {
    cache: Cache<CacheKey, ConsensusResult>,
}

impl ConsensusCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Get a cached result.
    pub async fn get(&self, key: &CacheKey) -> Option<ConsensusResult> {
        self.cache.get(key).await
    }

    /// Store a result.
    pub async fn insert(&self, key: CacheKey, result: ConsensusResult) {
        self.cache.insert(key, result).await;
    }

    /// Number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auspex_core::{reduce, ProviderVerdict};

    fn question(text: &str) -> EvaluationQuestion {
        EvaluationQuestion::new(text, "A", "B").unwrap()
    }

    fn result() -> ConsensusResult {
        let verdicts = vec![ProviderVerdict::new("p", true, false, 0.9, "r")];
        reduce(&verdicts, ConsensusPolicy::Majority).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ConsensusCache::new(16, Duration::from_secs(60));
        let config = RuntimeConfig::default();
        let key = CacheKey::new(&question("Q?"), &config, None);

        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), result()).await;
        let hit = cache.get(&key).await;
        assert!(hit.is_some_and(|r| r.option_a_true));
    }

    #[test]
    fn test_different_questions_have_different_keys() {
        let config = RuntimeConfig::default();
        let a = CacheKey::new(&question("Q1?"), &config, None);
        let b = CacheKey::new(&question("Q2?"), &config, None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_subset_filter_changes_the_key() {
        let config = RuntimeConfig::default();
        let q = question("Q?");

        let full = CacheKey::new(&q, &config, None);
        let subset = CacheKey::new(&q, &config, Some(&["openai".to_string()]));
        assert_ne!(full, subset);
    }

    #[test]
    fn test_policy_and_floor_change_the_key() {
        let q = question("Q?");
        let base = RuntimeConfig::default();

        let mut stricter = base.clone();
        stricter.confidence_floor = 0.9;
        assert_ne!(CacheKey::new(&q, &base, None), CacheKey::new(&q, &stricter, None));

        let mut fixed = base.clone();
        fixed.policy = ConsensusPolicy::AtLeast(2);
        assert_ne!(CacheKey::new(&q, &base, None), CacheKey::new(&q, &fixed, None));
    }
}
