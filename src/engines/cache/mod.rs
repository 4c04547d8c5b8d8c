// Analysis Cache (C9): idempotency by request fingerprint, with the
// "at-most-one-builder" guarantee — concurrent requests for the same key
// perform exactly one computation; losers await the winner's result.

pub mod types;

pub use types::{CacheEntry, CachedResult};

use crate::errors::{FinOpsError, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const STRIPE_COUNT: usize = 16;

pub struct AnalysisCache {
    stripes: Vec<Mutex<HashMap<String, CacheEntry>>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<Option<Result<CachedResult>>>>>>,
    default_ttl: Duration,
}

impl AnalysisCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            stripes: (0..STRIPE_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            inflight: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    fn stripe_for(&self, key: &str) -> &Mutex<HashMap<String, CacheEntry>> {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        let index = digest[0] as usize % self.stripes.len();
        &self.stripes[index]
    }

    /// Key = SHA-256 over a canonical serialization of the request shape
    /// the specification names: `(iac_type, normalized_payload,
    /// environment, sorted(policy_ids), budget_rules)`.
    pub fn key_for(
        iac_type: &str,
        normalized_payload: &str,
        environment: &str,
        policy_ids: &[String],
        budget_rules: Option<f64>,
    ) -> String {
        let mut sorted_ids = policy_ids.to_vec();
        sorted_ids.sort();
        let canonical = serde_json::json!({
            "iac_type": iac_type,
            "payload": normalized_payload,
            "environment": environment,
            "policy_ids": sorted_ids,
            "budget_rules": budget_rules,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<CachedResult> {
        let mut stripe = self.stripe_for(key).lock().await;
        if let Some(entry) = stripe.get_mut(key) {
            if entry.expires_at > Utc::now() {
                entry.hit_count += 1;
                entry.last_accessed = Utc::now();
                return Some(entry.value.clone());
            }
            stripe.remove(key);
        }
        None
    }

    pub async fn put(&self, key: String, cache_type: &str, value: CachedResult, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = Utc::now();
        let entry = CacheEntry {
            cache_key: key.clone(),
            cache_type: cache_type.to_string(),
            value,
            created_at: now,
            expires_at: now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
            hit_count: 0,
            last_accessed: now,
        };
        let mut stripe = self.stripe_for(&key).lock().await;
        stripe.insert(key, entry);
    }

    /// Returns the cached value for `key` if present and unexpired;
    /// otherwise runs `compute` under the per-key single-flight
    /// coordinator and caches its result. Concurrent callers for the same
    /// key that arrive while a build is in flight await that build's
    /// result rather than launching their own.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        cache_type: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<CachedResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedResult>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let (slot, is_builder) = {
            let mut inflight = self.inflight.lock().await;
            if let Some(slot) = inflight.get(key) {
                (slot.clone(), false)
            } else {
                let slot = Arc::new(Mutex::new(None));
                inflight.insert(key.to_string(), slot.clone());
                (slot, true)
            }
        };

        if !is_builder {
            let guard = slot.lock().await;
            return match guard.clone() {
                Some(result) => result,
                None => Err(FinOpsError::internal(
                    "in-flight cache build disappeared without producing a result",
                )),
            };
        }

        let mut guard = slot.lock().await;
        let result = compute().await;
        *guard = Some(result.clone());
        if let Ok(value) = &result {
            self.put(key.to_string(), cache_type, value.clone(), ttl).await;
        }
        drop(guard);
        self.inflight.lock().await.remove(key);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::estimator::CostResult;
    use crate::engines::pricing::Confidence;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    fn sample() -> CachedResult {
        CachedResult {
            cost: CostResult {
                estimated_monthly_cost: Decimal::from(10),
                estimated_first_week_cost: Decimal::from(2),
                breakdown: Vec::new(),
                pricing_confidence: Confidence::Medium,
                resource_count: 1,
                risk_flags: Vec::new(),
                recommendations: Vec::new(),
            },
            policy_eval: Vec::new(),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = AnalysisCache::new(StdDuration::from_secs(60));
        cache.put("k".to_string(), "check", sample(), None).await;
        let got = cache.get("k").await;
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn concurrent_get_or_compute_runs_the_builder_exactly_once() {
        let cache = Arc::new(AnalysisCache::new(StdDuration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("shared-key", "check", None, || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(StdDuration::from_millis(20)).await;
                            Ok(sample())
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn key_for_is_order_independent_over_policy_ids() {
        let a = AnalysisCache::key_for(
            "terraform",
            "payload",
            "dev",
            &["b".to_string(), "a".to_string()],
            None,
        );
        let b = AnalysisCache::key_for(
            "terraform",
            "payload",
            "dev",
            &["a".to_string(), "b".to_string()],
            None,
        );
        assert_eq!(a, b);
    }
}
