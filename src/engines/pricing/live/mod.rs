// Live pricing adapters (C4) — one per supported provider, all behind the
// same [`PriceAdapter`] trait object so the factory can dispatch without
// knowing which provider it is talking to.

pub mod aws;
pub mod azure;
pub mod gcp;

use super::types::{PriceRecord, PricingError};
use crate::engines::crm::CanonicalResource;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait PriceAdapter: Send + Sync {
    async fn price(&self, resource: &CanonicalResource) -> Result<PriceRecord, PricingError>;

    /// `true` if this adapter is the right one to ask for `resource`'s
    /// provider. Does not consider whether live pricing is enabled at
    /// all — that is the factory's job.
    fn handles(&self, resource: &CanonicalResource) -> bool;
}

const RETRY_ATTEMPTS: u32 = 2;
const BASE_DELAY_MS: u64 = 100;
const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded exponential backoff with full jitter, matching the
/// specification's `100ms × 2ⁿ` schedule. Each attempt runs under a 5s
/// deadline; exhausting all attempts surfaces the last error.
pub async fn with_retries<F, Fut>(mut attempt: F) -> Result<PriceRecord, PricingError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<PriceRecord, PricingError>>,
{
    let mut last_err = PricingError::Timeout;
    for n in 0..=RETRY_ATTEMPTS {
        let call = tokio::time::timeout(PER_ATTEMPT_TIMEOUT, attempt());
        match call.await {
            Ok(Ok(record)) => return Ok(record),
            Ok(Err(e)) => last_err = e,
            Err(_) => last_err = PricingError::Timeout,
        }
        if n < RETRY_ATTEMPTS {
            let backoff_ms = BASE_DELAY_MS * 2u64.pow(n);
            let jittered = jitter(backoff_ms);
            tokio::time::sleep(Duration::from_millis(jittered)).await;
        }
    }
    Err(last_err)
}

/// Full jitter: a uniformly random delay in `[0, backoff_ms]`. Avoids
/// `rand` as a dependency by deriving randomness from the current time's
/// sub-millisecond jitter, which is adequate for spreading out retries
/// and does not need to be cryptographically random.
fn jitter(backoff_ms: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    if backoff_ms == 0 {
        0
    } else {
        nanos % (backoff_ms + 1)
    }
}
