// Pricing factory (C5) — the process-wide resolver. Constructed once from
// `CoreConfig` and then passed explicitly to every `estimate` call; no
// ambient mutable state, per the specification's design note.

use super::catalog;
use super::live::aws::AwsLiveAdapter;
use super::live::azure::AzureLiveAdapter;
use super::live::gcp::GcpLiveAdapter;
use super::live::PriceAdapter;
use super::types::PriceRecord;
use crate::config::CoreConfig;
use crate::engines::crm::CanonicalResource;
use crate::errors::{FinOpsError, Result};
use futures::stream::{self, StreamExt};

pub struct PricingFactory {
    adapters: Vec<Box<dyn PriceAdapter>>,
    fallback_to_static: bool,
    concurrency_limit: usize,
}

impl PricingFactory {
    pub fn new(config: &CoreConfig) -> Self {
        let mut adapters: Vec<Box<dyn PriceAdapter>> = Vec::new();
        if config.live_pricing_enabled {
            adapters.push(Box::new(AwsLiveAdapter::new(config.aws_pricing_enabled)));
            adapters.push(Box::new(GcpLiveAdapter::new(
                config.gcp_pricing_enabled,
                config.gcp_pricing_api_key.clone(),
            )));
            adapters.push(Box::new(AzureLiveAdapter::new(config.azure_pricing_enabled)));
        }
        Self {
            adapters,
            fallback_to_static: config.pricing_fallback_to_static,
            concurrency_limit: config.pricing_concurrency_limit,
        }
    }

    /// Resolves one resource's price. Total in the common case — an
    /// unpriceable resource or a disabled/failed live attempt with
    /// fallback enabled still returns a `PriceRecord`, just at lower
    /// confidence. Only returns `Err(PricingUnavailable)` when
    /// `require_live` is set by the caller, live pricing genuinely
    /// applies to this resource, and it fails with fallback disabled —
    /// the one case the specification's error model reserves for this
    /// variant.
    pub async fn price_for(
        &self,
        resource: &CanonicalResource,
        require_live: bool,
    ) -> Result<PriceRecord> {
        if resource.is_unpriced_placeholder() {
            return Ok(PriceRecord::unknown(resource.region.clone()));
        }

        let adapter = self.adapters.iter().find(|a| a.handles(resource));
        let Some(adapter) = adapter else {
            return Ok(catalog::lookup(resource));
        };

        match adapter.price(resource).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if self.fallback_to_static {
                    Ok(catalog::lookup(resource))
                } else if require_live {
                    Err(FinOpsError::PricingUnavailable(format!(
                        "live pricing failed for {}: {e}",
                        resource.id
                    )))
                } else {
                    Ok(catalog::lookup(resource))
                }
            }
        }
    }

    /// Prices every resource in `resources`, fanned out with a bounded
    /// concurrency limit to respect provider rate limits.
    pub async fn price_all(
        &self,
        resources: &[CanonicalResource],
        require_live: bool,
    ) -> Result<Vec<(String, PriceRecord)>> {
        let results: Vec<Result<(String, PriceRecord)>> = stream::iter(resources)
            .map(|resource| async move {
                let price = self.price_for(resource, require_live).await?;
                Ok((resource.id.clone(), price))
            })
            .buffer_unordered(self.concurrency_limit.max(1))
            .collect()
            .await;

        results.into_iter().collect()
    }
}
