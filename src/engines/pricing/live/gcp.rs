use super::{with_retries, PriceAdapter};
use crate::engines::crm::CanonicalResource;
use crate::engines::pricing::catalog::provider_of;
use crate::engines::pricing::types::{Confidence, PriceRecord, PriceSource, PriceUnit, PricingError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

static REGION_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("us-central1", "Iowa"),
        ("us-east1", "South Carolina"),
        ("europe-west1", "Belgium"),
    ])
});

fn region_name(code: &str) -> &str {
    REGION_NAMES.get(code).copied().unwrap_or(code)
}

#[derive(Debug, Deserialize)]
struct GcpPriceResponse {
    nanos: i64,
    units: i64,
    unit: String,
}

/// Requires both `GCP_PRICING_ENABLED=true` and a non-empty API key — the
/// Cloud Billing Catalog API is authenticated, unlike AWS's and Azure's.
pub struct GcpLiveAdapter {
    client: reqwest::Client,
    enabled: bool,
    api_key: Option<String>,
    endpoint: String,
}

impl GcpLiveAdapter {
    pub fn new(enabled: bool, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            enabled: enabled && api_key.as_deref().is_some_and(|k| !k.is_empty()),
            api_key,
            endpoint: std::env::var("GCP_PRICING_API_ENDPOINT").unwrap_or_else(|_| {
                "https://cloudbilling.googleapis.com/v1/services/compute/skus".to_string()
            }),
        }
    }
}

#[async_trait]
impl PriceAdapter for GcpLiveAdapter {
    fn handles(&self, resource: &CanonicalResource) -> bool {
        self.enabled && provider_of(&resource.resource_type) == "gcp"
    }

    async fn price(&self, resource: &CanonicalResource) -> Result<PriceRecord, PricingError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(PricingError::Disabled);
        };
        let client = &self.client;
        let endpoint = &self.endpoint;
        let region = region_name(&resource.region).to_string();
        let sku = format!("{}/{}", resource.resource_type, resource.size);

        with_retries(|| {
            let client = client.clone();
            let endpoint = endpoint.clone();
            let region = region.clone();
            let sku = sku.clone();
            let api_key = api_key.clone();
            async move {
                let response = client
                    .get(format!("{endpoint}?sku={sku}&region={region}&key={api_key}"))
                    .send()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(PricingError::UnknownSku);
                }

                let parsed: GcpPriceResponse = response
                    .json()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                let amount = Decimal::from(parsed.units)
                    + Decimal::from(parsed.nanos) / Decimal::from(1_000_000_000i64);

                Ok(PriceRecord {
                    unit: match parsed.unit.as_str() {
                        "h" => PriceUnit::Hour,
                        "mo" => PriceUnit::Month,
                        _ => PriceUnit::Other,
                    },
                    amount,
                    currency: "USD".to_string(),
                    confidence: Confidence::High,
                    source: PriceSource::Live,
                    sku: sku.clone(),
                    region: resource.region.clone(),
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_an_api_key_even_if_flag_is_set() {
        let adapter = GcpLiveAdapter::new(true, None);
        assert!(!adapter.enabled);
    }

    #[test]
    fn enabled_with_flag_and_key() {
        let adapter = GcpLiveAdapter::new(true, Some("k".to_string()));
        assert!(adapter.enabled);
    }
}
