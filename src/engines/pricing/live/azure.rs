use super::{with_retries, PriceAdapter};
use crate::engines::crm::CanonicalResource;
use crate::engines::pricing::catalog::provider_of;
use crate::engines::pricing::types::{Confidence, PriceRecord, PriceSource, PriceUnit, PricingError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct AzurePriceResponse {
    #[serde(rename = "retailPrice")]
    retail_price: f64,
    #[serde(rename = "unitOfMeasure")]
    unit_of_measure: String,
}

/// Azure's Retail Prices API is unauthenticated, so this adapter needs
/// only the global enable flag — no api key.
pub struct AzureLiveAdapter {
    client: reqwest::Client,
    enabled: bool,
    endpoint: String,
}

impl AzureLiveAdapter {
    pub fn new(enabled: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            enabled,
            endpoint: std::env::var("AZURE_PRICING_API_ENDPOINT")
                .unwrap_or_else(|_| "https://prices.azure.com/api/retail/prices".to_string()),
        }
    }
}

#[async_trait]
impl PriceAdapter for AzureLiveAdapter {
    fn handles(&self, resource: &CanonicalResource) -> bool {
        self.enabled && provider_of(&resource.resource_type) == "azure"
    }

    async fn price(&self, resource: &CanonicalResource) -> Result<PriceRecord, PricingError> {
        let client = &self.client;
        let endpoint = &self.endpoint;
        let region = resource.region.clone();
        let sku = format!("{}/{}", resource.resource_type, resource.size);

        with_retries(|| {
            let client = client.clone();
            let endpoint = endpoint.clone();
            let region = region.clone();
            let sku = sku.clone();
            async move {
                let response = client
                    .get(format!("{endpoint}?$filter=armRegionName eq '{region}'&sku={sku}"))
                    .send()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(PricingError::UnknownSku);
                }

                let parsed: AzurePriceResponse = response
                    .json()
                    .await
                    .map_err(|e| PricingError::AdapterError(e.to_string()))?;

                Ok(PriceRecord {
                    unit: match parsed.unit_of_measure.as_str() {
                        "1 Hour" => PriceUnit::Hour,
                        "1 Month" => PriceUnit::Month,
                        _ => PriceUnit::Other,
                    },
                    amount: Decimal::from_str(&parsed.retail_price.to_string())
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
