// Pricing types (C3/C4/C5) — shared between the static catalog and the
// live adapters so the factory can treat both uniformly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceUnit {
    Hour,
    Month,
    #[serde(rename = "gb-month")]
    GbMonth,
    Request,
    Other,
}

impl PriceUnit {
    /// Factor that turns one unit of this price into a monthly cost, per
    /// the estimator's `normalize_to_month` contract. `GbMonth`/`Request`
    /// are already per-month-equivalent once multiplied by the resource's
    /// declared quantity, so their factor is 1 here; the estimator reads
    /// the actual GB/request count out of `metadata`.
    pub fn monthly_factor(self) -> Decimal {
        match self {
            PriceUnit::Hour => Decimal::from(730),
            PriceUnit::Month => Decimal::ONE,
            PriceUnit::GbMonth => Decimal::ONE,
            PriceUnit::Request => Decimal::ONE,
            PriceUnit::Other => Decimal::ONE,
        }
    }
}

/// Qualitative confidence label on a price, reflecting its provenance.
/// Ordered worst-to-best so `min()` over a result set is the aggregate
/// confidence the estimator reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn min_of(values: impl IntoIterator<Item = Confidence>) -> Option<Confidence> {
        values.into_iter().min()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Static,
}

/// A resolved unit price for one resource, from either a live adapter or
/// the static catalog. The factory normalizes both into this shape so the
/// estimator never needs to know where a price came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub unit: PriceUnit,
    pub amount: Decimal,
    pub currency: String,
    pub confidence: Confidence,
    pub source: PriceSource,
    pub sku: String,
    pub region: String,
}

impl PriceRecord {
    /// The `{amount:0, confidence:"low", source:"static", sku:"unknown"}`
    /// record the factory is contractually obliged to return for a
    /// resource nothing can price — the factory is a total function.
    pub fn unknown(region: impl Into<String>) -> Self {
        PriceRecord {
            unit: PriceUnit::Month,
            amount: Decimal::ZERO,
            currency: "USD".to_string(),
            confidence: Confidence::Low,
            source: PriceSource::Static,
            sku: "unknown".to_string(),
            region: region.into(),
        }
    }
}

/// Errors local to the pricing subsystem. Never surfaces to a
/// [`crate::errors::FinOpsError`] caller directly — the factory recovers
/// from every variant per the resolution order in the specification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("live pricing timed out")]
    Timeout,
    #[error("live pricing adapter rejected the request: {0}")]
    AdapterError(String),
    #[error("no sku found for this resource")]
    UnknownSku,
    #[error("live pricing disabled for this provider")]
    Disabled,
}
