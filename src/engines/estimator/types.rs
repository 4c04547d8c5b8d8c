use super::super::pricing::Confidence;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdownItem {
    pub resource_id: String,
    pub monthly_cost: Decimal,
    pub notes: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostResult {
    pub estimated_monthly_cost: Decimal,
    pub estimated_first_week_cost: Decimal,
    pub breakdown: Vec<CostBreakdownItem>,
    pub pricing_confidence: Confidence,
    pub resource_count: usize,
    pub risk_flags: Vec<String>,
    pub recommendations: Vec<String>,
}
