// External interface types (§6): the shapes a thin outer HTTP/CLI layer
// sees. The core never opens a listener or authenticates anyone; these
// structs are just its in-process call/return contract.

use crate::engines::estimator::CostBreakdownItem;
use crate::engines::policy::{EvalMode, PolicyEvaluation};
use crate::engines::pricing::Confidence;
use crate::engines::store::AnalysisRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetRules {
    pub monthly_budget: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckRequest {
    pub iac_type: String,
    /// Base64 of UTF-8 IaC source text.
    pub iac_payload: String,
    pub environment: String,
    #[serde(default)]
    pub budget_rules: Option<BudgetRules>,
    #[serde(default)]
    pub policy_ids: Option<Vec<String>>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResponse {
    pub request_id: String,
    pub estimated_monthly_cost: Decimal,
    pub estimated_first_week_cost: Decimal,
    pub breakdown: Vec<CostBreakdownItem>,
    pub pricing_confidence: Confidence,
    pub resource_count: usize,
    pub risk_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub policy_eval: Vec<PolicyEvaluation>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluateRequest {
    pub iac_type: String,
    pub iac_payload: String,
    pub environment: String,
    #[serde(default)]
    pub budget_rules: Option<BudgetRules>,
    pub policy_id: String,
    #[serde(default)]
    pub mode: Option<EvalMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListQueryRequest {
    #[serde(default)]
    pub since: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub until: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponseBody {
    pub items: Vec<AnalysisRecord>,
    pub next_cursor: Option<String>,
}
