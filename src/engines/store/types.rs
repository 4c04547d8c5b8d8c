use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Pass,
    Fail,
    #[serde(rename = "n/a")]
    NotApplicable,
}

/// One completed check, persisted exactly once per successful
/// `check_cost_impact` call and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub iac_type: String,
    pub environment: String,
    pub estimated_monthly_cost: f64,
    pub estimated_first_week_cost: f64,
    pub resource_count: i64,
    pub policy_status: Option<PolicyStatus>,
    pub policy_id: Option<String>,
    pub risk_flags: Vec<String>,
    pub recommendations_count: i64,
    /// Full `CostResult` + `PolicyEvaluation`, serialized. Must round-trip
    /// bit-for-bit through the store.
    pub result_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListResponse {
    pub items: Vec<AnalysisRecord>,
    pub next_cursor: Option<String>,
}
