use crate::engines::estimator::CostResult;
use crate::engines::policy::PolicyEvaluation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedResult {
    pub cost: CostResult,
    pub policy_eval: Vec<PolicyEvaluation>,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub cache_key: String,
    pub cache_type: String,
    pub value: CachedResult,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
    pub last_accessed: DateTime<Utc>,
}
