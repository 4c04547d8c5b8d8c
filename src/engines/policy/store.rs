// Policy registry (§5): copy-on-write. Writers swap a new snapshot
// atomically; readers clone the `Arc` and see a consistent view for the
// lifetime of their request, never blocking on a writer mid-evaluation.

use super::types::{OnViolation, Policy, PolicyExpression, Rule, RuleOperator};
use super::value::Value;
use crate::errors::{FinOpsError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::Arc;

pub struct PolicyStore {
    snapshot: RwLock<Arc<HashMap<String, Policy>>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Seeds the registry with the default policies asserted by the
    /// original implementation's policy endpoint tests:
    /// `default_monthly_budget`, `no_gpu_in_dev`, `no_large_instances_in_dev`.
    pub fn with_defaults() -> Self {
        let store = Self::new();
        for policy in default_policies() {
            store
                .create(policy)
                .expect("default policy ids are distinct");
        }
        store
    }

    fn current(&self) -> Arc<HashMap<String, Policy>> {
        self.snapshot.read().expect("policy store lock poisoned").clone()
    }

    pub fn get(&self, id: &str) -> Result<Policy> {
        self.current()
            .get(id)
            .cloned()
            .ok_or_else(|| FinOpsError::PolicyNotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<Policy> {
        let mut policies: Vec<Policy> = self.current().values().cloned().collect();
        policies.sort_by(|a, b| a.id.cmp(&b.id));
        policies
    }

    pub fn create(&self, policy: Policy) -> Result<()> {
        let mut guard = self.snapshot.write().expect("policy store lock poisoned");
        if guard.contains_key(&policy.id) {
            return Err(FinOpsError::PolicyExists(policy.id));
        }
        let mut next = (**guard).clone();
        next.insert(policy.id.clone(), policy);
        *guard = Arc::new(next);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut guard = self.snapshot.write().expect("policy store lock poisoned");
        if !guard.contains_key(id) {
            return Err(FinOpsError::PolicyNotFound(id.to_string()));
        }
        let mut next = (**guard).clone();
        next.remove(id);
        *guard = Arc::new(next);
        Ok(())
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_policies() -> Vec<Policy> {
    let now = Utc::now();

    let default_monthly_budget = Policy {
        id: "default_monthly_budget".to_string(),
        name: "Default monthly budget".to_string(),
        description: "Flags deployments forecast to exceed $1000/month".to_string(),
        budget: Some(1000.0),
        expression: None,
        on_violation: OnViolation::Advisory,
        enabled: true,
        created_by: "system".to_string(),
        created_at: now,
        updated_at: now,
    };

    let no_gpu_in_dev = Policy {
        id: "no_gpu_in_dev".to_string(),
        name: "No GPU instances in dev".to_string(),
        description: "Blocks GPU-family instances outside production".to_string(),
        budget: None,
        expression: Some(PolicyExpression {
            rule_operator: RuleOperator::And,
            rules: vec![
                Rule {
                    field: "env".to_string(),
                    operator: super::types::Operator::Eq,
                    value: Value::String("dev".to_string()),
                },
                Rule {
                    field: "crm.resources.*.size".to_string(),
                    operator: super::types::Operator::Contains,
                    value: Value::String("p3.".to_string()),
                },
            ],
        }),
        on_violation: OnViolation::Block,
        enabled: true,
        created_by: "system".to_string(),
        created_at: now,
        updated_at: now,
    };

    let no_large_instances_in_dev = Policy {
        id: "no_large_instances_in_dev".to_string(),
        name: "No large instances in dev".to_string(),
        description: "Blocks m5.large-and-above instances outside production".to_string(),
        budget: None,
        expression: Some(PolicyExpression {
            rule_operator: RuleOperator::And,
            rules: vec![
                Rule {
                    field: "env".to_string(),
                    operator: super::types::Operator::Eq,
                    value: Value::String("dev".to_string()),
                },
                Rule {
                    field: "crm.resources.*.size".to_string(),
                    operator: super::types::Operator::Contains,
                    value: Value::String("m5.".to_string()),
                },
            ],
        }),
        on_violation: OnViolation::Block,
        enabled: true,
        created_by: "system".to_string(),
        created_at: now,
        updated_at: now,
    };

    vec![default_monthly_budget, no_gpu_in_dev, no_large_instances_in_dev]
}
