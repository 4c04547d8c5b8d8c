// FinOpsGuard core — a pre-deployment cost and policy gate for
// Infrastructure-as-Code. This crate implements the analysis pipeline and
// policy engine described in the specification: parse → price → estimate
// → evaluate → persist. It never opens a listener, authenticates a
// caller, or delivers a webhook; those are a thin outer layer's job.
//
// [`FinOpsGuard`] is the facade every such outer layer drives. It owns the
// process-wide [`engines::pricing::PricingFactory`], the policy registry,
// the analysis store, and the analysis cache, all constructed once from a
// [`config::CoreConfig`] — no ambient mutable state.

pub mod api;
pub mod config;
pub mod engines;
pub mod errors;

pub use config::CoreConfig;
pub use errors::{FinOpsError, Result};

use api::{
    BudgetRules, CheckRequest, CheckResponse, EvaluateRequest, ListQueryRequest, ListResponseBody,
};
use base64::Engine as _;
use chrono::Utc;
use engines::cache::{AnalysisCache, CachedResult};
use engines::crm::CanonicalResourceModel;
use engines::estimator::{self, CostResult};
use engines::parser;
use engines::policy::{self, EvalMode, EvalStatus, OnViolation, Policy, PolicyEvaluation, PolicyStore};
use engines::pricing::PricingFactory;
use engines::shared::cancellation::{run_cancellable, CancellationToken};
use engines::store::{
    AnalysisRecord, AnalysisStore, InMemoryAnalysisStore, ListQuery, PolicyStatus,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The process-wide facade the HTTP layer, CLI, and any other in-process
/// caller drive. Construct once (`new`/`from_env`), share behind an `Arc`.
pub struct FinOpsGuard {
    config: CoreConfig,
    pricing: PricingFactory,
    policies: PolicyStore,
    store: Arc<dyn AnalysisStore>,
    cache: AnalysisCache,
}

impl FinOpsGuard {
    /// Builds a facade from an explicit [`CoreConfig`], backed by the
    /// in-memory analysis store and seeded with the default policy set.
    /// Call [`FinOpsGuard::with_store`] to swap in a Postgres-backed store.
    pub fn new(config: CoreConfig) -> Self {
        let pricing = PricingFactory::new(&config);
        let cache = AnalysisCache::new(Duration::from_secs(config.cache_default_ttl_secs));
        Self {
            pricing,
            policies: PolicyStore::with_defaults(),
            store: Arc::new(InMemoryAnalysisStore::new()),
            cache,
            config,
        }
    }

    /// Loads [`CoreConfig`] from the process environment and builds a
    /// facade from it. Mirrors the env-then-nothing loading shape of
    /// `CoreConfig::from_env` — there is no on-disk config file tier.
    pub fn from_env() -> Self {
        Self::new(CoreConfig::from_env())
    }

    /// Replaces the analysis store backing this facade, e.g. with a
    /// connected [`engines::store::postgres::PgAnalysisStore`]. Intended
    /// to be called once at startup, before any request is served.
    pub fn with_store(mut self, store: Arc<dyn AnalysisStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// `check_cost_impact` (§6): parse → price → estimate → evaluate →
    /// persist, in that strict order for a single `request_id`. Errors
    /// from parsing/validation surface directly; pricing errors are
    /// recovered locally by the factory unless the caller disables
    /// fallback; store write failures are logged but never fail the
    /// already-computed result.
    pub async fn check_cost_impact(&self, request: CheckRequest) -> Result<CheckResponse> {
        self.check_cost_impact_cancellable(request, None).await
    }

    /// Same contract as [`FinOpsGuard::check_cost_impact`], but accepts a
    /// [`CancellationToken`] so a caller with its own deadline/cancel
    /// signal can abandon in-flight pricing lookups. On cancellation the
    /// call returns `Err(FinOpsError::Cancelled)` without persisting an
    /// `AnalysisRecord`.
    pub async fn check_cost_impact_cancellable(
        &self,
        request: CheckRequest,
        cancellation: Option<&CancellationToken>,
    ) -> Result<CheckResponse> {
        let started_at = Utc::now();
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let text = decode_payload(&request.iac_payload)?;
        let policy_ids = request.policy_ids.clone().unwrap_or_default();
        let budget = request.budget_rules.as_ref().map(|b| b.monthly_budget);

        let cache_key = AnalysisCache::key_for(
            &request.iac_type,
            &text,
            &request.environment,
            &policy_ids,
            budget,
        );

        let cached = self
            .cache
            .get_or_compute(&cache_key, "check", None, || async {
                let crm = parser::parse(&text, &request.iac_type)?;
                let prices = run_cancellable(
                    self.pricing.price_all(&crm.resources, false),
                    cancellation,
                )
                .await
                .ok_or(FinOpsError::Cancelled)??;
                let cost = estimator::estimate(&crm, &prices, &request.environment);
                let policy_eval =
                    self.evaluate_applicable_policies(&crm, &cost, &request.environment, &policy_ids, budget, None)?;
                Ok(CachedResult { cost, policy_eval })
            })
            .await?;

        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds();

        let response = CheckResponse {
            request_id: request_id.clone(),
            estimated_monthly_cost: cached.cost.estimated_monthly_cost,
            estimated_first_week_cost: cached.cost.estimated_first_week_cost,
            breakdown: cached.cost.breakdown.clone(),
            pricing_confidence: cached.cost.pricing_confidence,
            resource_count: cached.cost.resource_count,
            risk_flags: cached.cost.risk_flags.clone(),
            recommendations: cached.cost.recommendations.clone(),
            policy_eval: cached.policy_eval.clone(),
            duration_ms,
        };

        let record = build_analysis_record(
            &request_id,
            started_at,
            completed_at,
            duration_ms,
            &request,
            &cached,
        );
        if let Err(e) = self.store.put(record).await {
            e.log();
        }

        Ok(response)
    }

    /// `evaluate_policy` (§6): the same parse+price path as
    /// `check_cost_impact`, but returns only the [`PolicyEvaluation`] for
    /// one named policy. `mode` overrides the policy's own
    /// `on_violation` for this call only.
    pub async fn evaluate_policy(&self, request: EvaluateRequest) -> Result<PolicyEvaluation> {
        let text = decode_payload(&request.iac_payload)?;
        let crm = parser::parse(&text, &request.iac_type)?;
        let prices = self.pricing.price_all(&crm.resources, false).await?;
        let cost = estimator::estimate(&crm, &prices, &request.environment);
        let policy = self.policies.get(&request.policy_id)?;
        let context = policy::build_context(&crm, &cost, &request.environment);
        Ok(policy::evaluate_policy(&policy, &context, request.mode))
    }

    /// `list_recent_analyses` (§6): records ordered by `started_at`
    /// descending, with an opaque forward cursor.
    pub async fn list_recent_analyses(&self, query: ListQueryRequest) -> Result<ListResponseBody> {
        let result = self
            .store
            .list(ListQuery {
                since: query.since,
                until: query.until,
                limit: query.limit,
                cursor: query.cursor,
            })
            .await?;
        Ok(ListResponseBody {
            items: result.items,
            next_cursor: result.next_cursor,
        })
    }

    pub fn get_policy(&self, id: &str) -> Result<Policy> {
        self.policies.get(id)
    }

    pub fn list_policies(&self) -> Vec<Policy> {
        self.policies.list()
    }

    /// Rejects a duplicate id with `FinOpsError::PolicyExists`.
    pub fn create_policy(&self, policy: Policy) -> Result<()> {
        self.policies.create(policy)
    }

    /// Rejects an unknown id with `FinOpsError::PolicyNotFound`.
    pub fn delete_policy(&self, id: &str) -> Result<()> {
        self.policies.delete(id)
    }

    /// Resolves the policy evaluations for one check: explicit
    /// `policy_ids` if given, otherwise the implicit `monthly_budget`
    /// policy built from the request's `budget_rules` (only when no
    /// explicit policy was supplied — §9 Open Question 2), otherwise none.
    fn evaluate_applicable_policies(
        &self,
        crm: &CanonicalResourceModel,
        cost: &CostResult,
        environment: &str,
        policy_ids: &[String],
        budget: Option<f64>,
        mode_override: Option<EvalMode>,
    ) -> Result<Vec<PolicyEvaluation>> {
        let context = policy::build_context(crm, cost, environment);

        if !policy_ids.is_empty() {
            policy_ids
                .iter()
                .map(|id| {
                    let policy = self.policies.get(id)?;
                    if !policy.enabled {
                        return Ok(PolicyEvaluation {
                            policy_id: policy.id.clone(),
                            status: EvalStatus::NotApplicable,
                            reason: "policy is disabled".to_string(),
                            mode: mode_override.unwrap_or(policy.on_violation.into()),
                            violated_rules: Vec::new(),
                        });
                    }
                    Ok(policy::evaluate_policy(&policy, &context, mode_override))
                })
                .collect()
        } else if let Some(budget) = budget {
            let now = Utc::now();
            let implicit = Policy {
                id: "monthly_budget".to_string(),
                name: "Request-scoped monthly budget".to_string(),
                description: "Implicit budget supplied with the check request".to_string(),
                budget: Some(budget),
                expression: None,
                on_violation: OnViolation::Advisory,
                enabled: true,
                created_by: "request".to_string(),
                created_at: now,
                updated_at: now,
            };
            Ok(vec![policy::evaluate_policy(&implicit, &context, mode_override)])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Decodes an `iac_payload` per §6: base64 of UTF-8 text. Empty payload
/// (before or after decoding) is `invalid_request`, not a parse error;
/// malformed base64 or non-UTF-8 bytes are `invalid_payload_encoding`.
fn decode_payload(iac_payload: &str) -> Result<String> {
    if iac_payload.is_empty() {
        return Err(FinOpsError::InvalidRequest("iac_payload is empty".to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(iac_payload)
        .map_err(|e| FinOpsError::InvalidPayloadEncoding(e.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| FinOpsError::InvalidPayloadEncoding(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(FinOpsError::InvalidRequest("decoded iac_payload is empty".to_string()));
    }
    Ok(text)
}

fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse().unwrap_or(0.0)
}

/// Builds the `AnalysisRecord` persisted for one completed check. The
/// specification's data model carries a single `policy_status`/`policy_id`
/// pair even though a check may evaluate several policies at once; this
/// aggregates to the first failing policy (or the first evaluated policy,
/// if none failed) so the indexed columns still answer "did anything
/// block this deployment" without a schema change.
fn build_analysis_record(
    request_id: &str,
    started_at: chrono::DateTime<Utc>,
    completed_at: chrono::DateTime<Utc>,
    duration_ms: i64,
    request: &CheckRequest,
    cached: &CachedResult,
) -> AnalysisRecord {
    let (policy_status, policy_id) = match cached.policy_eval.as_slice() {
        [] => (None, None),
        evals => {
            let status = if evals.iter().any(|e| e.status == EvalStatus::Fail) {
                PolicyStatus::Fail
            } else if evals.iter().all(|e| e.status == EvalStatus::NotApplicable) {
                PolicyStatus::NotApplicable
            } else {
                PolicyStatus::Pass
            };
            let id = evals
                .iter()
                .find(|e| e.status == EvalStatus::Fail)
                .or_else(|| evals.first())
                .map(|e| e.policy_id.clone());
            (Some(status), id)
        }
    };

    AnalysisRecord {
        request_id: request_id.to_string(),
        started_at,
        completed_at,
        duration_ms,
        iac_type: request.iac_type.clone(),
        environment: request.environment.clone(),
        estimated_monthly_cost: decimal_to_f64(cached.cost.estimated_monthly_cost),
        estimated_first_week_cost: decimal_to_f64(cached.cost.estimated_first_week_cost),
        resource_count: cached.cost.resource_count as i64,
        policy_status,
        policy_id,
        risk_flags: cached.cost.risk_flags.clone(),
        recommendations_count: cached.cost.recommendations.len() as i64,
        result_json: serde_json::json!({
            "cost": cached.cost,
            "policy_eval": cached.policy_eval,
        }),
        created_at: completed_at,
    }
}

/// Convenience constructor for callers that only need the implicit budget
/// sugar without going through [`BudgetRules`] deserialization directly.
impl BudgetRules {
    pub fn new(monthly_budget: f64) -> Self {
        Self { monthly_budget }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    fn hcl_instance(instance_type: &str) -> String {
        format!(
            r#"
            provider "aws" {{
              region = "us-east-1"
            }}

            resource "aws_instance" "example" {{
              instance_type = "{instance_type}"
            }}
            "#
        )
    }

    #[tokio::test]
    async fn basic_aws_instance_has_no_policy_eval_and_positive_cost() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let request = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: encode(&hcl_instance("t3.medium")),
            environment: "dev".to_string(),
            budget_rules: None,
            policy_ids: None,
            request_id: None,
        };

        let response = guard.check_cost_impact(request).await.unwrap();
        assert_eq!(response.resource_count, 1);
        assert!(response.estimated_monthly_cost > Decimal::ZERO);
        assert!(response.policy_eval.is_empty());
    }

    #[tokio::test]
    async fn budget_violation_sets_monthly_budget_policy_id() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let request = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: encode(&hcl_instance("t3.medium")),
            environment: "dev".to_string(),
            budget_rules: Some(BudgetRules::new(25.0)),
            policy_ids: None,
            request_id: None,
        };

        let response = guard.check_cost_impact(request).await.unwrap();
        assert_eq!(response.policy_eval.len(), 1);
        assert_eq!(response.policy_eval[0].policy_id, "monthly_budget");
        assert_eq!(response.policy_eval[0].status, EvalStatus::Fail);
    }

    #[tokio::test]
    async fn empty_payload_is_invalid_request() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let request = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: String::new(),
            environment: "dev".to_string(),
            budget_rules: None,
            policy_ids: None,
            request_id: None,
        };

        let err = guard.check_cost_impact(request).await.unwrap_err();
        assert_eq!(err.id(), "invalid_request");
    }

    #[tokio::test]
    async fn malformed_base64_is_invalid_payload_encoding() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let request = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: "not-valid-base64!!!".to_string(),
            environment: "dev".to_string(),
            budget_rules: None,
            policy_ids: None,
            request_id: None,
        };

        let err = guard.check_cost_impact(request).await.unwrap_err();
        assert_eq!(err.id(), "invalid_payload_encoding");
    }

    #[tokio::test]
    async fn blocking_policy_fails_for_large_instance_in_dev() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let request = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: encode(&hcl_instance("m5.large")),
            environment: "dev".to_string(),
            budget_rules: None,
            policy_ids: Some(vec!["no_large_instances_in_dev".to_string()]),
            request_id: None,
        };

        let response = guard.check_cost_impact(request).await.unwrap();
        assert_eq!(response.policy_eval.len(), 1);
        assert_eq!(response.policy_eval[0].policy_id, "no_large_instances_in_dev");
        assert_eq!(response.policy_eval[0].status, EvalStatus::Fail);
    }

    #[tokio::test]
    async fn repeated_request_id_hits_the_cache_and_skips_recompute() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let payload = encode(&hcl_instance("t3.medium"));

        let first = CheckRequest {
            iac_type: "terraform".to_string(),
            iac_payload: payload.clone(),
            environment: "dev".to_string(),
            budget_rules: None,
            policy_ids: None,
            request_id: Some("req-fixed".to_string()),
        };
        let second = CheckRequest {
            request_id: Some("req-fixed".to_string()),
            ..first.clone()
        };

        let r1 = guard.check_cost_impact(first).await.unwrap();
        let r2 = guard.check_cost_impact(second).await.unwrap();
        assert_eq!(r1.estimated_monthly_cost, r2.estimated_monthly_cost);
    }

    #[test]
    fn policy_crud_round_trips() {
        let guard = FinOpsGuard::new(CoreConfig::default());
        let before = guard.list_policies().len();

        let policy = Policy {
            id: "custom_policy".to_string(),
            name: "Custom".to_string(),
            description: "".to_string(),
            budget: Some(500.0),
            expression: None,
            on_violation: OnViolation::Advisory,
            enabled: true,
            created_by: "test".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        guard.create_policy(policy.clone()).unwrap();
        assert_eq!(guard.list_policies().len(), before + 1);

        let err = guard.create_policy(policy).unwrap_err();
        assert_eq!(err.id(), "policy_exists");

        guard.get_policy("custom_policy").unwrap();
        guard.delete_policy("custom_policy").unwrap();
        let err = guard.get_policy("custom_policy").unwrap_err();
        assert_eq!(err.id(), "policy_not_found");
    }
}
