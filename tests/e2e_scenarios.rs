// The six literal end-to-end scenarios from the specification's
// "Testable Properties" section, run against the public `FinOpsGuard`
// facade rather than any individual engine.

use base64::Engine as _;
use finopsguard::api::{BudgetRules, CheckRequest};
use finopsguard::engines::policy::{EvalMode, EvalStatus};
use finopsguard::engines::pricing::Confidence;
use finopsguard::{CoreConfig, FinOpsGuard};
use rust_decimal::Decimal;

fn encode(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

fn request(payload: &str, environment: &str) -> CheckRequest {
    CheckRequest {
        iac_type: "terraform".to_string(),
        iac_payload: encode(payload),
        environment: environment.to_string(),
        budget_rules: None,
        policy_ids: None,
        request_id: None,
    }
}

/// Scenario 1: basic AWS instance, dev env, no policy.
#[tokio::test]
async fn basic_aws_instance_dev_no_policy() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_instance" "example" {
          instance_type = "t3.medium"
        }
        provider "aws" {
          region = "us-east-1"
        }
    "#;

    let response = guard.check_cost_impact(request(hcl, "dev")).await.unwrap();

    assert_eq!(response.resource_count, 1);
    assert!(response.estimated_monthly_cost > Decimal::ZERO);
    assert!(matches!(
        response.pricing_confidence,
        Confidence::High | Confidence::Medium
    ));
    assert!(response.policy_eval.is_empty());
}

/// Scenario 2: the same deployment with an implicit budget it exceeds.
#[tokio::test]
async fn budget_violation() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_instance" "example" {
          instance_type = "t3.medium"
        }
        provider "aws" {
          region = "us-east-1"
        }
    "#;

    let mut req = request(hcl, "dev");
    req.budget_rules = Some(BudgetRules::new(25.0));

    let response = guard.check_cost_impact(req).await.unwrap();

    assert_eq!(response.policy_eval.len(), 1);
    assert_eq!(response.policy_eval[0].policy_id, "monthly_budget");
    assert_eq!(response.policy_eval[0].status, EvalStatus::Fail);
}

/// Scenario 3: the blocking `no_large_instances_in_dev` policy fails for
/// an `m5.large` in `dev`.
#[tokio::test]
async fn blocking_policy_fails_for_m5_large_in_dev() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_instance" "big" {
          instance_type = "m5.large"
        }
    "#;

    let mut req = request(hcl, "dev");
    req.policy_ids = Some(vec!["no_large_instances_in_dev".to_string()]);

    let response = guard.check_cost_impact(req).await.unwrap();

    assert_eq!(response.policy_eval.len(), 1);
    assert_eq!(response.policy_eval[0].policy_id, "no_large_instances_in_dev");
    assert_eq!(response.policy_eval[0].status, EvalStatus::Fail);
    assert_eq!(response.policy_eval[0].mode, EvalMode::Blocking);
}

/// Scenario 4: the same policy evaluated in advisory mode still reports
/// `fail`, but the engine never halts anything itself — that decision is
/// the caller's.
#[tokio::test]
async fn same_policy_in_advisory_mode_still_reports_fail() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_instance" "big" {
          instance_type = "m5.large"
        }
    "#;

    let request = finopsguard::api::EvaluateRequest {
        iac_type: "terraform".to_string(),
        iac_payload: encode(hcl),
        environment: "dev".to_string(),
        budget_rules: None,
        policy_id: "no_large_instances_in_dev".to_string(),
        mode: Some(EvalMode::Advisory),
    };

    let eval = guard.evaluate_policy(request).await.unwrap();
    assert_eq!(eval.status, EvalStatus::Fail);
    assert_eq!(eval.mode, EvalMode::Advisory);
}

/// Scenario 5: GCP Spanner with 2 nodes is priced from the static catalog.
#[tokio::test]
async fn gcp_spanner_two_nodes_is_priced() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "google_spanner_instance" "spanner" {
          num_nodes = 2
        }
        provider "google" {
          region = "us-central1"
        }
    "#;

    let response = guard.check_cost_impact(request(hcl, "prod")).await.unwrap();

    assert_eq!(response.resource_count, 1);
    assert_eq!(response.breakdown.len(), 1);
    assert!(response.estimated_monthly_cost > Decimal::ZERO);
    // Priced from the static catalog's known 2-node row (not a nearest-family
    // default), so confidence is `medium`, not `low`.
    assert_eq!(response.pricing_confidence, Confidence::Medium);
    assert_eq!(response.breakdown[0].confidence, Confidence::Medium);
}

/// Scenario 6: an unknown resource type contributes zero cost, is flagged,
/// and forces the overall confidence to `low`.
#[tokio::test]
async fn unpriced_resource_is_flagged_and_forces_low_confidence() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_quantum_widget" "thing" {
          qubits = 42
        }
    "#;

    let response = guard.check_cost_impact(request(hcl, "dev")).await.unwrap();

    assert_eq!(response.resource_count, 1);
    assert_eq!(response.estimated_monthly_cost, Decimal::ZERO);
    assert!(response
        .risk_flags
        .iter()
        .any(|f| f == "unpriced_resource:aws_quantum_widget"));
    assert_eq!(response.pricing_confidence, Confidence::Low);
}

/// Idempotence: `list_recent_analyses` surfaces the persisted record for a
/// fixed `request_id`, and re-running the same request is a cache hit
/// rather than a second computation.
#[tokio::test]
async fn check_persists_an_analysis_record_queryable_by_list() {
    let guard = FinOpsGuard::new(CoreConfig::default());
    let hcl = r#"
        resource "aws_instance" "example" {
          instance_type = "t3.micro"
        }
    "#;

    let mut req = request(hcl, "dev");
    req.request_id = Some("fixed-request-id".to_string());

    guard.check_cost_impact(req).await.unwrap();

    let listed = guard
        .list_recent_analyses(finopsguard::api::ListQueryRequest::default())
        .await
        .unwrap();

    assert!(listed.items.iter().any(|r| r.request_id == "fixed-request-id"));
}
