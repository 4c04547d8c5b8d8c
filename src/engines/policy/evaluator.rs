// Recursive evaluator over the typed `Value` context: dotted-path field
// resolution with `*` ("any resource") / `!` ("every resource") sentinels,
// explicit scalar/list comparisons, and a deliberately error-free
// "type mismatch is false" semantics.

use super::types::{EvalMode, EvalStatus, Operator, Policy, PolicyEvaluation, PolicyExpression, Rule, RuleOperator};
use super::value::Value;

enum Quantifier {
    Any,
    Every,
}

enum Resolved {
    Scalar(Value),
    Quantified(Quantifier, Vec<Value>),
}

fn resolve_path(value: &Value, path: &[&str]) -> Resolved {
    let Some((segment, rest)) = path.split_first() else {
        return Resolved::Scalar(value.clone());
    };

    if *segment == "*" || *segment == "!" {
        let quantifier = if *segment == "*" {
            Quantifier::Any
        } else {
            Quantifier::Every
        };
        return match value {
            Value::List(items) => {
                let values = items
                    .iter()
                    .map(|item| match resolve_path(item, rest) {
                        Resolved::Scalar(v) => v,
                        Resolved::Quantified(_, vs) => {
                            vs.into_iter().next().unwrap_or(Value::Null)
                        }
                    })
                    .collect();
                Resolved::Quantified(quantifier, values)
            }
            _ => Resolved::Quantified(quantifier, Vec::new()),
        };
    }

    match value {
        Value::Object(map) => match map.get(*segment) {
            Some(v) => resolve_path(v, rest),
            None => Resolved::Scalar(Value::Null),
        },
        _ => Resolved::Scalar(Value::Null),
    }
}

/// Scalar comparison. Type mismatches (missing path, comparing a string to
/// a number, etc.) evaluate to `false` rather than erroring, per the
/// specification's expression semantics.
fn compare(actual: &Value, operator: Operator, expected: &Value) -> bool {
    match operator {
        Operator::Eq => actual == expected,
        Operator::Ne => actual != expected,
        Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
            match (numeric(actual), numeric(expected)) {
                (Some(a), Some(b)) => match operator {
                    Operator::Gt => a > b,
                    Operator::Ge => a >= b,
                    Operator::Lt => a < b,
                    Operator::Le => a <= b,
                    _ => unreachable!(),
                },
                _ => match (actual.as_str(), expected.as_str()) {
                    (Some(a), Some(b)) => match operator {
                        Operator::Gt => a > b,
                        Operator::Ge => a >= b,
                        Operator::Lt => a < b,
                        Operator::Le => a <= b,
                        _ => unreachable!(),
                    },
                    _ => false,
                },
            }
        }
        Operator::In => match expected.as_list() {
            Some(list) => list.contains(actual),
            None => false,
        },
        Operator::NotIn => match expected.as_list() {
            Some(list) => !list.contains(actual),
            None => false,
        },
        Operator::Contains => match (actual, expected) {
            (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
            (Value::List(items), needle) => items.contains(needle),
            _ => false,
        },
    }
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn evaluate_rule(rule: &Rule, context: &Value) -> bool {
    let path: Vec<&str> = rule.field.split('.').collect();
    match resolve_path(context, &path) {
        Resolved::Scalar(actual) => compare(&actual, rule.operator, &rule.value),
        Resolved::Quantified(Quantifier::Any, values) => {
            values.iter().any(|v| compare(v, rule.operator, &rule.value))
        }
        Resolved::Quantified(Quantifier::Every, values) => {
            !values.is_empty() && values.iter().all(|v| compare(v, rule.operator, &rule.value))
        }
    }
}

/// `true` iff the expression's violation condition holds.
fn evaluate_expression(expression: &PolicyExpression, context: &Value) -> (bool, Vec<Rule>) {
    let mut violated = Vec::new();
    for rule in &expression.rules {
        if evaluate_rule(rule, context) {
            violated.push(rule.clone());
        }
    }
    let triggered = match expression.rule_operator {
        RuleOperator::And => violated.len() == expression.rules.len() && !expression.rules.is_empty(),
        RuleOperator::Or => !violated.is_empty(),
    };
    (triggered, violated)
}

/// Evaluates `policy` against the merged context built from a CRM and its
/// CostResult. `mode` overrides the policy's own `on_violation` for this
/// invocation only — the stored policy is never mutated.
pub fn evaluate_policy(policy: &Policy, context: &Value, mode: Option<EvalMode>) -> PolicyEvaluation {
    let mode = mode.unwrap_or(policy.on_violation.into());

    if let Some(budget) = policy.budget {
        let monthly_cost = match resolve_path(context, &["cost", "estimated_monthly_cost"]) {
            Resolved::Scalar(v) => v.as_f64().unwrap_or(0.0),
            _ => 0.0,
        };
        let failed = monthly_cost > budget;
        return PolicyEvaluation {
            policy_id: policy.id.clone(),
            status: if failed { EvalStatus::Fail } else { EvalStatus::Pass },
            reason: if failed {
                format!("estimated monthly cost {monthly_cost:.2} exceeds budget {budget:.2}")
            } else {
                format!("estimated monthly cost {monthly_cost:.2} is within budget {budget:.2}")
            },
            mode,
            violated_rules: Vec::new(),
        };
    }

    let Some(expression) = &policy.expression else {
        return PolicyEvaluation {
            policy_id: policy.id.clone(),
            status: EvalStatus::NotApplicable,
            reason: "policy has neither a budget nor an expression".to_string(),
            mode,
            violated_rules: Vec::new(),
        };
    };

    let (failed, violated_rules) = evaluate_expression(expression, context);
    PolicyEvaluation {
        policy_id: policy.id.clone(),
        status: if failed { EvalStatus::Fail } else { EvalStatus::Pass },
        reason: if failed {
            format!("{} rule(s) matched the violation condition", violated_rules.len())
        } else {
            "no violation condition matched".to_string()
        },
        mode,
        violated_rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx_with_instance_sizes(sizes: &[&str]) -> Value {
        let resources = sizes
            .iter()
            .map(|size| {
                let mut m = HashMap::new();
                m.insert("size".to_string(), Value::String(size.to_string()));
                Value::Object(m)
            })
            .collect();
        let mut crm = HashMap::new();
        crm.insert("resources".to_string(), Value::List(resources));
        let mut root = HashMap::new();
        root.insert("crm".to_string(), Value::Object(crm));
        Value::Object(root)
    }

    #[test]
    fn any_sentinel_passes_if_one_resource_matches() {
        let ctx = ctx_with_instance_sizes(&["t3.micro", "m5.large"]);
        let rule = Rule {
            field: "crm.resources.*.size".to_string(),
            operator: Operator::Eq,
            value: Value::String("m5.large".to_string()),
        };
        assert!(evaluate_rule(&rule, &ctx));
    }

    #[test]
    fn every_sentinel_requires_all_resources_to_match() {
        let ctx = ctx_with_instance_sizes(&["m5.large", "m5.large"]);
        let rule = Rule {
            field: "crm.resources.!.size".to_string(),
            operator: Operator::Eq,
            value: Value::String("m5.large".to_string()),
        };
        assert!(evaluate_rule(&rule, &ctx));

        let ctx2 = ctx_with_instance_sizes(&["m5.large", "t3.micro"]);
        assert!(!evaluate_rule(&rule, &ctx2));
    }

    #[test]
    fn missing_path_compared_with_gt_is_false_not_error() {
        let ctx = Value::Object(HashMap::new());
        let rule = Rule {
            field: "cost.estimated_monthly_cost".to_string(),
            operator: Operator::Gt,
            value: Value::Number(10.0),
        };
        assert!(!evaluate_rule(&rule, &ctx));
    }

    #[test]
    fn budget_policy_fails_when_cost_exceeds_budget() {
        use super::super::types::OnViolation;
        use chrono::Utc;

        let policy = Policy {
            id: "monthly_budget".to_string(),
            name: "Monthly budget".to_string(),
            description: "".to_string(),
            budget: Some(25.0),
            expression: None,
            on_violation: OnViolation::Advisory,
            enabled: true,
            created_by: "system".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut cost = HashMap::new();
        cost.insert("estimated_monthly_cost".to_string(), Value::Number(30.0));
        let mut root = HashMap::new();
        root.insert("cost".to_string(), Value::Object(cost));
        let ctx = Value::Object(root);

        let eval = evaluate_policy(&policy, &ctx, None);
        assert_eq!(eval.status, EvalStatus::Fail);
    }
}
