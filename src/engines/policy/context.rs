// Builds the merged evaluation context `{ crm: {...}, cost: {...}, env }`
// that every policy rule's dotted `field` path is resolved against.

use super::value::Value;
use crate::engines::crm::CanonicalResourceModel;
use crate::engines::estimator::CostResult;
use rust_decimal::Decimal;
use std::collections::HashMap;

fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse().unwrap_or(0.0)
}

fn resource_to_value(resource: &crate::engines::crm::CanonicalResource) -> Value {
    let mut map = HashMap::new();
    map.insert("id".to_string(), Value::String(resource.id.clone()));
    map.insert("type".to_string(), Value::String(resource.resource_type.clone()));
    map.insert("name".to_string(), Value::String(resource.name.clone()));
    map.insert("region".to_string(), Value::String(resource.region.clone()));
    map.insert("size".to_string(), Value::String(resource.size.clone()));
    map.insert("count".to_string(), Value::Number(resource.count as f64));
    map.insert(
        "tags".to_string(),
        Value::Object(
            resource
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
    );
    map.insert(
        "metadata".to_string(),
        Value::Object(
            resource
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        ),
    );
    Value::Object(map)
}

pub fn build_context(crm: &CanonicalResourceModel, cost: &CostResult, environment: &str) -> Value {
    let resources = Value::List(crm.resources.iter().map(resource_to_value).collect());
    let provider_defaults = Value::Object(
        crm.provider_defaults
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    );

    let mut crm_obj = HashMap::new();
    crm_obj.insert("resources".to_string(), resources);
    crm_obj.insert("provider_defaults".to_string(), provider_defaults);
    crm_obj.insert(
        "source_iac_type".to_string(),
        Value::String(crm.source_iac_type.clone()),
    );

    let mut cost_obj = HashMap::new();
    cost_obj.insert(
        "estimated_monthly_cost".to_string(),
        Value::Number(decimal_to_f64(cost.estimated_monthly_cost)),
    );
    cost_obj.insert(
        "estimated_first_week_cost".to_string(),
        Value::Number(decimal_to_f64(cost.estimated_first_week_cost)),
    );
    cost_obj.insert(
        "resource_count".to_string(),
        Value::Number(cost.resource_count as f64),
    );
    cost_obj.insert(
        "pricing_confidence".to_string(),
        Value::String(format!("{:?}", cost.pricing_confidence).to_lowercase()),
    );
    cost_obj.insert(
        "risk_flags".to_string(),
        Value::List(cost.risk_flags.iter().cloned().map(Value::String).collect()),
    );

    let mut root = HashMap::new();
    root.insert("crm".to_string(), Value::Object(crm_obj));
    root.insert("cost".to_string(), Value::Object(cost_obj));
    root.insert("env".to_string(), Value::String(environment.to_string()));
    Value::Object(root)
}
