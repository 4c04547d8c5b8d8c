// Cost Estimator (C6): resource × price × horizon → monthly/first-week
// totals, per-resource breakdown, aggregate confidence, risk flags and
// recommendations.

pub mod types;

pub use types::{CostBreakdownItem, CostResult};

use crate::engines::crm::{CanonicalResource, CanonicalResourceModel};
use crate::engines::pricing::{Confidence, PriceRecord, PriceUnit};
use rust_decimal::Decimal;
use std::str::FromStr;

const WEEK_OVER_MONTH: (i64, i64) = (7, 30);

/// `amount × count × normalize_to_month(unit)`. `gb-month`/`request`
/// units are already monthly-equivalent once scaled by the quantity
/// recorded in metadata (`size_gb`/`capacity_gb` or `monthly_requests`);
/// `hour` scales by the average hours in a month.
fn monthly_cost_for(resource: &CanonicalResource, price: &PriceRecord) -> Decimal {
    let count = Decimal::from(resource.count.max(1));
    let quantity = match price.unit {
        PriceUnit::Hour => PriceUnit::Hour.monthly_factor(),
        PriceUnit::Month => Decimal::ONE,
        PriceUnit::GbMonth => resource
            .metadata_f64("size_gb")
            .or_else(|| resource.metadata_f64("capacity_gb"))
            .and_then(|v| Decimal::from_str(&v.to_string()).ok())
            .unwrap_or(Decimal::ONE),
        PriceUnit::Request => resource
            .metadata_f64("monthly_requests")
            .and_then(|v| Decimal::from_str(&v.to_string()).ok())
            .unwrap_or(Decimal::ZERO),
        PriceUnit::Other => Decimal::ONE,
    };
    price.amount * quantity * count
}

/// First-week cost for one resource given its monthly cost, honoring
/// `metadata.ramp_profile` when present. Unrecognized profiles fall back
/// to the default linear ramp and push an `unrecognized` marker the
/// caller turns into a risk flag.
fn first_week_cost_for(monthly_cost: Decimal, ramp_profile: Option<&str>) -> (Decimal, bool) {
    let linear = |m: Decimal| m * Decimal::from(WEEK_OVER_MONTH.0) / Decimal::from(WEEK_OVER_MONTH.1);

    match ramp_profile {
        None | Some("linear") => (linear(monthly_cost), false),
        Some("immediate") => (monthly_cost, false),
        Some(profile) if profile.starts_with("delayed_start_days:") => {
            let days: i64 = profile
                .trim_start_matches("delayed_start_days:")
                .parse()
                .unwrap_or(0);
            if days >= WEEK_OVER_MONTH.0 {
                (Decimal::ZERO, false)
            } else {
                let billable_days = WEEK_OVER_MONTH.0 - days;
                (
                    monthly_cost * Decimal::from(billable_days) / Decimal::from(WEEK_OVER_MONTH.1),
                    false,
                )
            }
        }
        Some(_) => (linear(monthly_cost), true),
    }
}

fn downgrade_one_step(confidence: Confidence) -> Confidence {
    match confidence {
        Confidence::High => Confidence::Medium,
        Confidence::Medium => Confidence::Low,
        Confidence::Low => Confidence::Low,
    }
}

fn recommendations_for(resource: &CanonicalResource, environment: &str) -> Vec<String> {
    let mut notes = Vec::new();

    // "m5.large+" in the specification's language: the m5 family at
    // `.large` or above is oversized for a dev environment.
    let is_oversized_family = resource.size.starts_with("m5.");
    if environment == "dev" && is_oversized_family {
        notes.push(format!(
            "{} is an oversized instance for a dev environment; consider downsizing",
            resource.id
        ));
    }

    if resource
        .metadata
        .get("encrypted")
        .and_then(|v| v.as_bool())
        == Some(false)
    {
        notes.push(format!("{} is unencrypted at rest", resource.id));
    }

    if resource
        .metadata
        .get("publicly_accessible")
        .and_then(|v| v.as_bool())
        == Some(true)
    {
        notes.push(format!("{} is publicly accessible", resource.id));
    }

    notes
}

pub fn estimate(
    crm: &CanonicalResourceModel,
    prices: &[(String, PriceRecord)],
    environment: &str,
) -> CostResult {
    let mut breakdown = Vec::with_capacity(crm.resources.len());
    let mut risk_flags = Vec::new();
    let mut recommendations = Vec::new();
    let mut confidences = Vec::new();
    let mut total_monthly = Decimal::ZERO;
    let mut total_first_week = Decimal::ZERO;

    for resource in &crm.resources {
        let price = prices
            .iter()
            .find(|(id, _)| id == &resource.id)
            .map(|(_, p)| p.clone())
            .unwrap_or_else(|| PriceRecord::unknown(resource.region.clone()));

        if resource.is_unpriced_placeholder() {
            risk_flags.push(format!("unpriced_resource:{}", resource.resource_type));
        }

        let has_unresolved_reference = resource
            .metadata
            .get("unresolved_reference")
            .and_then(|v| v.as_str())
            .map(|field| {
                risk_flags.push(format!("unresolved_reference:{field}"));
                true
            })
            .unwrap_or(false);

        let confidence = if has_unresolved_reference {
            downgrade_one_step(price.confidence)
        } else {
            price.confidence
        };

        let monthly_cost = monthly_cost_for(resource, &price);
        let ramp_profile = resource.metadata_str("ramp_profile");
        let (first_week_cost, unrecognized_ramp) = first_week_cost_for(monthly_cost, ramp_profile);
        if unrecognized_ramp {
            risk_flags.push("ramp_profile_unrecognized".to_string());
        }

        total_monthly += monthly_cost;
        total_first_week += first_week_cost;
        confidences.push(confidence);
        recommendations.extend(recommendations_for(resource, environment));

        breakdown.push(CostBreakdownItem {
            resource_id: resource.id.clone(),
            monthly_cost,
            notes: Vec::new(),
            confidence,
        });
    }

    let pricing_confidence = if risk_flags
        .iter()
        .any(|f| f.starts_with("unpriced_resource:"))
    {
        Confidence::Low
    } else {
        Confidence::min_of(confidences).unwrap_or(Confidence::High)
    };

    CostResult {
        estimated_monthly_cost: total_monthly,
        estimated_first_week_cost: total_first_week,
        breakdown,
        pricing_confidence,
        resource_count: crm.resource_count(),
        risk_flags,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::pricing::{PriceSource, PriceUnit};
    use std::collections::HashMap;

    fn hourly_price(amount: &str, confidence: Confidence) -> PriceRecord {
        PriceRecord {
            unit: PriceUnit::Hour,
            amount: Decimal::from_str(amount).unwrap(),
            currency: "USD".to_string(),
            confidence,
            source: PriceSource::Static,
            sku: "sku".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn instance(id: &str, size: &str) -> CanonicalResource {
        CanonicalResource {
            id: id.to_string(),
            resource_type: "aws_instance".to_string(),
            name: id.to_string(),
            region: "us-east-1".to_string(),
            size: size.to_string(),
            count: 1,
            tags: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn monthly_cost_scales_hourly_price_by_730() {
        let mut crm = CanonicalResourceModel::new("terraform");
        crm.resources.push(instance("aws_instance.web", "t3.medium"));
        let prices = vec![("aws_instance.web".to_string(), hourly_price("0.0416", Confidence::Medium))];
        let result = estimate(&crm, &prices, "dev");
        assert_eq!(result.estimated_monthly_cost, Decimal::from_str("30.368").unwrap());
    }

    #[test]
    fn first_week_is_linear_by_default() {
        let mut crm = CanonicalResourceModel::new("terraform");
        crm.resources.push(instance("aws_instance.web", "t3.medium"));
        let prices = vec![("aws_instance.web".to_string(), hourly_price("0.0416", Confidence::Medium))];
        let result = estimate(&crm, &prices, "dev");
        let expected = result.estimated_monthly_cost * Decimal::from(7) / Decimal::from(30);
        assert_eq!(result.estimated_first_week_cost, expected);
    }

    #[test]
    fn unpriced_resource_forces_low_confidence() {
        let mut crm = CanonicalResourceModel::new("terraform");
        let mut r = instance("aws_weird_widget.thing", "unknown");
        r.metadata.insert("unpriced".to_string(), serde_json::json!(true));
        crm.resources.push(r);
        let result = estimate(&crm, &[], "dev");
        assert_eq!(result.pricing_confidence, Confidence::Low);
        assert!(result
            .risk_flags
            .iter()
            .any(|f| f.starts_with("unpriced_resource:")));
    }

    #[test]
    fn oversized_dev_instance_is_recommended_for_downsizing() {
        let mut crm = CanonicalResourceModel::new("terraform");
        crm.resources.push(instance("aws_instance.big", "m5.large"));
        let prices = vec![("aws_instance.big".to_string(), hourly_price("0.096", Confidence::Medium))];
        let result = estimate(&crm, &prices, "dev");
        assert!(result.recommendations.iter().any(|r| r.contains("oversized")));
    }
}
