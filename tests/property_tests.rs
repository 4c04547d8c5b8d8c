// Property-based coverage for the invariants and round-trip laws in the
// specification's "Testable Properties" section (§8), plus a handful of
// parameterized catalog checks. Written against `proptest`/`rstest`, the
// same test tooling the teacher declares in `[dev-dependencies]`.

use finopsguard::engines::crm::{CanonicalResource, CanonicalResourceModel};
use finopsguard::engines::estimator::estimate;
use finopsguard::engines::pricing::{Confidence, PriceRecord, PriceSource, PriceUnit};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

fn instance(id: &str, size: &str, count: u32) -> CanonicalResource {
    CanonicalResource {
        id: id.to_string(),
        resource_type: "aws_instance".to_string(),
        name: id.to_string(),
        region: "us-east-1".to_string(),
        size: size.to_string(),
        count,
        tags: HashMap::new(),
        metadata: HashMap::new(),
    }
}

proptest! {
    /// §8: `|sum(breakdown.monthly_cost) - estimated_monthly_cost| < 1e-6`
    /// for any combination of hourly unit prices and resource counts.
    #[test]
    fn breakdown_sums_to_the_total(
        prices in prop::collection::vec(1u32..500, 1..8),
        counts in prop::collection::vec(1u32..10, 1..8),
    ) {
        let n = prices.len().min(counts.len());
        let mut crm = CanonicalResourceModel::new("terraform");
        let mut price_records = Vec::new();
        for i in 0..n {
            let id = format!("aws_instance.r{i}");
            crm.resources.push(instance(&id, "t3.medium", counts[i]));
            price_records.push((
                id,
                PriceRecord {
                    unit: PriceUnit::Hour,
                    amount: Decimal::from(prices[i]) / Decimal::from(1000),
                    currency: "USD".to_string(),
                    confidence: Confidence::Medium,
                    source: PriceSource::Static,
                    sku: "sku".to_string(),
                    region: "us-east-1".to_string(),
                },
            ));
        }

        let result = estimate(&crm, &price_records, "dev");
        let summed: Decimal = result.breakdown.iter().map(|b| b.monthly_cost).sum();
        let diff = (summed - result.estimated_monthly_cost).abs();
        prop_assert!(diff < Decimal::new(1, 6));
    }

    /// §8 round-trip law: `PriceRecord` JSON round-trips exactly.
    #[test]
    fn price_record_round_trips_through_json(
        cents in 0u32..100_000,
        region in "[a-z]{2,10}-[a-z]{4,10}-[0-9]",
    ) {
        let record = PriceRecord {
            unit: PriceUnit::Hour,
            amount: Decimal::from(cents) / Decimal::from(100),
            currency: "USD".to_string(),
            confidence: Confidence::High,
            source: PriceSource::Live,
            sku: "aws_instance/t3.medium".to_string(),
            region,
        };

        let json = serde_json::to_string(&record).unwrap();
        let round_tripped: PriceRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(record, round_tripped);
    }
}

#[rstest]
#[case("t3.micro", "0.0104")]
#[case("t3.medium", "0.0416")]
#[case("m5.large", "0.0960")]
#[case("m5.xlarge", "0.1920")]
fn known_instance_skus_resolve_to_their_catalog_price(#[case] size: &str, #[case] expected: &str) {
    let resource = instance("aws_instance.x", size, 1);
    let record = finopsguard_test_support::catalog_lookup(&resource);
    assert_eq!(record.amount, Decimal::from_str(expected).unwrap());
    assert_eq!(record.confidence, Confidence::Medium);
}

/// The static catalog module is private to the crate; this thin shim
/// exercises it through the one public seam that exposes pricing
/// decisions without going fully live — the estimator's own unit pricing
/// path, called with a resource carrying no live adapter.
mod finopsguard_test_support {
    use finopsguard::engines::crm::CanonicalResource;
    use finopsguard::engines::pricing::PriceRecord;

    pub fn catalog_lookup(resource: &CanonicalResource) -> PriceRecord {
        finopsguard::engines::pricing::catalog::lookup(resource)
    }
}
