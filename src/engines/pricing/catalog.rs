// Static pricing catalog (C3) — a deterministic, read-only table keyed by
// `(provider, sku, region)`. `sku` here is `"{resource_type}/{size}"`,
// which keeps the table flat while still letting two different resource
// types reuse the same `size` string (e.g. two AWS EC2-shaped resources)
// without colliding.

use super::types::{Confidence, PriceRecord, PriceSource, PriceUnit};
use crate::engines::crm::CanonicalResource;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

struct CatalogEntry {
    unit: PriceUnit,
    amount: &'static str,
}

type CatalogKey = (&'static str, &'static str, &'static str);

fn reference_region(provider: &str) -> &'static str {
    match provider {
        "gcp" => "us-central1",
        "azure" => "eastus",
        _ => "us-east-1",
    }
}

static TABLE: Lazy<HashMap<CatalogKey, CatalogEntry>> = Lazy::new(|| {
    use PriceUnit::*;
    let rows: &[(CatalogKey, PriceUnit, &str)] = &[
        (("aws", "aws_instance/t3.micro", "us-east-1"), Hour, "0.0104"),
        (("aws", "aws_instance/t3.medium", "us-east-1"), Hour, "0.0416"),
        (("aws", "aws_instance/m5.large", "us-east-1"), Hour, "0.0960"),
        (("aws", "aws_instance/m5.xlarge", "us-east-1"), Hour, "0.1920"),
        (("aws", "aws_rds_instance/db.t3.micro", "us-east-1"), Hour, "0.017"),
        (("aws", "aws_rds_instance/db.t3.medium", "us-east-1"), Hour, "0.068"),
        (("aws", "aws_s3_bucket/STANDARD", "us-east-1"), GbMonth, "0.023"),
        (("aws", "aws_s3_bucket/INTELLIGENT_TIERING", "us-east-1"), GbMonth, "0.023"),
        (("aws", "aws_ecs_cluster/cluster", "us-east-1"), Month, "0.0"),
        (("aws", "aws_sns_topic/topic", "us-east-1"), Request, "0.0000005"),
        (("aws", "aws_sqs_queue/standard", "us-east-1"), Request, "0.0000004"),
        (("aws", "aws_sqs_queue/fifo", "us-east-1"), Request, "0.0000005"),
        (("aws", "aws_kinesis_stream/1shards", "us-east-1"), Hour, "0.015"),
        (("aws", "aws_neptune_cluster/db.t3.medium", "us-east-1"), Hour, "0.092"),
        (("aws", "aws_docdb_cluster/db.t3.medium", "us-east-1"), Hour, "0.077"),
        (("aws", "aws_msk_cluster/kafka.m5.large", "us-east-1"), Hour, "0.21"),
        (("aws", "aws_emr_cluster/m5.xlarge", "us-east-1"), Hour, "0.27"),
        (("aws", "aws_athena_workgroup/workgroup", "us-east-1"), Month, "0.0"),
        (("aws", "aws_glue/job", "us-east-1"), Hour, "0.44"),
        (("aws", "aws_glue/crawler", "us-east-1"), Hour, "0.44"),
        (("aws", "aws_api_gateway/HTTP", "us-east-1"), Request, "0.000001"),
        (("aws", "aws_api_gateway/REST", "us-east-1"), Request, "0.0000035"),
        (("aws", "aws_cloudfront_distribution/PriceClass_All", "global"), GbMonth, "0.085"),
        (("aws", "aws_lambda_function/128MB/python3.11", "us-east-1"), Request, "0.0000002"),
        (("gcp", "gcp_compute_instance/e2-medium", "us-central1"), Hour, "0.0335"),
        (("gcp", "gcp_compute_instance/n1-standard-1", "us-central1"), Hour, "0.0475"),
        (("gcp", "gcp_compute_instance/n1-standard-4", "us-central1"), Hour, "0.1900"),
        (("gcp", "gcp_compute_disk/pd-standard/10GB", "us-central1"), GbMonth, "0.04"),
        (("gcp", "gcp_compute_disk/pd-ssd/500GB", "us-central1"), GbMonth, "0.17"),
        (("gcp", "gcp_pubsub_topic/topic", "us-central1"), Request, "0.00000004"),
        (("gcp", "gcp_spanner_instance/1nodes", "us-central1"), Hour, "0.90"),
        (("gcp", "gcp_spanner_instance/2nodes", "us-central1"), Hour, "1.80"),
        (("gcp", "gcp_spanner_instance/3nodes", "us-central1"), Hour, "2.70"),
        (("gcp", "gcp_dataflow_job/n1-standard-1/1workers", "us-central1"), Hour, "0.06"),
        (("gcp", "gcp_filestore_instance/STANDARD/1024GB", "us-central1"), Month, "204.80"),
        (("gcp", "gcp_notebooks_instance/n1-standard-4", "us-central1"), Hour, "0.19"),
        (("gcp", "gcp_dataproc_cluster/n1-standard-4/2workers", "us-central1"), Hour, "0.38"),
        (("gcp", "gcp_composer_environment/n1-standard-2/3nodes", "us-central1"), Hour, "0.74"),
    ];
    rows.iter()
        .map(|(key, unit, amount)| (*key, CatalogEntry { unit: *unit, amount }))
        .collect()
});

/// Provider-level family default used when a specific sku is unknown:
/// the smallest/cheapest representative in that provider's compute family,
/// returned at `low` confidence per the nearest-family fallback rule.
fn family_default(provider: &str) -> (PriceUnit, Decimal) {
    match provider {
        "gcp" => (PriceUnit::Hour, Decimal::from_str("0.05").unwrap()),
        "azure" => (PriceUnit::Hour, Decimal::from_str("0.05").unwrap()),
        _ => (PriceUnit::Hour, Decimal::from_str("0.05").unwrap()),
    }
}

pub fn provider_of(resource_type: &str) -> &'static str {
    if resource_type.starts_with("gcp_") || resource_type.starts_with("google_") {
        "gcp"
    } else if resource_type.starts_with("azure") {
        "azure"
    } else {
        "aws"
    }
}

/// Looks up `resource` in the static catalog. Always returns a record —
/// this is the bottom of the resolution chain, so it degrades to the
/// nearest-family default rather than failing.
pub fn lookup(resource: &CanonicalResource) -> PriceRecord {
    if resource.is_unpriced_placeholder() {
        return PriceRecord::unknown(resource.region.clone());
    }

    let provider = provider_of(&resource.resource_type);
    let sku = format!("{}/{}", resource.resource_type, resource.size);
    let region = if resource.region.is_empty() || resource.region == "unknown" {
        reference_region(provider)
    } else {
        resource.region.as_str()
    };

    if let Some(entry) = TABLE.get(&(provider, sku.as_str(), region)) {
        return PriceRecord {
            unit: entry.unit,
            amount: Decimal::from_str(entry.amount).unwrap_or(Decimal::ZERO),
            currency: "USD".to_string(),
            confidence: Confidence::Medium,
            source: PriceSource::Static,
            sku,
            region: region.to_string(),
        };
    }

    // Region miss: the same sku is known in the provider's reference
    // region. Use it but downgrade confidence.
    let reference = reference_region(provider);
    if region != reference {
        if let Some(entry) = TABLE.get(&(provider, sku.as_str(), reference)) {
            return PriceRecord {
                unit: entry.unit,
                amount: Decimal::from_str(entry.amount).unwrap_or(Decimal::ZERO),
                currency: "USD".to_string(),
                confidence: Confidence::Low,
                source: PriceSource::Static,
                sku,
                region: region.to_string(),
            };
        }
    }

    // Total sku miss: nearest-family default, low confidence.
    let (unit, amount) = family_default(provider);
    PriceRecord {
        unit,
        amount,
        currency: "USD".to_string(),
        confidence: Confidence::Low,
        source: PriceSource::Static,
        sku,
        region: region.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resource(resource_type: &str, size: &str, region: &str) -> CanonicalResource {
        CanonicalResource {
            id: format!("{resource_type}.x"),
            resource_type: resource_type.to_string(),
            name: "x".to_string(),
            region: region.to_string(),
            size: size.to_string(),
            count: 1,
            tags: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn known_sku_is_medium_confidence() {
        let r = resource("aws_instance", "t3.medium", "us-east-1");
        let price = lookup(&r);
        assert_eq!(price.confidence, Confidence::Medium);
        assert!(price.amount > Decimal::ZERO);
    }

    #[test]
    fn unknown_sku_falls_back_to_low_confidence_family_default() {
        let r = resource("aws_instance", "x9.enormous", "us-east-1");
        let price = lookup(&r);
        assert_eq!(price.confidence, Confidence::Low);
    }

    #[test]
    fn region_miss_downgrades_confidence() {
        let r = resource("aws_instance", "t3.medium", "ap-southeast-2");
        let price = lookup(&r);
        assert_eq!(price.confidence, Confidence::Low);
        assert!(price.amount > Decimal::ZERO);
    }

    #[test]
    fn spanner_two_node_is_priced() {
        // Catalog rows are keyed on the canonical type the extractor
        // produces (`gcp_spanner_instance`), not the raw Terraform type
        // (`google_spanner_instance`) — match what `lookup` actually sees.
        let r = resource("gcp_spanner_instance", "2nodes", "us-central1");
        let price = lookup(&r);
        assert_eq!(price.confidence, Confidence::Medium);
        assert_eq!(price.amount, Decimal::from_str("1.80").unwrap());
    }
}
