// Table-driven extractor registry (C2 semantic pass).
//
// Each entry maps the *raw* Terraform resource type (as written in source)
// to a canonical type name and a pure function that reduces the resource's
// attribute body to the billing-salient `size`/`region`/`metadata` fields
// described in the specification. New resource types are added by
// appending a row to `extractor_for`; there is no trait hierarchy to
// extend.

use super::expr::{get_block, get_bool, get_f64, get_path, get_str, get_u64};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Output of a single extractor invocation, before the caller fills in
/// `id`/`name`/`count`/`tags`.
pub struct Extracted {
    pub canonical_type: String,
    pub size: String,
    /// `Some` overrides whatever region the generic resolver would pick
    /// (provider default, zone attribute, ...). Used for provider-global
    /// resources like a CDN distribution.
    pub region_override: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl Extracted {
    fn new(canonical_type: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            canonical_type: canonical_type.into(),
            size: size.into(),
            region_override: None,
            metadata: HashMap::new(),
        }
    }

    fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_override = Some(region.into());
        self
    }

    fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Unknown-type fallback described in the specification's failure model:
/// recorded, zero-cost, low confidence, flagged.
pub fn unknown_extractor(raw_type: &str, _body: &Value) -> Extracted {
    Extracted::new(raw_type, "unknown").with_meta("unpriced", json!(true))
}

/// Looks up and runs the extractor for `raw_type`, falling back to
/// [`unknown_extractor`] when the type is not in the registry.
pub fn extract(raw_type: &str, body: &Value) -> Extracted {
    match raw_type {
        "aws_instance" => {
            let instance_type = get_str(body, "instance_type").unwrap_or("t3.micro");
            Extracted::new(raw_type, instance_type)
        }
        "aws_rds_instance" | "aws_db_instance" => {
            let class = get_str(body, "instance_class").unwrap_or("db.t3.micro");
            Extracted::new("aws_rds_instance", class)
        }
        "aws_lambda_function" => {
            let memory_mb = get_u64(body, "memory_size").unwrap_or(128);
            let runtime = get_str(body, "runtime").unwrap_or("unknown");
            Extracted::new(raw_type, format!("{memory_mb}MB/{runtime}"))
                .with_meta("memory_mb", json!(memory_mb))
        }
        "aws_s3_bucket" => {
            let storage_class = get_str(body, "storage_class").unwrap_or("STANDARD");
            Extracted::new(raw_type, storage_class)
        }
        "aws_ecs_cluster" => Extracted::new(raw_type, "cluster"),
        "aws_ecs_service" => {
            let launch_type = get_str(body, "launch_type").unwrap_or("EC2");
            let desired_count = get_u64(body, "desired_count").unwrap_or(1);
            Extracted::new(raw_type, format!("{launch_type}/{desired_count}tasks"))
                .with_meta("desired_count", json!(desired_count))
        }
        "aws_ecs_task_definition" => {
            let cpu = get_str(body, "cpu").unwrap_or("256").to_string();
            let memory = get_str(body, "memory").unwrap_or("512").to_string();
            Extracted::new(raw_type, format!("{cpu}cpu/{memory}mb"))
                .with_meta("cpu", json!(cpu))
                .with_meta("memory", json!(memory))
        }
        "aws_kinesis_stream" => {
            let shard_count = get_u64(body, "shard_count").unwrap_or(1);
            Extracted::new(raw_type, format!("{shard_count}shards"))
                .with_meta("shard_count", json!(shard_count))
        }
        "aws_sns_topic" => Extracted::new(raw_type, "topic"),
        "aws_sqs_queue" => {
            let fifo = get_bool(body, "fifo_queue").unwrap_or(false);
            Extracted::new(raw_type, if fifo { "fifo" } else { "standard" })
        }
        "aws_sfn_state_machine" => {
            let kind = get_str(body, "type").unwrap_or("STANDARD");
            Extracted::new(raw_type, kind)
        }
        "aws_apigatewayv2_api" => {
            let protocol = get_str(body, "protocol_type").unwrap_or("HTTP");
            Extracted::new("aws_api_gateway", protocol)
        }
        "aws_api_gateway_rest_api" => Extracted::new("aws_api_gateway", "REST"),
        "aws_cloudfront_distribution" => {
            let price_class = get_str(body, "price_class").unwrap_or("PriceClass_All");
            Extracted::new(raw_type, price_class).with_region("global")
        }
        "aws_neptune_cluster" => {
            let instance_class = get_str(body, "instance_class").unwrap_or("db.t3.medium");
            Extracted::new(raw_type, instance_class)
        }
        "aws_docdb_cluster" => {
            let instance_class = get_str(body, "instance_class").unwrap_or("db.t3.medium");
            Extracted::new(raw_type, instance_class)
        }
        "aws_msk_cluster" => {
            let instance_type = get_str(body, "instance_type").unwrap_or("kafka.m5.large");
            Extracted::new(raw_type, instance_type)
        }
        "aws_emr_cluster" => {
            let master = get_str(body, "master_instance_type").unwrap_or("m5.xlarge");
            Extracted::new(raw_type, master)
        }
        "aws_glue_job" => Extracted::new("aws_glue", "job"),
        "aws_glue_crawler" => Extracted::new("aws_glue", "crawler"),
        "aws_athena_workgroup" => Extracted::new(raw_type, "workgroup"),
        "aws_apprunner_service" => {
            let cfg = get_block(body, "instance_configuration");
            let cpu = cfg.and_then(|c| get_f64(c, "cpu")).unwrap_or(1.0);
            let memory = cfg.and_then(|c| get_f64(c, "memory")).unwrap_or(2.0);
            Extracted::new(raw_type, format!("{cpu}vCPU/{memory}GB"))
        }

        "google_compute_instance" => {
            let machine_type = get_str(body, "machine_type").unwrap_or("e2-medium");
            let region = get_str(body, "zone").or_else(|| get_str(body, "region"));
            let mut ex = Extracted::new("gcp_compute_instance", machine_type);
            if let Some(r) = region {
                ex = ex.with_region(r);
            }
            ex
        }
        "google_compute_disk" => {
            let disk_type = get_str(body, "type").unwrap_or("pd-standard");
            let size_gb = get_u64(body, "size").unwrap_or(10);
            let region = get_str(body, "zone").or_else(|| get_str(body, "region"));
            let mut ex = Extracted::new("gcp_compute_disk", format!("{disk_type}/{size_gb}GB"))
                .with_meta("size_gb", json!(size_gb));
            if let Some(r) = region {
                ex = ex.with_region(r);
            }
            ex
        }
        "google_filestore_instance" => {
            let tier = get_str(body, "tier").unwrap_or("STANDARD");
            let capacity_gb = get_path(body, &["file_shares", "capacity_gb"])
                .and_then(|v| v.as_u64())
                .unwrap_or(1024);
            Extracted::new("gcp_filestore_instance", format!("{tier}/{capacity_gb}GB"))
                .with_meta("capacity_gb", json!(capacity_gb))
        }
        "google_pubsub_topic" => Extracted::new("gcp_pubsub_topic", "topic"),
        "google_dataflow_job" => {
            let machine_type = get_str(body, "machine_type").unwrap_or("n1-standard-1");
            let max_workers = get_u64(body, "max_workers").unwrap_or(1);
            Extracted::new(
                "gcp_dataflow_job",
                format!("{machine_type}/{max_workers}workers"),
            )
            .with_meta("max_workers", json!(max_workers))
        }
        "google_composer_environment" => {
            let machine_type = get_path(body, &["config", "node_config", "machine_type"])
                .and_then(|v| v.as_str())
                .unwrap_or("n1-standard-2")
                .to_string();
            let node_count = get_path(body, &["config"])
                .and_then(|c| get_u64(c, "node_count"))
                .unwrap_or(3);
            Extracted::new(
                "gcp_composer_environment",
                format!("{machine_type}/{node_count}nodes"),
            )
            .with_meta("node_count", json!(node_count))
        }
        "google_dataproc_cluster" => {
            let master_type = get_path(body, &["cluster_config", "master_config", "machine_type"])
                .and_then(|v| v.as_str())
                .unwrap_or("n1-standard-4")
                .to_string();
            let worker_count = get_path(body, &["cluster_config", "worker_config"])
                .and_then(|c| get_u64(c, "num_instances"))
                .unwrap_or(2);
            Extracted::new(
                "gcp_dataproc_cluster",
                format!("{master_type}/{worker_count}workers"),
            )
            .with_meta("worker_count", json!(worker_count))
        }
        "google_spanner_instance" => {
            if let Some(pu) = get_u64(body, "processing_units") {
                Extracted::new("gcp_spanner_instance", format!("{pu}PU"))
            } else {
                let num_nodes = get_u64(body, "num_nodes").unwrap_or(1);
                Extracted::new("gcp_spanner_instance", format!("{num_nodes}nodes"))
            }
        }
        "google_notebooks_instance" => {
            let machine_type = get_str(body, "machine_type").unwrap_or("n1-standard-4");
            Extracted::new("gcp_notebooks_instance", machine_type)
        }
        "google_compute_security_policy" => {
            Extracted::new("gcp_cloud_armor", "policy").with_region("global")
        }

        other => unknown_extractor(other, body),
    }
}
