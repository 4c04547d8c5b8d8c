// Terraform IaC parser (C2): a two-phase reduction from HCL source text to
// a [`CanonicalResourceModel`].
//
// Phase 1 (syntactic) parses the document into `hcl::Value`, then converts
// it through `serde_json::Value` into the same shape Terraform's own `show
// -json` config representation uses: `block_kind -> [type -> [name ->
// body]]` for resources, `block_kind -> [label -> body]` for providers.
// Phase 2 (semantic) walks that tree and hands each resource body to the
// extractor registry in [`extractors`].

pub mod expr;
pub mod extractors;

use crate::engines::crm::{CanonicalResource, CanonicalResourceModel};
use crate::errors::{FinOpsError, Result, SourceLocation};
use serde_json::Value;
use std::collections::HashMap;

pub fn parse_terraform(text: &str) -> Result<CanonicalResourceModel> {
    let parsed: hcl::Value = hcl::from_str(text).map_err(|e| {
        FinOpsError::parse_error(
            format!("failed to parse Terraform HCL: {e}"),
            location_from_hcl_error(&e),
        )
    })?;

    let body: Value = serde_json::to_value(&parsed).map_err(|e| {
        FinOpsError::internal(format!("failed to normalize parsed HCL to JSON: {e}"))
    })?;

    let mut model = CanonicalResourceModel::new("terraform");
    model.provider_defaults = collect_provider_defaults(&body);

    if let Some(resource_block) = body.get("resource").and_then(|v| v.as_object()) {
        for (raw_type, named) in resource_block {
            let Some(named) = named.as_object() else {
                continue;
            };
            for (name, resource_body) in named {
                model
                    .resources
                    .push(build_resource(&model, raw_type, name, resource_body));
            }
        }
    }

    Ok(model)
}

/// hcl-rs's parse error `Display` carries a `line:column` prefix; this is a
/// best-effort extraction, not a guarantee — unparseable locations fall
/// back to `(0, 0)` rather than failing the whole parse.
fn location_from_hcl_error(err: &hcl::Error) -> SourceLocation {
    let rendered = err.to_string();
    let digits = |s: &str| -> Option<u32> { s.chars().take_while(|c| c.is_ascii_digit()).collect::<String>().parse().ok() };

    let mut parts = rendered.splitn(3, [':', ',']);
    let _prefix = parts.next();
    let line = parts.next().and_then(digits).unwrap_or(0);
    let column = parts.next().and_then(digits).unwrap_or(0);
    SourceLocation { line, column }
}

fn collect_provider_defaults(body: &Value) -> HashMap<String, String> {
    let mut defaults = HashMap::new();
    let Some(providers) = body.get("provider").and_then(|v| v.as_object()) else {
        return defaults;
    };
    for (name, cfg) in providers {
        let cfg = match cfg {
            Value::Array(items) => items.first().unwrap_or(cfg),
            other => other,
        };
        if let Some(region) = expr::get_str(cfg, "region") {
            defaults.insert(name.clone(), region.to_string());
        }
    }
    defaults
}

fn build_resource(
    model: &CanonicalResourceModel,
    raw_type: &str,
    name: &str,
    resource_body: &Value,
) -> CanonicalResource {
    // A repeated `resource "type" "name" { ... }` block with the same
    // labels is array-ified by hcl-rs's JSON duality; only the first
    // instance is addressable by name so we take it and fold the rest's
    // `count` in, mirroring how Terraform treats duplicate addresses as an
    // error but our tolerant parser treats as "last one wins" duplication.
    let resource_body = match resource_body {
        Value::Array(items) => items.first().unwrap_or(resource_body),
        other => other,
    };

    let extracted = extractors::extract(raw_type, resource_body);

    let provider = raw_type.split('_').next().unwrap_or("");
    let provider_key = match provider {
        "google" => "google",
        "azurerm" => "azurerm",
        _ => "aws",
    };

    let region = extracted
        .region_override
        .or_else(|| expr::get_str(resource_body, "region").map(str::to_string))
        .or_else(|| model.provider_defaults.get(provider_key).cloned())
        .unwrap_or_else(|| "unknown".to_string());

    let count = expr::get_u64(resource_body, "count").unwrap_or(1) as u32;

    let tags = resource_body
        .get("tags")
        .and_then(|v| v.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let mut metadata = extracted.metadata;
    if !matches!(resource_body, Value::Object(_)) {
        metadata.insert("unpriced".to_string(), serde_json::json!(true));
    }
    if let Some(field) = expr::find_unresolved_reference(resource_body) {
        metadata.insert(
            "unresolved_reference".to_string(),
            serde_json::json!(field),
        );
    }

    CanonicalResource {
        id: format!("{raw_type}.{name}"),
        resource_type: extracted.canonical_type,
        name: name.to_string(),
        region,
        size: extracted.size,
        count,
        tags,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_aws_instance() {
        let hcl = r#"
            provider "aws" {
              region = "us-east-1"
            }

            resource "aws_instance" "web" {
              instance_type = "t3.medium"
              tags = {
                env = "prod"
              }
            }
        "#;

        let model = parse_terraform(hcl).expect("valid hcl");
        assert_eq!(model.resources.len(), 1);
        let r = &model.resources[0];
        assert_eq!(r.id, "aws_instance.web");
        assert_eq!(r.resource_type, "aws_instance");
        assert_eq!(r.size, "t3.medium");
        assert_eq!(r.region, "us-east-1");
        assert_eq!(r.tags.get("env"), Some(&"prod".to_string()));
    }

    #[test]
    fn unknown_resource_type_is_flagged_unpriced() {
        let hcl = r#"
            resource "aws_totally_made_up_widget" "thing" {
              foo = "bar"
            }
        "#;
        let model = parse_terraform(hcl).expect("valid hcl");
        assert_eq!(model.resources.len(), 1);
        assert!(model.resources[0].is_unpriced_placeholder());
    }

    #[test]
    fn invalid_hcl_is_a_parse_error() {
        let hcl = "resource \"aws_instance\" \"web\" { instance_type = ";
        let err = parse_terraform(hcl).unwrap_err();
        assert_eq!(err.id(), "parse_error");
    }

    #[test]
    fn glue_job_and_crawler_collapse_to_one_canonical_type() {
        let hcl = r#"
            resource "aws_glue_job" "etl" {
              name = "etl"
            }
            resource "aws_glue_crawler" "s3_crawler" {
              name = "crawler"
            }
        "#;
        let model = parse_terraform(hcl).expect("valid hcl");
        let types: Vec<_> = model.resources.iter().map(|r| r.resource_type.as_str()).collect();
        assert_eq!(types, vec!["aws_glue", "aws_glue"]);
    }

    #[test]
    fn unresolved_interpolation_is_flagged_on_the_resource() {
        let hcl = r#"
            resource "aws_lambda_function" "handler" {
              memory_size = 256
              runtime     = "python3.11"
              role        = aws_iam_role.lambda.arn
            }
        "#;
        let model = parse_terraform(hcl).expect("valid hcl");
        assert_eq!(model.resources.len(), 1);
        let r = &model.resources[0];
        assert_eq!(
            r.metadata.get("unresolved_reference").and_then(|v| v.as_str()),
            Some("role")
        );
    }

    #[test]
    fn plain_string_attributes_are_not_mistaken_for_references() {
        let hcl = r#"
            resource "aws_instance" "web" {
              instance_type = "t3.medium"
            }
        "#;
        let model = parse_terraform(hcl).expect("valid hcl");
        assert!(model.resources[0].metadata.get("unresolved_reference").is_none());
    }
}
