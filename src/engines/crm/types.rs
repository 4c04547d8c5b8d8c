// Canonical Resource Model (CRM) — the provider-agnostic shape every IaC
// parser produces and every downstream component (pricing, estimator,
// policy) consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single billable unit of infrastructure, normalized away from any one
/// IaC dialect's syntax.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalResource {
    /// Stable id, unique within a [`CanonicalResourceModel`]. For Terraform
    /// this is `{type}.{name}`.
    pub id: String,
    /// Namespaced resource type, e.g. `aws_instance`, `gcp_compute_disk`.
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// `"global"` is a valid region for provider-wide resources such as a
    /// CDN distribution.
    pub region: String,
    /// Opaque, human-readable shape used for pricing lookups, e.g.
    /// `m5.large`, `pd-ssd/500GB`, `FARGATE/3tasks`.
    pub size: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_count() -> u32 {
    1
}

impl CanonicalResource {
    /// `true` once the parser has marked a resource as unknown to its
    /// extractor registry (see `unpriced_resource` risk flag).
    pub fn is_unpriced_placeholder(&self) -> bool {
        self.metadata
            .get("unpriced")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(|v| v.as_f64())
    }
}

/// Provider-agnostic resource graph produced by the IaC parser. Immutable
/// once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CanonicalResourceModel {
    pub resources: Vec<CanonicalResource>,
    /// Default region declared per provider (from `provider "aws" { region
    /// = ... }` blocks and equivalents).
    pub provider_defaults: HashMap<String, String>,
    pub source_iac_type: String,
}

impl CanonicalResourceModel {
    pub fn new(source_iac_type: impl Into<String>) -> Self {
        Self {
            resources: Vec::new(),
            provider_defaults: HashMap::new(),
            source_iac_type: source_iac_type.into(),
        }
    }

    /// Number of distinct resource entries (not expanded by `count`); this
    /// is the `resource_count` surfaced on [`crate::engines::estimator::CostResult`].
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}
