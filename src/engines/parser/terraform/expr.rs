// Small helpers for reading attribute values out of the JSON-shaped body
// produced by the syntactic pass. HCL's numbers, booleans and strings all
// decode cleanly into the matching `serde_json::Value` variant; Terraform
// resource-address interpolations (`aws_ecs_cluster.app.id`) and other
// unresolved expressions decode as strings already, since hcl-rs renders
// anything it cannot reduce to a literal as its textual form.

use serde_json::Value;

pub fn get_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(|v| v.as_str())
}

pub fn get_u64(body: &Value, key: &str) -> Option<u64> {
    body.get(key).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse::<u64>().ok()))
    })
}

pub fn get_f64(body: &Value, key: &str) -> Option<f64> {
    body.get(key).and_then(|v| {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.parse::<f64>().ok()))
    })
}

pub fn get_bool(body: &Value, key: &str) -> Option<bool> {
    body.get(key).and_then(|v| v.as_bool())
}

/// Looks up a nested block that HCL's JSON duality may have array-ified
/// (repeated blocks with no distinguishing label become a JSON array; a
/// single occurrence may or may not be wrapped depending on source shape).
/// Returns the first element either way.
pub fn get_block<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    match body.get(key)? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Looks up a value that may be nested one level further (e.g. Terraform
/// configs that nest config blocks inside config blocks, as Dataproc does
/// with `cluster_config.master_config.machine_type`).
pub fn get_path<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = body;
    for segment in path {
        cur = get_block(cur, segment)?;
    }
    Some(cur)
}

/// `true` for a string that is a Terraform resource-address interpolation
/// left unresolved by the syntactic pass: either wrapped in `${...}`, or a
/// bare `type.name.attr`-shaped traversal (hcl-rs renders both forms as
/// plain text once it gives up reducing them to a literal).
fn looks_like_unresolved_reference(value: &str) -> bool {
    if value.contains("${") {
        return true;
    }
    let is_ident_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    if value.is_empty() || !value.chars().all(|c| is_ident_char(c) || c == '.') {
        return false;
    }
    let segments: Vec<&str> = value.split('.').collect();
    segments.len() >= 3 && segments.iter().all(|s| !s.is_empty())
}

/// Scans `body`'s top-level attributes for the first value that looks like
/// an unresolved interpolation and returns its field name. Does not
/// recurse into nested blocks (`tags`, config sub-blocks) — those are not
/// the billing-salient attributes the estimator cares about downgrading.
pub fn find_unresolved_reference(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    object
        .iter()
        .find(|(_, v)| {
            v.as_str()
                .map(looks_like_unresolved_reference)
                .unwrap_or(false)
        })
        .map(|(k, _)| k.clone())
}
