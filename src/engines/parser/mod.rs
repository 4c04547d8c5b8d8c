// IaC Parser (C2): dispatches on declared IaC type to a concrete parser.
//
// Terraform HCL is the only dialect implemented; CloudFormation and
// Pulumi are named as Non-goals and rejected with `invalid_request` rather
// than silently misparsed.

pub mod terraform;

use crate::engines::crm::CanonicalResourceModel;
use crate::errors::{FinOpsError, Result};

pub fn parse(text: &str, iac_type: &str) -> Result<CanonicalResourceModel> {
    match iac_type {
        "terraform" => terraform::parse_terraform(text),
        other => Err(FinOpsError::InvalidRequest(format!(
            "unsupported iac_type: {other}"
        ))),
    }
}
