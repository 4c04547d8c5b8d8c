// Canonical Resource Model (C1): the types every other component shares.

pub mod types;

pub use types::{CanonicalResource, CanonicalResourceModel};
