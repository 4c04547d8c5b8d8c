// Re-export the shared error model at the crate root for ergonomic `use`s.

pub use crate::engines::shared::error_model::{ErrorCategory, FinOpsError, Result, SourceLocation};
