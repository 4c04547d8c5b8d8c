// Shared utilities and models used across engines.

pub mod cancellation;
pub mod error_model;
