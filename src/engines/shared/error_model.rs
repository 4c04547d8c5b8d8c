// Stable, caller-visible error model shared by every component of the core.
//
// Every variant here corresponds 1:1 to an error kind named in the
// specification's error handling design: parsing/validation errors surface
// directly, pricing errors are recovered locally by the pricing factory and
// never reach this type, store failures are reported but do not invalidate
// an already-computed result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category used to bucket errors for metrics/logging without inspecting
/// the message string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    ParseError,
    PolicyViolation,
    NotFound,
    Conflict,
    PricingUnavailable,
    Cancelled,
    InternalError,
}

/// A location within parsed IaC text, used to make `parse_error` actionable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Caller-visible error kinds for the FinOpsGuard core.
///
/// Matches the error kinds enumerated in the specification's error handling
/// design section verbatim; `id()` gives each variant the stable identifier
/// an outer HTTP layer would map to a status code.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum FinOpsError {
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    #[error("invalid_payload_encoding: {0}")]
    InvalidPayloadEncoding(String),

    #[error("parse_error at {location}: {message}")]
    ParseError {
        message: String,
        location: SourceLocation,
    },

    #[error("policy_not_found: {0}")]
    PolicyNotFound(String),

    #[error("analysis_not_found: {0}")]
    AnalysisNotFound(String),

    #[error("policy_exists: {0}")]
    PolicyExists(String),

    #[error("pricing_unavailable: {0}")]
    PricingUnavailable(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal_error: {message}")]
    InternalError {
        message: String,
        context: Option<serde_json::Value>,
    },
}

impl FinOpsError {
    /// Stable machine-readable identifier for this error kind.
    pub fn id(&self) -> &'static str {
        match self {
            FinOpsError::InvalidRequest(_) => "invalid_request",
            FinOpsError::InvalidPayloadEncoding(_) => "invalid_payload_encoding",
            FinOpsError::ParseError { .. } => "parse_error",
            FinOpsError::PolicyNotFound(_) => "policy_not_found",
            FinOpsError::AnalysisNotFound(_) => "analysis_not_found",
            FinOpsError::PolicyExists(_) => "policy_exists",
            FinOpsError::PricingUnavailable(_) => "pricing_unavailable",
            FinOpsError::Cancelled => "cancelled",
            FinOpsError::InternalError { .. } => "internal_error",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FinOpsError::InvalidRequest(_) | FinOpsError::InvalidPayloadEncoding(_) => {
                ErrorCategory::InvalidInput
            }
            FinOpsError::ParseError { .. } => ErrorCategory::ParseError,
            FinOpsError::PolicyNotFound(_) => ErrorCategory::NotFound,
            FinOpsError::AnalysisNotFound(_) => ErrorCategory::NotFound,
            FinOpsError::PolicyExists(_) => ErrorCategory::Conflict,
            FinOpsError::PricingUnavailable(_) => ErrorCategory::PricingUnavailable,
            FinOpsError::Cancelled => ErrorCategory::Cancelled,
            FinOpsError::InternalError { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        FinOpsError::ParseError {
            message: message.into(),
            location,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        FinOpsError::InternalError {
            message: message.into(),
            context: None,
        }
    }

    pub fn internal_with_context(message: impl Into<String>, context: serde_json::Value) -> Self {
        FinOpsError::InternalError {
            message: message.into(),
            context: Some(context),
        }
    }

    /// Log this error at the appropriate level with its id/category/context
    /// attached as structured fields. `internal_error` must always be
    /// logged with context per the error handling design.
    pub fn log(&self) {
        match self {
            FinOpsError::InternalError { message, context } => {
                tracing::error!(id = self.id(), context = ?context, "{message}");
            }
            FinOpsError::Cancelled => {
                tracing::warn!(id = self.id(), "check cancelled");
            }
            other => {
                tracing::debug!(id = self.id(), "{other}");
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FinOpsError>;
