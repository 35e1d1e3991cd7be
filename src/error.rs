//! Error types for the analysis service.
//!
//! Every failure a request can hit maps to one of these kinds, and each
//! kind maps to a fixed HTTP status. Analyzer-output anomalies (empty or
//! unparseable stdout) are deliberately *not* errors; they are absorbed
//! into the analysis outcome instead.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use thiserror::Error;

/// All error kinds surfaced by the service.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Bad, missing, or oversized request input. The analyzer is never
    /// invoked when this is raised.
    #[error("{0}")]
    Validation(String),

    /// Repository fetch failed (auth, network, branch-not-found). Not
    /// retried; the workspace is already cleaned up when this propagates.
    #[error("failed to clone repository: {0}")]
    Clone(String),

    /// No matching source files could be located in the repository.
    #[error("{0}")]
    SourcesNotFound(String),

    /// The analyzer exceeded its wall-clock deadline and was terminated.
    #[error("analysis timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    /// The analyzer binary is not installed or not on PATH. Distinct from
    /// a zero-finding result.
    #[error("analyzer unavailable: {0}")]
    ToolUnavailable(String),

    /// Anything unanticipated.
    #[error("server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuditError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditError::Validation(_) => "validation_error",
            AuditError::Clone(_) => "clone_error",
            AuditError::SourcesNotFound(_) => "not_found_error",
            AuditError::Timeout { .. } => "timeout_error",
            AuditError::ToolUnavailable(_) => "tool_unavailable_error",
            AuditError::Internal(_) => "server_error",
        }
    }
}

impl ResponseError for AuditError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuditError::Validation(_) => StatusCode::BAD_REQUEST,
            AuditError::Clone(_) => StatusCode::BAD_GATEWAY,
            AuditError::SourcesNotFound(_) => StatusCode::NOT_FOUND,
            AuditError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AuditError::ToolUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuditError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "error_kind": self.kind(),
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuditError>;
