//! Error handling module
//!
//! Two error classes reach callers: validation errors raised at the boundary
//! before the orchestrator runs, and orchestration errors raised by the
//! orchestrator itself, each carrying the prefix of the stage that failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Orchestration failures, one per public operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Governance evaluation failed: {0}")]
    Evaluation(String),

    #[error("RBAC resolution failed: {0}")]
    Rbac(String),

    #[error("FinOps summary failed: {0}")]
    FinOps(String),

    #[error("Audit signal emission failed: {0}")]
    AuditEmission(String),
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Governance(e) => {
                error!("Orchestration error: {}", e);
                (StatusCode::BAD_GATEWAY, "ORCHESTRATION_ERROR")
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message: self.to_string(),
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}
