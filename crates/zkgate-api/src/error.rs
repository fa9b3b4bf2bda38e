//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from zkgate-pipeline, zkgate-archive, and
//! zkgate-verify to HTTP status codes. Returns JSON error bodies with a
//! machine-readable code, message, and optional details. Internal error
//! details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use zkgate_archive::ArchiveError;
use zkgate_pipeline::PipelineError;
use zkgate_verify::VerifyError;

/// Structured JSON error response body.
///
/// Every error response across the API surface uses this envelope. The
/// `details` field carries stage diagnostics for 502 responses and is
/// omitted for 500-class errors to prevent information leakage.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "STAGE_TIMEOUT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for client-attributable errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type implementing [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A pipeline stage was invoked out of order or over an unusable
    /// artifact (400).
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Authentication failure (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state, including a stage already in
    /// flight for the session (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stage produced output the pipeline could not use (422).
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),

    /// An external tool failed; exit status and diagnostics are carried
    /// in `details` (502).
    #[error("external process failure: {message}")]
    UpstreamFailure {
        /// Summary of which stage failed.
        message: String,
        /// Exit code and captured diagnostics.
        details: Option<serde_json::Value>,
    },

    /// An external tool exceeded its wall-clock limit (504).
    #[error("stage timed out: {0}")]
    StageTimeout(String),

    /// Internal server error (500). Logged, never returned to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PreconditionNotMet(_) => (StatusCode::BAD_REQUEST, "PRECONDITION_NOT_MET"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::MalformedArtifact(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_ARTIFACT")
            }
            Self::UpstreamFailure { .. } => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_PROCESS_FAILURE")
            }
            Self::StageTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "STAGE_TIMEOUT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match self {
            Self::UpstreamFailure { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Map pipeline errors onto the HTTP taxonomy.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::PreconditionNotMet { .. } => Self::PreconditionNotMet(err.to_string()),
            PipelineError::StageInFlight => Self::Conflict(err.to_string()),
            PipelineError::ExternalProcessFailure {
                ref exit_code,
                ref diagnostics,
                ..
            } => Self::UpstreamFailure {
                details: Some(serde_json::json!({
                    "exit_code": exit_code,
                    "diagnostics": diagnostics,
                })),
                message: err.to_string(),
            },
            PipelineError::Timeout { .. } => Self::StageTimeout(err.to_string()),
            PipelineError::MalformedArtifact { .. } => Self::MalformedArtifact(err.to_string()),
            PipelineError::WorkersUnavailable | PipelineError::Io(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Map archive errors onto the HTTP taxonomy.
impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::NotFound(_) => Self::NotFound(err.to_string()),
            ArchiveError::InvalidBlob { .. } => Self::Validation(err.to_string()),
            ArchiveError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            ArchiveError::DigestMismatch { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Verification infrastructure failures are internal; a proof that merely
/// fails to verify is a 200 with a verdict, never an error.
impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<zkgate_core::ValidationError> for AppError {
    fn from(err: zkgate_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
