use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Top-level application error. Every variant maps to one HTTP status and a
/// JSON `{ error, details }` body.
///
/// An unusable chart payload is deliberately absent here: see
/// [`crate::normalizer::ChartRejection`].
#[derive(Debug, Error)]
pub enum AppError {
    // ── Request validation ───────────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String, details: String },

    // ── Attachment decoding ──────────────────────────────────────────────────
    #[error("Failed to process file content: {message}")]
    FileProcessing { message: String },

    // ── Model provider ───────────────────────────────────────────────────────
    #[error("Model provider error (HTTP {status}): {message}")]
    UpstreamProvider { status: u16, message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Wire shape of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::Validation { message: message.into(), details: details.into() }
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        AppError::FileProcessing { message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. } | AppError::FileProcessing { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::FileProcessing { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamProvider { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::Validation { message, details } => ErrorBody {
                error: message.clone(),
                details: details.clone(),
            },
            AppError::FileProcessing { message } => ErrorBody {
                error: "Failed to process file content".to_string(),
                details: message.clone(),
            },
            AppError::UpstreamProvider { message, .. } => ErrorBody {
                error: "API Processing Error".to_string(),
                details: message.clone(),
            },
            AppError::Unexpected(message) => ErrorBody {
                error: "API Processing Error".to_string(),
                details: message.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = AppError::validation("Model selection is required", "missing `model`");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().error, "Model selection is required");
        assert!(err.is_validation());
    }

    #[test]
    fn upstream_status_is_mirrored() {
        let err = AppError::UpstreamProvider { status: 429, message: "slow down".into() };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.body().error, "API Processing Error");
        assert_eq!(err.body().details, "slow down");
    }

    #[test]
    fn out_of_range_upstream_status_falls_back_to_500() {
        let err = AppError::UpstreamProvider { status: 42, message: "odd".into() };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
