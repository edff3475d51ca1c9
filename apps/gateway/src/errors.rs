use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::quota::QuotaExceeded;

/// One field-level validation problem, returned verbatim to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Application-level error taxonomy.
/// Wrap in `TracedError` before returning from a handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0:?}")]
    Validation(Vec<FieldIssue>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("{0}")]
    QuotaExceeded(#[from] QuotaExceeded),

    #[error("Upstream generation failure: {0}")]
    Upstream(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn traced(self, trace_id: Uuid) -> TracedError {
        TracedError {
            trace_id,
            error: self,
        }
    }
}

/// An `AppError` bound to the request's trace id. Every error body carries `traceId`.
#[derive(Debug, Error)]
#[error("[{trace_id}] {error}")]
pub struct TracedError {
    pub trace_id: Uuid,
    pub error: AppError,
}

impl IntoResponse for TracedError {
    fn into_response(self) -> Response {
        let trace_id = self.trace_id.to_string();
        let status = self.error.status();

        let body = match &self.error {
            AppError::Validation(issues) => json!({ "error": issues, "traceId": trace_id }),
            AppError::Unauthorized => json!({ "error": "unauthorized", "traceId": trace_id }),
            AppError::RateLimited => json!({ "error": "rate_limited", "traceId": trace_id }),
            AppError::QuotaExceeded(q) => json!({
                "error": "upgrade_required",
                "feature": q.feature,
                "limit": q.limit,
                "traceId": trace_id,
            }),
            // Provider and store detail stays in the logs.
            AppError::Upstream(e) => {
                tracing::error!(trace_id = %trace_id, "Upstream generation error: {e}");
                json!({ "error": "internal_error", "traceId": trace_id })
            }
            AppError::Internal(e) => {
                tracing::error!(trace_id = %trace_id, "Internal error: {e:?}");
                json!({ "error": "internal_error", "traceId": trace_id })
            }
        };

        (status, Json(body)).into_response()
    }
}
