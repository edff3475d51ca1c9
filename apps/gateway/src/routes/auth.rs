use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::errors::{AppError, TracedError};

/// Checks `Authorization: Bearer <key>` against the configured gateway key.
/// With no key configured every request passes.
pub fn require_bearer(
    expected: Option<&str>,
    headers: &HeaderMap,
    trace_id: Uuid,
) -> Result<(), TracedError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => {
            tracing::warn!(trace_id = %trace_id, "Rejected request with missing or bad bearer token");
            Err(AppError::Unauthorized.traced(trace_id))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
