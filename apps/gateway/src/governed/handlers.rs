//! Axum route handlers for the quota-governed features.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, FieldIssue, TracedError};
use crate::governed::assessment::{run_assessment, AssessmentResponse};
use crate::governed::quota_check::{check_quota, usage_report, QuotaCheckRequest, UsageReport};
use crate::governed::resume_analysis::{run_resume_analysis, ResumeAnalysisResponse};
use crate::routes::auth::require_bearer;
use crate::state::AppState;

/// POST /api/v1/assessments
pub async fn handle_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AssessmentResponse>, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;
    Ok(Json(run_assessment(&state, trace_id, &body).await?))
}

/// POST /api/v1/resume/analyze
pub async fn handle_resume_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ResumeAnalysisResponse>, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;
    Ok(Json(run_resume_analysis(&state, trace_id, &body).await?))
}

/// POST /api/v1/quota/check
///
/// 204 when the caller may create one more of `feature`, 402 when an upgrade is needed.
pub async fn handle_quota_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;

    let request: QuotaCheckRequest = serde_json::from_slice(&body).map_err(|e| {
        AppError::Validation(vec![FieldIssue::new("body", e.to_string())]).traced(trace_id)
    })?;

    check_quota(state.store.as_ref(), &request)
        .await
        .map_err(|e| e.traced(trace_id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    pub caller_id: Option<String>,
}

/// GET /api/v1/usage?callerId=
pub async fn handle_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageReport>, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;

    let report = usage_report(state.store.as_ref(), query.caller_id.as_deref(), trace_id)
        .await
        .map_err(|e| e.traced(trace_id))?;
    Ok(Json(report))
}
