//! Admission-likelihood assessment: the `predict` mode behind the AI-call quota.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AppError, TracedError};
use crate::gateway::envelope::validate_for_mode;
use crate::gateway::mode::Mode;
use crate::governed::run_governed;
use crate::llm_client::Usage;
use crate::state::AppState;

pub const FEATURE: &str = "assessment";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub assessment: String,
    pub usage: Usage,
    pub trace_id: Uuid,
}

pub async fn run_assessment(
    state: &AppState,
    trace_id: Uuid,
    body: &[u8],
) -> Result<AssessmentResponse, TracedError> {
    let started = Instant::now();
    let request = validate_for_mode(Mode::Predict, body)
        .map_err(|issues| AppError::Validation(issues).traced(trace_id))?;

    let reply = run_governed(state, trace_id, started, request, FEATURE).await?;

    Ok(AssessmentResponse {
        assessment: reply.content,
        usage: reply.usage,
        trace_id: reply.trace_id,
    })
}
