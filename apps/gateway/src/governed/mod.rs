//! Quota-governed call sites: features that must pass a plan-limit check before the
//! gateway may call the model.
//!
//! Flow: rate-limit admission → ensure caller → usage snapshot → ai_calls limit check →
//!       gateway dispatch → record one usage unit (success only).
//!
//! Output parsing and its fallback live with each call site, not in the gateway.

pub mod assessment;
pub mod handlers;
pub mod quota_check;
pub mod resume_analysis;

use std::time::Instant;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::{AppError, TracedError};
use crate::gateway::envelope::{GatewayReply, GatewayRequest};
use crate::quota::{assert_within_limit, ledger, plan_limits, ResourceKind};
use crate::state::AppState;

/// Runs `request` through the gateway if the caller still has AI calls left this month.
pub async fn run_governed(
    state: &AppState,
    trace_id: Uuid,
    started: Instant,
    request: GatewayRequest,
    feature: &'static str,
) -> Result<GatewayReply, TracedError> {
    let admission = state.gateway.admit(trace_id, started, &request.caller_id)?;

    let store = state.store.as_ref();
    let internal = |e: anyhow::Error| AppError::Internal(e).traced(trace_id);

    let caller = store.ensure_caller(&request.caller_id).await.map_err(internal)?;
    let usage = ledger::snapshot(store, &caller.id).await.map_err(internal)?;

    if let Err(exceeded) =
        assert_within_limit(ResourceKind::AiCalls, plan_limits(caller.plan), &usage)
    {
        info!(
            trace_id = %trace_id,
            caller_id = %caller.id,
            plan = %caller.plan,
            feature,
            limit = %exceeded.limit,
            "AI call quota reached; upgrade required"
        );
        return Err(AppError::from(exceeded).traced(trace_id));
    }

    let reply = state.gateway.dispatch(trace_id, started, request, admission).await?;

    // Counters are eventually consistent; a failed write still returns the reply.
    if let Err(e) = ledger::record_ai_call(store, &caller.id, feature).await {
        error!(trace_id = %trace_id, caller_id = %caller.id, "Failed to record AI usage: {e:?}");
    }

    Ok(reply)
}
