//! Axum route handlers for the AI Gateway.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TracedError;
use crate::gateway::envelope::GatewayReply;
use crate::gateway::mode::Mode;
use crate::gateway::scope::resolve_scope_lenient;
use crate::routes::auth::require_bearer;
use crate::state::AppState;

/// POST /api/v1/ai/gateway
///
/// The body is parsed by the gateway itself so that malformed JSON still gets a
/// trace id and a field-level error.
pub async fn handle_gateway(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GatewayReply>, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;

    let reply = state.gateway.handle(trace_id, &body).await?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeResponse {
    pub mode: Mode,
    pub categories: Vec<&'static str>,
}

/// GET /api/v1/ai/scope?mode=
///
/// Lists the data categories a mode is allowed to read. Unknown modes report the
/// coach scope, which is what the resolver falls back to.
pub async fn handle_scope(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ScopeResponse>, TracedError> {
    let trace_id = Uuid::new_v4();
    require_bearer(state.config.gateway_api_key.as_deref(), &headers, trace_id)?;

    Ok(Json(ScopeResponse {
        mode: Mode::or_coach(&query.mode),
        categories: resolve_scope_lenient(&query.mode, None).categories(),
    }))
}
