pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::gateway::handlers as gateway_handlers;
use crate::governed::handlers as governed_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // AI Gateway
        .route("/api/v1/ai/gateway", post(gateway_handlers::handle_gateway))
        .route("/api/v1/ai/scope", get(gateway_handlers::handle_scope))
        // Quota-governed features
        .route(
            "/api/v1/assessments",
            post(governed_handlers::handle_assessment),
        )
        .route(
            "/api/v1/resume/analyze",
            post(governed_handlers::handle_resume_analysis),
        )
        .route(
            "/api/v1/quota/check",
            post(governed_handlers::handle_quota_check),
        )
        .route("/api/v1/usage", get(governed_handlers::handle_usage))
        .with_state(state)
}
