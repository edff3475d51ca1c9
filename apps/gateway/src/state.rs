use std::sync::Arc;

use crate::config::Config;
use crate::gateway::Gateway;
use crate::store::ContextStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Caller-owned data and usage counters. Default: PgContextStore.
    pub store: Arc<dyn ContextStore>,
    /// The AI Gateway; owns the rate limiter and the generation capability.
    pub gateway: Arc<Gateway>,
    pub config: Config,
}
