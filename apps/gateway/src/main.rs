mod config;
mod db;
mod errors;
mod gateway;
mod governed;
mod llm_client;
mod models;
mod quota;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::rate_limit::{RateLimiter, MAX_REQUESTS, WINDOW};
use crate::gateway::Gateway;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgContextStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MBA gateway v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    let store = Arc::new(PgContextStore::new(db));

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout_secs
    );

    // Rate limiter: sliding window per caller, swept of idle buckets once per window
    let limiter = Arc::new(RateLimiter::default());
    limiter.clone().spawn_sweeper();
    info!(
        "Rate limiter: {} requests per {}s per caller",
        MAX_REQUESTS,
        WINDOW.as_secs()
    );

    let gateway = Gateway::new(
        store.clone(),
        llm,
        limiter,
        Duration::from_secs(config.llm_timeout_secs),
    );
    if config.gateway_api_key.is_none() {
        info!("GATEWAY_API_KEY not set; bearer auth disabled");
    }

    // Build app state
    let state = AppState {
        store,
        gateway: Arc::new(gateway),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
