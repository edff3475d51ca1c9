//! Gateway Dispatcher: the single entry point for AI calls.
//!
//! Flow: validate → rate-limit → resolve scope → fetch context → build prompt →
//!       generate (with timeout) → reply.
//!
//! Strictly linear, no internal retries. Rejections before the fetch cost no I/O.
//! Every outcome emits one structured log line keyed by `trace_id`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, TracedError};
use crate::gateway::envelope::{self, GatewayReply, GatewayRequest};
use crate::gateway::prompts::build_prompt;
use crate::gateway::rate_limit::RateLimiter;
use crate::gateway::scope::{fetch_context, resolve_scope};
use crate::llm_client::{Generation, Generator, LlmError};
use crate::store::ContextStore;

/// Proof that a request holds a rate-limit slot. Only `Gateway::admit` creates one,
/// and `dispatch` consumes it, so a request is admitted exactly once.
#[derive(Debug)]
pub struct Admission {
    _slot: (),
}

pub struct Gateway {
    store: Arc<dyn ContextStore>,
    generator: Arc<dyn Generator>,
    limiter: Arc<RateLimiter>,
    llm_timeout: Duration,
}

impl Gateway {
    pub fn new(
        store: Arc<dyn ContextStore>,
        generator: Arc<dyn Generator>,
        limiter: Arc<RateLimiter>,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            limiter,
            llm_timeout,
        }
    }

    /// Handles a raw request body end to end.
    pub async fn handle(&self, trace_id: Uuid, body: &[u8]) -> Result<GatewayReply, TracedError> {
        let started = Instant::now();

        let request = match envelope::validate(body) {
            Ok(request) => request,
            Err(issues) => {
                let err = AppError::Validation(issues);
                log_failure(trace_id, &err, started);
                return Err(err.traced(trace_id));
            }
        };

        let admission = self.admit(trace_id, started, &request.caller_id)?;
        self.dispatch(trace_id, started, request, admission).await
    }

    /// Takes one rate-limit slot for `caller_id`. Runs before any store or model work,
    /// so governed call sites admit first and only then consult the quota.
    pub fn admit(
        &self,
        trace_id: Uuid,
        started: Instant,
        caller_id: &str,
    ) -> Result<Admission, TracedError> {
        if self.limiter.allow(caller_id) {
            Ok(Admission { _slot: () })
        } else {
            let err = AppError::RateLimited;
            log_failure(trace_id, &err, started);
            Err(err.traced(trace_id))
        }
    }

    /// Runs an already-validated, already-admitted request.
    pub async fn dispatch(
        &self,
        trace_id: Uuid,
        started: Instant,
        request: GatewayRequest,
        _admission: Admission,
    ) -> Result<GatewayReply, TracedError> {
        match self.run(&request).await {
            Ok(generation) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                info!(
                    trace_id = %trace_id,
                    mode = %request.mode(),
                    caller_id = %request.caller_id,
                    latency_ms,
                    input_tokens = generation.usage.input_tokens,
                    output_tokens = generation.usage.output_tokens,
                    "gateway request succeeded"
                );
                Ok(GatewayReply {
                    content: generation.content,
                    usage: generation.usage,
                    trace_id,
                })
            }
            Err(err) => {
                log_failure(trace_id, &err, started);
                Err(err.traced(trace_id))
            }
        }
    }

    async fn run(&self, request: &GatewayRequest) -> Result<Generation, AppError> {
        let scope = resolve_scope(&request.params);
        let context = fetch_context(self.store.as_ref(), &request.caller_id, &scope).await?;

        let prompt = build_prompt(&request.params, &context);

        match tokio::time::timeout(self.llm_timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(generation)) => Ok(generation),
            Ok(Err(e)) => Err(AppError::Upstream(e)),
            Err(_) => Err(AppError::Upstream(LlmError::Timeout(
                self.llm_timeout.as_secs(),
            ))),
        }
    }
}

fn log_failure(trace_id: Uuid, err: &AppError, started: Instant) {
    let latency_ms = started.elapsed().as_millis() as u64;
    match err {
        AppError::Validation(_) | AppError::RateLimited | AppError::Unauthorized => {
            warn!(trace_id = %trace_id, error = %err, latency_ms, "gateway request rejected")
        }
        _ => error!(trace_id = %trace_id, error = %err, latency_ms, "gateway request failed"),
    }
}
