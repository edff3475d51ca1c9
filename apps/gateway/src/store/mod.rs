//! Data store seam. The gateway only ever reads caller-owned rows through this trait,
//! and the monthly AI-call counter is the only thing it writes.
//!
//! Carried in `AppState` as `Arc<dyn ContextStore>`; `PgContextStore` in production.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::caller::Caller;
use crate::quota::UsageSnapshot;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgContextStore;

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Returns the caller, creating it on the `free` plan on first contact.
    async fn ensure_caller(&self, caller_id: &str) -> Result<Caller>;

    /// Read-only lookup; `None` for a caller never seen before.
    async fn find_caller(&self, caller_id: &str) -> Result<Option<Caller>>;

    async fn fetch_profile(&self, caller_id: &str) -> Result<Option<Value>>;

    /// School rows, each with its nested `school_stats` array.
    async fn fetch_schools(&self, caller_id: &str) -> Result<Vec<Value>>;

    /// `None` returns every application the caller owns.
    async fn fetch_applications(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>>;

    async fn fetch_essays(&self, caller_id: &str) -> Result<Vec<Value>>;

    async fn fetch_memory(&self, caller_id: &str) -> Result<Vec<Value>>;

    async fn fetch_recommendations(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>>;

    /// Counts owned rows; AI calls are counted from `month_start` onwards.
    async fn usage_snapshot(
        &self,
        caller_id: &str,
        month_start: DateTime<Utc>,
    ) -> Result<UsageSnapshot>;

    async fn record_ai_call(&self, caller_id: &str, feature: &str) -> Result<()>;

    /// Variants the caller already has for one (story, school) pair.
    async fn count_variants(&self, caller_id: &str, story_id: Uuid, school_id: Uuid)
        -> Result<u32>;
}
