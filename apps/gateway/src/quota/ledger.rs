//! Quota Ledger: compares a caller's usage snapshot against their plan limits.
//!
//! `assert_within_limit` is pure. The snapshot read and the usage write go through the
//! `ContextStore`, scoped to the caller and (for AI calls) the current calendar month.
//!
//! `Variants` is a capability check only: the Ledger denies when the plan allows zero
//! variants per (story, school). The per-pair count is checked by the call site that
//! knows the pair (`governed::quota_check::assert_variant_cap`).

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quota::plans::{Limit, PlanLimits};
use crate::store::ContextStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Schools,
    Essays,
    Stories,
    Variants,
    AiCalls,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Schools => "schools",
            ResourceKind::Essays => "essays",
            ResourceKind::Stories => "stories",
            ResourceKind::Variants => "variants",
            ResourceKind::AiCalls => "ai_calls",
        }
    }

    /// The plan ceiling governing this kind.
    pub fn limit_in(&self, limits: &PlanLimits) -> Limit {
        match self {
            ResourceKind::Schools => limits.schools_max,
            ResourceKind::Essays => limits.essays_max,
            ResourceKind::Stories => limits.story_bank_max,
            ResourceKind::Variants => limits.variants_per_story_per_school,
            ResourceKind::AiCalls => limits.ai_calls_month,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time resource counts for one caller. Recomputed per request, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub schools_count: u32,
    pub essays_count: u32,
    pub stories_count: u32,
    pub variants_count: u32,
    pub ai_calls_month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quota exceeded for {feature} (limit {limit})")]
pub struct QuotaExceeded {
    pub feature: ResourceKind,
    pub limit: Limit,
}

/// Signals `QuotaExceeded` when the counter for `kind` has reached its limit.
/// A counter exactly at the limit is rejected. Unlimited never rejects.
pub fn assert_within_limit(
    kind: ResourceKind,
    limits: &PlanLimits,
    usage: &UsageSnapshot,
) -> Result<(), QuotaExceeded> {
    let limit = kind.limit_in(limits);
    let max = match limit {
        Limit::Unlimited => return Ok(()),
        Limit::Finite(max) => max,
    };

    let exceeded = match kind {
        ResourceKind::Schools => usage.schools_count >= max,
        ResourceKind::Essays => usage.essays_count >= max,
        ResourceKind::Stories => usage.stories_count >= max,
        ResourceKind::Variants => max == 0,
        ResourceKind::AiCalls => usage.ai_calls_month >= max,
    };

    if exceeded {
        Err(QuotaExceeded {
            feature: kind,
            limit,
        })
    } else {
        Ok(())
    }
}

/// First instant of the calendar month containing `now`, in UTC.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}

/// Reads the caller's current usage; `ai_calls_month` counts from the start of this month.
pub async fn snapshot(store: &dyn ContextStore, caller_id: &str) -> Result<UsageSnapshot> {
    store.usage_snapshot(caller_id, month_start(Utc::now())).await
}

/// Appends one unit to the caller's monthly AI-call counter. The only write path for it.
pub async fn record_ai_call(store: &dyn ContextStore, caller_id: &str, feature: &str) -> Result<()> {
    store.record_ai_call(caller_id, feature).await
}
