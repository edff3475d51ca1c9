//! Pre-flight quota checks for create-style features (schools, essays, stories, variants).
//!
//! Variants take two checks: the Ledger's plan-level capability check, then the
//! per-(story, school) cap here, because only this call site knows the pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, FieldIssue};
use crate::gateway::envelope::validate_caller_id;
use crate::quota::{
    assert_within_limit, ledger, plan_limits, Limit, PlanLimits, PlanTier, QuotaExceeded,
    ResourceKind, UsageSnapshot,
};
use crate::store::ContextStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCheckRequest {
    #[serde(default)]
    pub caller_id: Option<Value>,
    pub feature: ResourceKind,
    #[serde(default)]
    pub story_id: Option<Uuid>,
    #[serde(default)]
    pub school_id: Option<Uuid>,
}

/// Rejects another variant once the caller holds the plan's allowance for this pair.
pub fn assert_variant_cap(
    limits: &PlanLimits,
    existing_for_pair: u32,
) -> Result<(), QuotaExceeded> {
    match limits.variants_per_story_per_school {
        Limit::Unlimited => Ok(()),
        limit @ Limit::Finite(max) if existing_for_pair >= max => Err(QuotaExceeded {
            feature: ResourceKind::Variants,
            limit,
        }),
        Limit::Finite(_) => Ok(()),
    }
}

pub async fn check_quota(store: &dyn ContextStore, request: &QuotaCheckRequest) -> Result<(), AppError> {
    let caller_id = validate_caller_id(request.caller_id.as_ref())
        .map_err(|issue| AppError::Validation(vec![issue]))?;
    let caller = store.ensure_caller(&caller_id).await?;
    let limits = plan_limits(caller.plan);
    let usage = ledger::snapshot(store, &caller.id).await?;

    assert_within_limit(request.feature, limits, &usage)?;

    if request.feature == ResourceKind::Variants {
        match (request.story_id, request.school_id) {
            (Some(story_id), Some(school_id)) => {
                let existing = store.count_variants(&caller.id, story_id, school_id).await?;
                assert_variant_cap(limits, existing)?;
            }
            (None, None) => {}
            _ => {
                return Err(AppError::Validation(vec![FieldIssue::new(
                    "storyId",
                    "storyId and schoolId must be given together",
                )]))
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub plan: PlanTier,
    pub limits: PlanLimits,
    pub usage: UsageSnapshot,
    pub trace_id: Uuid,
}

pub async fn usage_report(
    store: &dyn ContextStore,
    caller_id: Option<&str>,
    trace_id: Uuid,
) -> Result<UsageReport, AppError> {
    let raw = caller_id.map(|id| Value::String(id.to_string()));
    let caller_id =
        validate_caller_id(raw.as_ref()).map_err(|issue| AppError::Validation(vec![issue]))?;
    // Read-only: an unseen caller reports the free plan without being registered.
    let plan = store
        .find_caller(&caller_id)
        .await?
        .map_or(PlanTier::Free, |caller| caller.plan);
    let usage = ledger::snapshot(store, &caller_id).await?;

    Ok(UsageReport {
        plan,
        limits: *plan_limits(plan),
        usage,
        trace_id,
    })
}
