use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::quota::PlanTier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CallerRow {
    pub id: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

/// The principal making a request. The plan only changes through external billing events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: String,
    pub plan: PlanTier,
}

impl From<CallerRow> for Caller {
    fn from(row: CallerRow) -> Self {
        let plan = row.plan.parse().unwrap_or_else(|e| {
            warn!("Caller {} has unreadable plan ({e}); treating as free", row.id);
            PlanTier::Free
        });
        Caller { id: row.id, plan }
    }
}
