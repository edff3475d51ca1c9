// Plan-tiered usage quotas.
// `plans` is the static registry of limits; `ledger` compares a usage snapshot against it.

pub mod ledger;
pub mod plans;

pub use ledger::{assert_within_limit, QuotaExceeded, ResourceKind, UsageSnapshot};
pub use plans::{plan_limits, Limit, PlanLimits, PlanTier};
