//! Static plan registry: plan tier → limits.
//!
//! Changing a value here is a deployment, not a runtime event. Tiers are ordered by
//! permissiveness (`free` ⊆ `plus` ⊆ `pro`); nothing enforces that, the tests pin it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Plus,
    Pro,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Plus => "plus",
            PlanTier::Pro => "pro",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "plus" => Ok(PlanTier::Plus),
            "pro" => Ok(PlanTier::Pro),
            other => Err(format!("unknown plan tier '{other}'")),
        }
    }
}

/// A single plan ceiling. Serializes as a number or the literal `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Finite(u32),
    Unlimited,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(n) => write!(f, "{n}"),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Finite(n) => serializer.serialize_u32(*n),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    pub schools_max: Limit,
    pub essays_max: Limit,
    pub story_bank_max: Limit,
    pub variants_per_story_per_school: Limit,
    pub ai_calls_month: Limit,
}

const FREE: PlanLimits = PlanLimits {
    schools_max: Limit::Finite(3),
    essays_max: Limit::Finite(3),
    story_bank_max: Limit::Finite(5),
    variants_per_story_per_school: Limit::Finite(0),
    ai_calls_month: Limit::Finite(5),
};

const PLUS: PlanLimits = PlanLimits {
    schools_max: Limit::Finite(10),
    essays_max: Limit::Finite(25),
    story_bank_max: Limit::Finite(30),
    variants_per_story_per_school: Limit::Finite(2),
    ai_calls_month: Limit::Finite(100),
};

const PRO: PlanLimits = PlanLimits {
    schools_max: Limit::Finite(25),
    essays_max: Limit::Unlimited,
    story_bank_max: Limit::Unlimited,
    variants_per_story_per_school: Limit::Unlimited,
    ai_calls_month: Limit::Unlimited,
};

pub fn plan_limits(tier: PlanTier) -> &'static PlanLimits {
    match tier {
        PlanTier::Free => &FREE,
        PlanTier::Plus => &PLUS,
        PlanTier::Pro => &PRO,
    }
}
