//! Operation modes and their typed parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::FieldIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Coach,
    Predict,
    Resume,
    Recommender,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Coach => "coach",
            Mode::Predict => "predict",
            Mode::Resume => "resume",
            Mode::Recommender => "recommender",
        }
    }

    /// Lenient parse: anything unrecognized is `Coach`.
    pub fn or_coach(raw: &str) -> Mode {
        raw.parse().unwrap_or(Mode::Coach)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coach" => Ok(Mode::Coach),
            "predict" => Ok(Mode::Predict),
            "resume" => Ok(Mode::Resume),
            "recommender" => Ok(Mode::Recommender),
            other => Err(format!(
                "unknown mode '{other}'; expected one of coach, predict, resume, recommender"
            )),
        }
    }
}

/// Coaching takes no parameters; the prompt is built from context alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachParams {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_schools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    /// Free-form caller hints, forwarded to the prompt untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeParams {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommenderParams {
    #[serde(default)]
    pub application_id: Option<Uuid>,
}

/// Mode plus its parameters. Matching on this is exhaustive over modes.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeParams {
    Coach(CoachParams),
    Predict(PredictParams),
    Resume(ResumeParams),
    Recommender(RecommenderParams),
}

impl ModeParams {
    pub fn mode(&self) -> Mode {
        match self {
            ModeParams::Coach(_) => Mode::Coach,
            ModeParams::Predict(_) => Mode::Predict,
            ModeParams::Resume(_) => Mode::Resume,
            ModeParams::Recommender(_) => Mode::Recommender,
        }
    }

    /// Interprets the untyped `params` for `mode`. Absent or null means defaults;
    /// anything other than an object of the right shape is a `params` issue.
    pub fn parse(mode: Mode, params: Option<Value>) -> Result<Self, FieldIssue> {
        let params = match params {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(obj @ Value::Object(_)) => obj,
            Some(_) => return Err(FieldIssue::new("params", "params must be an object")),
        };

        let invalid = |e: serde_json::Error| FieldIssue::new("params", e.to_string());
        Ok(match mode {
            Mode::Coach => ModeParams::Coach(serde_json::from_value(params).map_err(invalid)?),
            Mode::Predict => ModeParams::Predict(serde_json::from_value(params).map_err(invalid)?),
            Mode::Resume => ModeParams::Resume(serde_json::from_value(params).map_err(invalid)?),
            Mode::Recommender => {
                ModeParams::Recommender(serde_json::from_value(params).map_err(invalid)?)
            }
        })
    }
}
