//! Prompt Builder: renders `{system, user}` for a mode from the resolved context.
//!
//! Pure: no I/O, and nothing outside the `ContextBundle` it is handed. Missing data
//! renders as `null` or `[]`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::gateway::mode::ModeParams;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{GenerationRequest, ResponseFormat};
use crate::models::context::ContextBundle;

pub const RESUME_TEXT_UNAVAILABLE: &str = "Not available";

const PREDICT_SYSTEM: &str = "You are an MBA admissions analyst. \
    Estimate the applicant's likelihood of admission at each listed school, \
    comparing their profile against the school's recent class averages. \
    Give a likelihood band (reach, target, or likely) per school with a short rationale, \
    then an overall summary.";

const RESUME_SYSTEM_PREAMBLE: &str = "You are an MBA admissions resume reviewer. \
    Evaluate the applicant's resume for MBA readiness.";

const RESUME_SCHEMA: &str = r#"{
  "summary": "string",
  "strengths": ["string"],
  "weaknesses": ["string"],
  "recommendations": ["string"],
  "mbaReadiness": {"fit_score": 0, "comments": "string"},
  "experience": {"years": 0, "leadership": "string", "international": "string"},
  "education": {"major": "string", "institution": "string", "gpa": "string"}
}"#;

const RECOMMENDER_SYSTEM: &str = "You are an MBA admissions advisor specializing in \
    letters of recommendation. Advise the applicant on choosing and briefing recommenders \
    for the applications provided: which recommender fits which school, what each letter \
    should emphasize, and how to avoid overlap between letters.";

const COACH_SYSTEM: &str = "You are an experienced MBA admissions coach. \
    Review the applicant's profile, applications, essays, and progress notes, \
    then give specific, encouraging next steps ordered by deadline and impact.";

/// One (school, cycle) statistics row. These four fields are all the predictor sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolCycleStats {
    pub school: Value,
    pub cycle_year: Value,
    pub avg_gmat: Value,
    pub avg_gpa: Value,
}

fn field(row: &Value, key: &str) -> Value {
    row.get(key).cloned().unwrap_or(Value::Null)
}

/// Flattens `schools[].school_stats[]` into per-(school, cycle) rows, dropping every
/// other field of the raw statistics.
pub fn flatten_school_stats(schools: &[Value]) -> Vec<SchoolCycleStats> {
    schools
        .iter()
        .flat_map(|school| {
            let name = field(school, "name");
            school
                .get("school_stats")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(move |stat| SchoolCycleStats {
                    school: name.clone(),
                    cycle_year: field(stat, "cycle_year"),
                    avg_gmat: field(stat, "avg_gmat"),
                    avg_gpa: field(stat, "avg_gpa"),
                })
        })
        .collect()
}

fn resume_text(profile: Option<&Value>) -> Value {
    profile
        .and_then(|p| p.get("resume_text"))
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map_or_else(
            || Value::String(RESUME_TEXT_UNAVAILABLE.to_string()),
            |text| Value::String(text.to_string()),
        )
}

pub fn resume_system() -> String {
    format!("{RESUME_SYSTEM_PREAMBLE} {JSON_ONLY_SYSTEM} The JSON object MUST match this schema exactly:\n{RESUME_SCHEMA}")
}

pub fn build_prompt(params: &ModeParams, context: &ContextBundle) -> GenerationRequest {
    let profile = context.profile.clone().unwrap_or(Value::Null);

    let (system, payload, response_format) = match params {
        ModeParams::Predict(predict) => (
            format!("{PREDICT_SYSTEM} {GROUNDING_INSTRUCTION}"),
            json!({
                "profile": profile,
                "stats": flatten_school_stats(&context.schools),
                "params": predict,
            }),
            None,
        ),
        ModeParams::Resume(_) => (
            resume_system(),
            json!({
                "profile": profile,
                "resumeText": resume_text(context.profile.as_ref()),
            }),
            Some(ResponseFormat::Json),
        ),
        ModeParams::Recommender(_) => (
            format!("{RECOMMENDER_SYSTEM} {GROUNDING_INSTRUCTION}"),
            json!({
                "recommendations": context.recommendations,
                "applications": context.applications,
            }),
            None,
        ),
        ModeParams::Coach(_) => (
            format!("{COACH_SYSTEM} {GROUNDING_INSTRUCTION}"),
            json!({
                "profile": profile,
                "apps": context.applications,
                "essays": context.essays,
                "progress": context.memory,
            }),
            None,
        ),
    };

    GenerationRequest {
        system,
        user: format!("{payload:#}"),
        response_format,
    }
}
