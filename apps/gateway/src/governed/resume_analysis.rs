//! Resume analysis: the `resume` mode behind the AI-call quota.
//!
//! The model is told to answer with bare JSON. Anything that does not parse as the
//! schema degrades to an empty analysis instead of failing the request; fenced output
//! is not unwrapped.

use std::time::Instant;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, TracedError};
use crate::gateway::envelope::validate_for_mode;
use crate::gateway::mode::Mode;
use crate::governed::run_governed;
use crate::llm_client::Usage;
use crate::state::AppState;

pub const FEATURE: &str = "resume_analysis";

/// Models write `null` for fields they have nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MbaReadiness {
    #[serde(deserialize_with = "null_as_default")]
    pub fit_score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub comments: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceSummary {
    pub years: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub leadership: String,
    #[serde(deserialize_with = "null_as_default")]
    pub international: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub major: String,
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    /// Models return GPA as either a number or a string ("3.7/4.0").
    pub gpa: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    #[serde(rename = "mbaReadiness", deserialize_with = "null_as_default")]
    pub mba_readiness: MbaReadiness,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: ExperienceSummary,
    #[serde(deserialize_with = "null_as_default")]
    pub education: EducationSummary,
}

/// Parses model output; on failure returns the empty analysis and `degraded = true`.
pub fn parse_analysis(content: &str, trace_id: Uuid) -> (ResumeAnalysis, bool) {
    match serde_json::from_str::<ResumeAnalysis>(content.trim()) {
        Ok(analysis) => (analysis, false),
        Err(e) => {
            warn!(trace_id = %trace_id, "Resume analysis was not valid schema JSON ({e}); using placeholder");
            (ResumeAnalysis::default(), true)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisResponse {
    pub analysis: ResumeAnalysis,
    pub degraded: bool,
    pub usage: Usage,
    pub trace_id: Uuid,
}

pub async fn run_resume_analysis(
    state: &AppState,
    trace_id: Uuid,
    body: &[u8],
) -> Result<ResumeAnalysisResponse, TracedError> {
    let started = Instant::now();
    let request = validate_for_mode(Mode::Resume, body)
        .map_err(|issues| AppError::Validation(issues).traced(trace_id))?;

    let reply = run_governed(state, trace_id, started, request, FEATURE).await?;
    let (analysis, degraded) = parse_analysis(&reply.content, trace_id);

    Ok(ResumeAnalysisResponse {
        analysis,
        degraded,
        usage: reply.usage,
        trace_id: reply.trace_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_output_parses() {
        let content = r#"{
            "summary": "Strong quant background",
            "strengths": ["Analytical rigor"],
            "weaknesses": ["Limited people management"],
            "recommendations": ["Lead a cross-functional project"],
            "mbaReadiness": {"fit_score": 7.5, "comments": "Ready for R2"},
            "experience": {"years": 5, "leadership": "Team of 3", "international": "London secondment"},
            "education": {"major": "Economics", "institution": "UCLA", "gpa": 3.7}
        }"#;
        let (analysis, degraded) = parse_analysis(content, Uuid::new_v4());
        assert!(!degraded);
        assert_eq!(analysis.strengths, vec!["Analytical rigor".to_string()]);
        assert_eq!(analysis.mba_readiness.fit_score, 7.5);
        assert_eq!(analysis.experience.years, Some(5.0));
        assert_eq!(analysis.education.gpa, serde_json::json!(3.7));
    }

    #[test]
    fn test_fenced_output_degrades_to_placeholder() {
        let content = "```json\n{\"summary\": \"ok\"}\n```";
        let (analysis, degraded) = parse_analysis(content, Uuid::new_v4());
        assert!(degraded);
        assert_eq!(analysis, ResumeAnalysis::default());
    }

    #[test]
    fn test_prose_output_degrades_to_placeholder() {
        let (analysis, degraded) =
            parse_analysis("Here is my analysis of your resume...", Uuid::new_v4());
        assert!(degraded);
        assert!(analysis.strengths.is_empty());
    }

    #[test]
    fn test_partial_object_fills_defaults() {
        let (analysis, degraded) =
            parse_analysis(r#"{"summary": "Brief"}"#, Uuid::new_v4());
        assert!(!degraded);
        assert_eq!(analysis.summary, "Brief");
        assert_eq!(analysis.mba_readiness, MbaReadiness::default());
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let content = r#"{
            "summary": "Strong operator",
            "strengths": ["Scaled a supply chain team"],
            "weaknesses": null,
            "recommendations": ["Retake the GMAT"],
            "mbaReadiness": {"fit_score": 6.0, "comments": null},
            "experience": {"years": null, "leadership": null, "international": "Singapore"},
            "education": null
        }"#;
        let (analysis, degraded) = parse_analysis(content, Uuid::new_v4());
        assert!(!degraded);
        assert_eq!(analysis.strengths, vec!["Scaled a supply chain team".to_string()]);
        assert!(analysis.weaknesses.is_empty());
        assert_eq!(analysis.mba_readiness.fit_score, 6.0);
        assert_eq!(analysis.mba_readiness.comments, "");
        assert_eq!(analysis.experience.years, None);
        assert_eq!(analysis.experience.international, "Singapore");
        assert_eq!(analysis.education, EducationSummary::default());
    }
}
