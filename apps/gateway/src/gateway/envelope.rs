//! Request and response envelopes for the gateway entry point.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::FieldIssue;
use crate::gateway::mode::{Mode, ModeParams};
use crate::llm_client::Usage;

const CALLER_ID_MIN_LEN: usize = 3;
const CALLER_ID_MAX_LEN: usize = 128;

/// A validated gateway request. Only constructed through `validate` or by
/// call sites that have already validated the caller id.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub caller_id: String,
    pub params: ModeParams,
}

impl GatewayRequest {
    pub fn mode(&self) -> Mode {
        self.params.mode()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReply {
    pub content: String,
    pub usage: Usage,
    pub trace_id: Uuid,
}

/// A caller id is a UUID or any id of at least three non-blank characters.
pub fn validate_caller_id(raw: Option<&Value>) -> Result<String, FieldIssue> {
    let id = match raw {
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(FieldIssue::new("callerId", "callerId must be a string")),
        None => return Err(FieldIssue::new("callerId", "callerId is required")),
    };

    if Uuid::parse_str(id).is_ok() {
        return Ok(id.to_ascii_lowercase());
    }
    let len = id.chars().count();
    if len < CALLER_ID_MIN_LEN {
        return Err(FieldIssue::new(
            "callerId",
            format!("callerId must be a UUID or at least {CALLER_ID_MIN_LEN} characters"),
        ));
    }
    if len > CALLER_ID_MAX_LEN || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(FieldIssue::new(
            "callerId",
            "callerId contains invalid characters or is too long",
        ));
    }
    Ok(id.to_string())
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, Vec<FieldIssue>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| vec![FieldIssue::new("body", format!("body must be JSON: {e}"))])?;
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(vec![FieldIssue::new("body", "body must be a JSON object")]),
    }
}

fn finish(
    mut fields: Map<String, Value>,
    mode: Result<Mode, FieldIssue>,
) -> Result<GatewayRequest, Vec<FieldIssue>> {
    let mut issues = Vec::new();

    let caller_id = validate_caller_id(fields.get("callerId"))
        .map_err(|issue| issues.push(issue))
        .ok();

    let params = mode
        .map_err(|issue| issues.push(issue))
        .ok()
        .and_then(|mode| {
            ModeParams::parse(mode, fields.remove("params"))
                .map_err(|issue| issues.push(issue))
                .ok()
        });

    match (caller_id, params) {
        (Some(caller_id), Some(params)) if issues.is_empty() => {
            Ok(GatewayRequest { caller_id, params })
        }
        _ => Err(issues),
    }
}

/// Validates the raw request body. Collects every field issue instead of stopping at
/// the first, so the client can fix them in one round trip.
pub fn validate(body: &[u8]) -> Result<GatewayRequest, Vec<FieldIssue>> {
    let fields = parse_object(body)?;
    let mode = match fields.get("mode") {
        Some(Value::String(s)) => s.parse::<Mode>().map_err(|e| FieldIssue::new("mode", e)),
        Some(_) => Err(FieldIssue::new("mode", "mode must be a string")),
        None => Err(FieldIssue::new("mode", "mode is required")),
    };
    finish(fields, mode)
}

/// Validates a body for a route that fixes the mode itself; any `mode` field is ignored.
pub fn validate_for_mode(mode: Mode, body: &[u8]) -> Result<GatewayRequest, Vec<FieldIssue>> {
    finish(parse_object(body)?, Ok(mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mode::{PredictParams, RecommenderParams};
    use serde_json::json;

    fn body(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn test_minimal_predict_request_is_valid() {
        let req = validate(&body(json!({"callerId": "user-42", "mode": "predict"}))).unwrap();
        assert_eq!(req.caller_id, "user-42");
        assert_eq!(req.params, ModeParams::Predict(PredictParams::default()));
    }

    #[test]
    fn test_uuid_caller_id_is_normalized() {
        let req = validate(&body(json!({
            "callerId": "6F9619FF-8B86-D011-B42D-00C04FC964FF",
            "mode": "coach"
        })))
        .unwrap();
        assert_eq!(req.caller_id, "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }

    #[test]
    fn test_short_caller_id_is_rejected() {
        let issues = validate(&body(json!({"callerId": "ab", "mode": "coach"}))).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "callerId");
    }

    #[test]
    fn test_unknown_mode_is_a_validation_error() {
        let issues = validate(&body(json!({"callerId": "user-42", "mode": "bogus"}))).unwrap_err();
        assert_eq!(issues[0].field, "mode");
    }

    #[test]
    fn test_all_issues_are_collected() {
        let issues = validate(&body(json!({"callerId": 7}))).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["callerId", "mode"]);
    }

    #[test]
    fn test_malformed_params_are_reported() {
        let issues = validate(&body(json!({
            "callerId": "user-42",
            "mode": "recommender",
            "params": {"applicationId": 17}
        })))
        .unwrap_err();
        assert_eq!(issues[0].field, "params");
    }

    #[test]
    fn test_recommender_without_application_id_is_valid() {
        let req = validate(&body(json!({"callerId": "user-42", "mode": "recommender"}))).unwrap();
        assert_eq!(
            req.params,
            ModeParams::Recommender(RecommenderParams::default())
        );
    }

    #[test]
    fn test_fixed_mode_ignores_mode_field() {
        let req = validate_for_mode(
            Mode::Resume,
            &body(json!({"callerId": "user-42", "mode": "coach"})),
        )
        .unwrap();
        assert_eq!(req.mode(), Mode::Resume);
    }

    #[test]
    fn test_non_json_body_is_rejected() {
        let issues = validate(b"callerId=user-42").unwrap_err();
        assert_eq!(issues[0].field, "body");
        let issues = validate(b"[1,2,3]").unwrap_err();
        assert_eq!(issues[0].message, "body must be a JSON object");
    }
}
