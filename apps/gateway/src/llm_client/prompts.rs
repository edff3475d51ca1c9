// Shared prompt fragments. Each mode's templates live in gateway/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to free-text modes: stay inside the supplied context.
pub const GROUNDING_INSTRUCTION: &str = "Base every statement on the applicant data provided. \
    If a detail is missing, say so instead of guessing. \
    Never invent scores, employers, schools, or outcomes.";
