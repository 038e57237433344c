use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{BusinessPlan, PlanError};

/// Fields that must be present and non-empty for a plan to be accepted.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "saasName",
    "tagline",
    "problemStatement",
    "solution",
    "targetMarket",
];

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Validate a raw model reply into a [`BusinessPlan`].
///
/// Code fences (tagged or bare) are stripped, then the outermost `{...}` span
/// is parsed. Every field in [`REQUIRED_FIELDS`] must be a non-empty string;
/// other fields are coerced to text whatever their JSON shape.
///
/// # Errors
///
/// Returns [`PlanError::Parse`], carrying the raw reply, when no valid plan
/// can be recovered.
pub fn parse_plan_reply(raw: &str) -> Result<BusinessPlan, PlanError> {
    let fail = |reason: String| PlanError::Parse {
        reason,
        raw: raw.to_string(),
    };

    let candidate = extract_json_candidate(raw);
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| fail(format!("invalid JSON: {e}")))?;

    let Some(object) = value.as_object() else {
        return Err(fail("reply is not a JSON object".to_string()));
    };

    for field in REQUIRED_FIELDS {
        let present = object
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(fail(format!("missing required field: {field}")));
        }
    }

    serde_json::from_value(value).map_err(|e| fail(format!("unexpected field type: {e}")))
}

fn extract_json_candidate(raw: &str) -> &str {
    let trimmed = raw.trim();

    let mut unfenced = trimmed;
    if trimmed.starts_with("```") {
        if let Some(open) = FENCE_OPEN.find(unfenced) {
            unfenced = &unfenced[open.end()..];
        }
        if let Some(close) = FENCE_CLOSE.find(unfenced) {
            unfenced = &unfenced[..close.start()];
        }
    }

    JSON_OBJECT
        .find(unfenced)
        .map_or(unfenced, |m| m.as_str())
}
