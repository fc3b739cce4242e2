use serde_json::{Map, Value};
use sre_core::domain::{HealthStatus, Severity, Verdict};
use sre_core::error::AppError;

/// Keys a reasoning reply must carry, paired with the older names still accepted.
pub const REQUIRED_VERDICT_KEYS: [(&str, &[&str]); 7] = [
    ("overall_status", &[]),
    ("root_cause_narrative", &["root_cause_analysis"]),
    ("immediate_actions", &[]),
    ("long_term_recommendations", &[]),
    ("suggested_commands", &["commands_to_execute"]),
    ("severity", &[]),
    ("confidence", &[]),
];

/// Remove a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line.
    let inner = match inner.find('\n') {
        Some(nl) if !inner[..nl].trim_start().starts_with('{') => &inner[nl + 1..],
        _ => inner.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    inner.trim_end().trim_end_matches("```").trim()
}

/// Parse a reasoning reply into a `Verdict`.
///
/// The reply must be a JSON object carrying every key in `REQUIRED_VERDICT_KEYS`.
/// Values are read leniently: unrecognized statuses become UNKNOWN, unrecognized
/// severities LOW, and confidence is clamped to 0-100.
pub fn parse_verdict(reply: &str) -> Result<Verdict, AppError> {
    let body = strip_code_fences(reply);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        AppError::new("AI_REPLY_NOT_JSON", "Reasoning reply is not valid JSON")
            .with_details(e.to_string())
    })?;
    let Value::Object(obj) = value else {
        return Err(AppError::new(
            "AI_REPLY_NOT_JSON",
            "Reasoning reply is not a JSON object",
        ));
    };

    let mut fields = Vec::with_capacity(REQUIRED_VERDICT_KEYS.len());
    for (key, aliases) in REQUIRED_VERDICT_KEYS {
        let found = lookup(&obj, key, aliases).ok_or_else(|| {
            AppError::new(
                "AI_REPLY_INCOMPLETE",
                format!("Missing required key in reasoning reply: {key}"),
            )
        })?;
        fields.push(found);
    }

    Ok(Verdict {
        overall_status: fields[0]
            .as_str()
            .and_then(HealthStatus::parse)
            .unwrap_or(HealthStatus::Unknown),
        root_cause_narrative: text(fields[1]),
        immediate_actions: string_list(fields[2]),
        long_term_recommendations: string_list(fields[3]),
        suggested_commands: string_list(fields[4]),
        severity: fields[5].as_str().and_then(Severity::parse).unwrap_or(Severity::Low),
        confidence: confidence(fields[6]),
    })
}

fn lookup<'a>(obj: &'a Map<String, Value>, key: &str, aliases: &[&str]) -> Option<&'a Value> {
    obj.get(key)
        .or_else(|| aliases.iter().find_map(|alias| obj.get(*alias)))
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .map(text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let s = text(other);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
    }
}

fn confidence(v: &Value) -> u8 {
    let raw = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
