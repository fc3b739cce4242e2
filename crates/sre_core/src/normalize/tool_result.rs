use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a backend adapter hands back for one tool invocation.
///
/// Adapters either return plain structured data, or a response wrapper exposing up to three
/// accessors. `normalize` resolves both into a single canonical `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Value(Value),
    Wrapped(ToolResponse),
}

impl From<Value> for RawResult {
    fn from(v: Value) -> Self {
        RawResult::Value(v)
    }
}

impl From<ToolResponse> for RawResult {
    fn from(r: ToolResponse) -> Self {
        RawResult::Wrapped(r)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub content: Vec<ContentChunk>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentChunk {
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Empty containers, empty strings, null, `false` and zero all count as "no value" when
/// probing wrapper accessors.
fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Resolve a raw tool result into its canonical value. First match wins:
///
/// 1. plain mapping or sequence: returned as-is
/// 2. non-empty `structured_content`: its `result` entry when it is a mapping holding one,
///    otherwise the structured value itself
/// 3. non-empty `data`
/// 4. the first content chunk carrying text: parsed JSON, or the raw text if it does not parse
/// 5. the input unchanged
///
/// Never fails.
pub fn normalize(raw: RawResult) -> Value {
    let resp = match raw {
        RawResult::Value(v) => return v,
        RawResult::Wrapped(resp) => resp,
    };

    if let Some(sc) = resp.structured_content.as_ref().filter(|v| is_present(v)) {
        if let Some(inner) = sc.as_object().and_then(|o| o.get("result")) {
            return inner.clone();
        }
        return sc.clone();
    }

    if let Some(data) = resp.data.as_ref().filter(|v| is_present(v)) {
        return data.clone();
    }

    for chunk in &resp.content {
        let Some(text) = chunk.text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        return match serde_json::from_str::<Value>(text) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(text.to_string()),
        };
    }

    serde_json::to_value(&resp).unwrap_or(Value::Null)
}

fn error_entry(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(o) => o.get("error"),
        Value::Array(items) => items
            .first()
            .and_then(|first| first.as_object())
            .and_then(|o| o.get("error")),
        _ => None,
    }
}

/// True when a backend embedded an error marker in an otherwise successful reply.
pub fn has_error(value: &Value) -> bool {
    error_entry(value).is_some()
}

pub fn extract_error(value: &Value) -> String {
    match error_entry(value) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => "Unknown error".to_string(),
        Some(Value::String(_)) => "Unknown error".to_string(),
        Some(other) => other.to_string(),
    }
}
