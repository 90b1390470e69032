//! Recovering JSON payloads from model output that may be wrapped in code
//! fences or surrounded by prose.

use serde_json::Value;

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fences(input: &str) -> &str {
    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest;
        if s.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("json")) {
            s = &s[4..];
        }
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse the first JSON array in `content`: either the whole (unfenced) text,
/// or the span from the first `[` to the last `]`.
pub fn extract_array(content: &str) -> Option<Vec<Value>> {
    match extract_between(content, '[', ']')? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Same as [`extract_array`] for a `{ ... }` object.
pub fn extract_object(content: &str) -> Option<serde_json::Map<String, Value>> {
    match extract_between(content, '{', '}')? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn extract_between(content: &str, open: char, close: char) -> Option<Value> {
    let raw = strip_code_fences(content);
    // Clean JSON of the wrong shape is not searched for a nested payload
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return matches!((&v, open), (Value::Array(_), '[') | (Value::Object(_), '{')).then_some(v);
    }

    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("Unparsable JSON payload in model output: {e}");
            None
        }
    }
}

/// A string field, or `None` when absent or not a string.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
