//! Scrubbing of config snapshots before they reach logs or a terminal.

use serde_json::{Map, Value};

const SENSITIVE_KEYWORDS: [&str; 7] = [
    "apikey",
    "token",
    "secret",
    "password",
    "credential",
    "jwt",
    "session",
];

pub const REDACTED: &str = "REDACTED";
pub const REDACTED_TOO_DEEP: &str = "REDACTED_TOO_DEEP";

const MAX_DEPTH: usize = 5;

/// Deep copy of `value` with credentials and prompt-like content replaced.
#[must_use]
pub fn redact_sensitive(value: &Value) -> Value {
    redact_at(value, 0)
}

fn redact_at(value: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(REDACTED_TOO_DEEP.into());
    }
    match value {
        Value::Array(items) => items.iter().map(|item| redact_at(item, depth + 1)).collect(),
        Value::Object(entries) => {
            let redacted: Map<String, Value> = entries
                .iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_key(key) {
                        Value::String(REDACTED.into())
                    } else if value.is_object() || value.is_array() {
                        redact_at(value, depth + 1)
                    } else {
                        value.clone()
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(redacted)
        },
        scalar => scalar.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    if SENSITIVE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        return true;
    }
    let compact: String = lower
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect();
    compact.ends_with("question")
        || compact.ends_with("prompt")
        || compact.ends_with("query")
        || compact == "selection"
        || compact == "selectiontext"
}
