//! Value sanitization for audit logging.
//!
//! Redacts sensitive information before it is written to the audit log.

use serde_json::{Map, Value};

/// Key fragments whose values are redacted.
const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "credential"];

/// Redact values of sensitive keys, recursively.
pub fn sanitize_params(params: &Value) -> Value {
    match params {
        Value::Object(map) => {
            let mut sanitized = Map::new();
            for (key, val) in map {
                let key_lower = key.to_lowercase();
                if SENSITIVE_KEYS.iter().any(|&s| key_lower.contains(s)) {
                    sanitized.insert(key.clone(), Value::String("[REDACTED]".to_string()));
                } else {
                    sanitized.insert(key.clone(), sanitize_params(val));
                }
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_params).collect()),
        _ => params.clone(),
    }
}
