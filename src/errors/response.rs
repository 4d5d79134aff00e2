use std::collections::BTreeMap;
use reqwest::StatusCode;
use serde_json::Value;
use crate::errors::ClientError;

const GENERIC_MESSAGE: &str = "Something went wrong";

// Converts a failed response, already read to the end, into the matching ClientError.
pub fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    classify(status, &String::from_utf8_lossy(body))
}

// Maps a non-success status and its raw body onto the error taxonomy.
pub fn classify(status: StatusCode, body: &str) -> ClientError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let fields = parsed.as_ref().map(field_errors).unwrap_or_default();
    let message = parsed
        .as_ref()
        .and_then(detail_message)
        .or_else(|| flatten_fields(&fields))
        .unwrap_or_else(|| fallback_message(status, body));

    match status {
        // Unresolved authorization failures
        StatusCode::UNAUTHORIZED => ClientError::Auth(message),

        StatusCode::NOT_FOUND => ClientError::NotFound(message),

        // Remaining client errors carry field detail when the server sent any
        s if s.is_client_error() => ClientError::Validation { message, fields },

        s => ClientError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

// Pulls the human-readable message out of `{"detail": ...}` or `{"error": ...}`.
fn detail_message(body: &Value) -> Option<String> {
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| body.get(key))
        .and_then(value_text)
}

// Field-level validation errors in the `{"field": ["msg", ...]}` shape.
fn field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(object) = body.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "detail" | "error" | "message" | "code"))
        .filter_map(|(key, value)| {
            let messages: Vec<String> = match value {
                Value::Array(items) => items.iter().filter_map(value_text).collect(),
                Value::String(text) => vec![text.clone()],
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}

fn flatten_fields(fields: &BTreeMap<String, Vec<String>>) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let joined = fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(value_text),
        _ => None,
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    // Short plain-text bodies are worth surfacing, HTML error pages are not
    if !body.is_empty() && body.len() <= 200 && !body.starts_with('<') {
        return body.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("{} ({})", GENERIC_MESSAGE, reason),
        None => GENERIC_MESSAGE.to_string(),
    }
}
