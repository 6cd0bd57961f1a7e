//! JSON shape helpers for provider payloads

use crate::error::{WrapperError, WrapperResult};
use serde_json::Value;

/// Extract a string value from a JSON object
pub fn get_string<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}

/// Text of the first choice's message, `choices[0].message.content`.
pub fn assistant_content(body: &Value) -> WrapperResult<&str> {
    let choices = body
        .get("choices")
        .ok_or_else(|| WrapperError::Shape("missing key 'choices'".into()))?;
    let first = choices
        .get(0)
        .ok_or_else(|| WrapperError::Shape("'choices' has no first element".into()))?;
    let message = first
        .get("message")
        .ok_or_else(|| WrapperError::Shape("missing key 'message' in choice 0".into()))?;
    get_string(message, "content")
        .ok_or_else(|| WrapperError::Shape("missing string 'content' in choice 0".into()))
}

/// Human-readable text for an `error` value embedded in a payload.
///
/// OpenAI-style bodies nest it as `{"error": {"message": ...}}`; others use a
/// bare string.
pub fn error_description(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        Value::Object(_) => get_string(error, "message")
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Message carried by a non-2xx body, or the trimmed raw body.
pub fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(parsed) => match parsed.get("error") {
            Some(error) => error_description(error),
            None => body.trim().to_string(),
        },
        Err(_) => body.trim().to_string(),
    }
}
