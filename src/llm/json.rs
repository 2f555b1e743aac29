//! Locating JSON payloads embedded in free text.
//!
//! Backend errors usually arrive as a transport message with the provider's
//! JSON error body pasted somewhere inside it, e.g.
//! `API responded with status 401: {"message":"Unauthorized"}`. This module
//! finds that object without assuming where it starts or ends.

use serde_json::Value;

/// Find the first JSON object embedded in `text`.
///
/// Every `{` is tried as a start position. A streaming parse handles nested
/// braces and trailing text; balanced-brace extraction is the fallback for
/// objects followed by text the streaming parser rejects.
pub fn find_json_object(text: &str) -> Option<Value> {
    for (start_idx, _) in text.match_indices('{') {
        let candidate = &text[start_idx..];

        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next()
            && value.is_object()
        {
            return Some(value);
        }

        if let Some(slice) = extract_balanced_braces(candidate)
            && let Ok(value) = serde_json::from_str::<Value>(slice)
            && value.is_object()
        {
            return Some(value);
        }
    }

    None
}

/// Pull the human-readable message out of a provider error body.
///
/// Recognises `{"message": ..}`, `{"error": {"message": ..}}`,
/// `{"error": ".."}` and `{"detail": ..}` (string or list of objects with a
/// `msg` field).
pub fn error_message(value: &Value) -> Option<String> {
    if let Some(msg) = value.get("message").and_then(Value::as_str) {
        return non_empty(msg);
    }

    match value.get("error") {
        Some(Value::String(msg)) => return non_empty(msg),
        Some(inner @ Value::Object(_)) => {
            if let Some(msg) = inner.get("message").and_then(Value::as_str) {
                return non_empty(msg);
            }
        }
        _ => {}
    }

    match value.get("detail") {
        Some(Value::String(msg)) => non_empty(msg),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

/// Extract a substring with balanced braces starting at the first `{`.
///
/// Tracks depth while respecting string literals and escapes, so
/// `{"msg": "use { and } carefully"}` is handled.
fn extract_balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

fn non_empty(msg: &str) -> Option<String> {
    let trimmed = msg.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
