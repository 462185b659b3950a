//! Permissive JSON extraction from free-form LLM text responses.
//!
//! Grounded on the reference codebase's `extract_json_output`: try a fenced
//! ` ```json ` block first, then fall back to the first `{`/`[` through the
//! matching last `}`/`]`. Used by the Perception enricher and the multi-query
//! reformulation parser, both of which treat a parse failure as "no result"
//! rather than a propagated error.

use serde::de::DeserializeOwned;

/// Extract and deserialize a JSON value of type `T` from `response`,
/// preferring a fenced ` ```json ` block over a bare object/array.
pub fn extract_json<T: DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fenced) = extract_fenced_json(response) {
        if let Ok(value) = serde_json::from_str(&fenced) {
            return Some(value);
        }
    }
    let bare = extract_bare_braces(response, '{', '}').or_else(|| extract_bare_braces(response, '[', ']'))?;
    serde_json::from_str(&bare).ok()
}

/// Extract a JSON array substring specifically — used when the caller knows
/// the expected shape is an array, such as the Perception enricher's "first
/// JSON array substring" response handling.
pub fn extract_json_array<T: DeserializeOwned>(response: &str) -> Option<Vec<T>> {
    if let Some(fenced) = extract_fenced_json(response) {
        if let Ok(value) = serde_json::from_str::<Vec<T>>(&fenced) {
            return Some(value);
        }
    }
    let bare = extract_bare_braces(response, '[', ']')?;
    serde_json::from_str(&bare).ok()
}

fn extract_fenced_json(response: &str) -> Option<String> {
    let start_marker = "```json";
    let start = response.find(start_marker)? + start_marker.len();
    let rest = &response[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim().to_string())
}

fn extract_bare_braces(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    if end < start {
        return None;
    }
    Some(response[start..=end].to_string())
}
