//! Locating a JSON object inside free-form LLM output.
//!
//! Responses often wrap the object in prose or markdown fences. The scanner
//! tracks brace depth outside of string literals, so braces inside string
//! values neither open nor close the object.

use serde_json::{Map, Value};

/// The first balanced `{...}` substring of `text`, if any.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decode the first balanced JSON object in `text`.
///
/// `None` when there is no balanced object or it does not decode.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let candidate = find_json_object(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
