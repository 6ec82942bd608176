//! Dot-path lookup into provider error bodies.
//!
//! Supports nested keys (`error.type`), array indexing (`errors[0].code`, `errors.0.code`)
//! and keys that start with `$` (`$metadata.httpStatusCode`).

use serde_json::Value;

/// Get value from JSON using dot-notation path.
pub fn get_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    let normalized = path.trim().trim_start_matches("$.");
    if normalized.is_empty() {
        return None;
    }

    let mut current = obj;
    for part in normalized.split('.') {
        if part.is_empty() {
            return None;
        }
        let (key, index) = match part.find('[') {
            Some(pos) => (&part[..pos], Some(part[pos + 1..].trim_end_matches(']'))),
            None => (part, None),
        };

        if !key.is_empty() {
            current = match current {
                Value::Object(map) => map.get(key)?,
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if let Some(index) = index {
            current = current.as_array()?.get(index.parse::<usize>().ok()?)?;
        }
    }
    Some(current)
}

/// String at `path`. Non-string values are not converted.
pub fn get_str<'a>(obj: &'a Value, path: &str) -> Option<&'a str> {
    get_path(obj, path).and_then(Value::as_str)
}

/// HTTP-like status code at `path`: a number, or a string holding one.
pub fn get_status(obj: &Value, path: &str) -> Option<u16> {
    match get_path(obj, path)? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
}
