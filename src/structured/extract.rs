//! JSON extraction from free-form model output.
//!
//! Models wrap JSON in markdown fences, surround it with commentary, or emit almost-JSON.
//! [`extract`] finds the value and parses it, falling back to [`repair`](super::repair) when
//! the strict parse fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::error::StructuredError;
use super::repair::repair;

/// Fenced code block with an optional language tag (```json, ```typescript, ``` ...).
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern compiles")
});

/// Extract the first JSON object or array from `text`, repairing minor damage.
pub fn extract(text: &str) -> Result<Value, StructuredError> {
    extract_with(text, true)
}

/// Like [`extract`], but only accepts strictly valid JSON.
pub fn extract_strict(text: &str) -> Result<Value, StructuredError> {
    extract_with(text, false)
}

pub(crate) fn extract_with(text: &str, allow_repair: bool) -> Result<Value, StructuredError> {
    let body = strip_fence(text).trim();
    if body.is_empty() {
        return Err(StructuredError::json("no JSON value found in empty output"));
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }

    let mut last_error = None;
    for span in balanced_spans(body) {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if allow_repair {
                    if let Ok(value) = serde_json::from_str::<Value>(&repair(span)) {
                        return Ok(value);
                    }
                }
                last_error = Some(err);
            }
        }
    }

    Err(match last_error {
        Some(err) => StructuredError::json(format!("could not parse JSON from output: {}", err)),
        None => StructuredError::json("no JSON object or array found in output"),
    })
}

/// Return the body of the first fenced code block holding a JSON-shaped span, or `text`
/// unchanged. Fences with other content (shell commands, prose) are skipped.
pub fn strip_fence(text: &str) -> &str {
    FENCE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|body| first_balanced_span(body).is_some())
        .unwrap_or(text)
}

/// The first top-level balanced `{...}` / `[...]` span, ignoring delimiters inside strings.
pub fn first_balanced_span(text: &str) -> Option<&str> {
    balanced_spans(text).next()
}

/// Balanced candidate spans in order of their opening delimiter.
///
/// After a complete span the scan resumes behind it; after a malformed or unterminated one
/// (an apostrophe in chatter opens a quote that never closes) it resumes one character after
/// the failed opener.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < text.len() {
            let offset = text[pos..].find(['{', '['])?;
            let start = pos + offset;
            match scan_balanced(text, start) {
                Scan::Complete(end) => {
                    pos = end;
                    return Some(&text[start..end]);
                }
                Scan::Malformed | Scan::Unterminated => pos = start + 1,
            }
        }
        None
    })
}

enum Scan {
    /// Exclusive end offset of the balanced span.
    Complete(usize),
    Malformed,
    Unterminated,
}

fn scan_balanced(text: &str, start: usize) -> Scan {
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return Scan::Malformed;
                }
                if stack.is_empty() {
                    return Scan::Complete(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    Scan::Unterminated
}
