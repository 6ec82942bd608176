//! Provider-independent classification heuristic.

use once_cell::sync::Lazy;
use regex::Regex;

use super::failure::ProviderFailure;
use super::{CallContext, ClassifiedError, ErrorClassifier};

/// Name used when the failure does not carry one.
pub const GENERIC_NAME: &str = "ProviderError";

/// First HTTP-like status code embedded in a message.
static STATUS_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([1-5][0-9]{2})\b").expect("status pattern compiles"));

/// Wording providers use for transient failures.
static TRANSIENT_WORDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)rate[\s_-]?limit|timeout|retry|overload(?:ed)?|resources?[\s_-]+exhausted|throttl(?:e|ing)",
    )
    .expect("transient pattern compiles")
});

/// Status from `status`, `statusCode` or `code` (in that order), else from the message.
pub fn status_of(failure: &ProviderFailure) -> Option<u16> {
    ["status", "statusCode", "code"]
        .iter()
        .find_map(|key| failure.field_status(key))
        .or_else(|| status_in_text(&failure.message))
}

pub fn status_in_text(text: &str) -> Option<u16> {
    STATUS_IN_TEXT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Tri-state retryability from a status and the failure's wording.
///
/// | Input | Result |
/// |-------|--------|
/// | 408, 429, 529, 5xx | `Some(true)` |
/// | other 4xx | `Some(false)` |
/// | transient wording | `Some(true)` |
/// | anything else | `None` |
pub fn retryable_for(status: Option<u16>, text: &str) -> Option<bool> {
    match status {
        Some(408 | 429 | 529) | Some(500..=599) => Some(true),
        Some(400..=499) => Some(false),
        _ if TRANSIENT_WORDING.is_match(text) => Some(true),
        _ => None,
    }
}

/// Status codes and message wording only; knows nothing about vendors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError {
        let status = status_of(&failure);
        let wording = match failure.name.as_deref() {
            Some(name) => format!("{} {}", name, failure.message),
            None => failure.message.clone(),
        };
        let retryable = retryable_for(status, &wording);
        let name = failure
            .name
            .clone()
            .unwrap_or_else(|| GENERIC_NAME.to_string());
        let stack = if failure.is_error_value {
            failure.stack.clone()
        } else {
            None
        };

        ClassifiedError {
            name,
            message: failure.message.clone(),
            code: status,
            retryable,
            context: context.clone(),
            stack,
            original: failure,
        }
    }
}
