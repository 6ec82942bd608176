//! The raw failure a provider driver reports, before classification.

use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::utils::json_path;

/// Anything a provider call can fail with.
///
/// Vendor SDK errors, HTTP errors and plain JSON error bodies all end up here with their
/// structured attributes (`status`, `statusCode`, `code`, vendor bodies) kept in `fields`.
#[derive(Debug, Clone, Default)]
pub struct ProviderFailure {
    /// Exception or error type name (`ThrottlingException`, `TimeoutError`).
    pub name: Option<String>,
    pub message: String,
    /// Structured attributes; always an object.
    pub fields: Map<String, Value>,
    /// Rendered stack or cause chain.
    pub stack: Option<String>,
    /// Whether the failure came from an error value rather than a bare payload.
    pub is_error_value: bool,
    pub source: Option<Arc<dyn StdError + Send + Sync>>,
    /// The provider refused the content.
    pub content_policy: bool,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Wrap any error value, rendering its cause chain as the stack.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = err.to_string();
        let stack = render_chain(&err);
        Self {
            message,
            stack,
            is_error_value: true,
            source: Some(Arc::new(err)),
            ..Default::default()
        }
    }

    /// A bare JSON payload: an error body or a string.
    ///
    /// For objects, `message` is taken from `message` or `error.message` and `name` from
    /// `name` or `__type`; the object itself becomes `fields`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let body = Value::Object(map);
                let message = json_path::get_str(&body, "message")
                    .or_else(|| json_path::get_str(&body, "error.message"))
                    .or_else(|| json_path::get_str(&body, "error"))
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());
                let name = json_path::get_str(&body, "name")
                    .or_else(|| json_path::get_str(&body, "__type"))
                    .map(str::to_string);
                let fields = match body {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Self {
                    name,
                    message,
                    fields,
                    ..Default::default()
                }
            }
            Value::String(s) => Self::new(s),
            Value::Null => Self::new(""),
            other => Self::new(other.to_string()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_status(self, status: u16) -> Self {
        self.with_field("status", status)
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Mark the failure as a content refusal; it is passed through unclassified.
    pub fn content_policy(mut self) -> Self {
        self.content_policy = true;
        self
    }

    /// Attribute lookup by dot path (`error.type`, `$metadata.httpStatusCode`).
    pub fn field(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.fields.get(head)?;
        match rest {
            Some(rest) => json_path::get_path(value, rest),
            None => Some(value),
        }
    }

    pub fn field_str(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    /// Numeric (or numeric-string) status at `path`.
    pub fn field_status(&self, path: &str) -> Option<u16> {
        match self.field(path)? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        }
    }
}

fn render_chain(err: &(dyn StdError + 'static)) -> Option<String> {
    let mut lines = Vec::new();
    let mut cause = err.source();
    while let Some(next) = cause {
        lines.push(format!("caused by: {}", next));
        cause = next.source();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ProviderFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for ProviderFailure {
    fn from(err: std::io::Error) -> Self {
        let timeout = err.kind() == std::io::ErrorKind::TimedOut;
        let failure = Self::from_error(err);
        if timeout {
            failure.with_name("TimeoutError")
        } else {
            failure
        }
    }
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let timeout = err.is_timeout();
        let mut failure = Self::from_error(err);
        if let Some(status) = status {
            failure = failure.with_status(status);
        }
        if timeout {
            failure = failure.with_name("TimeoutError").with_field("timeout", true);
        }
        failure
    }
}

impl From<anyhow::Error> for ProviderFailure {
    fn from(err: anyhow::Error) -> Self {
        let message = err.to_string();
        let stack = err
            .chain()
            .skip(1)
            .map(|cause| format!("caused by: {}", cause))
            .collect::<Vec<_>>();
        let source: Box<dyn StdError + Send + Sync> = err.into();
        Self {
            message,
            stack: if stack.is_empty() {
                None
            } else {
                Some(stack.join("\n"))
            },
            is_error_value: true,
            source: Some(Arc::from(source)),
            ..Default::default()
        }
    }
}

impl From<Value> for ProviderFailure {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<String> for ProviderFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
