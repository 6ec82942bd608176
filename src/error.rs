use crate::classify::{classify_failure, CallContext, ClassifiedError, DefaultClassifier, Operation, ProviderFailure};
use crate::structured::StructuredError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "repair_json", "/properties/due")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "runtime_config", "schema_validator")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type.
///
/// Provider failures always arrive as [`Error::Classified`] (or [`Error::ContentPolicy`] for
/// refusals); extraction and validation failures as [`Error::Structured`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Structured(#[from] StructuredError),

    #[error("Content policy violation: {message}{}", format_context(.context))]
    ContentPolicy {
        message: String,
        context: ErrorContext,
    },

    #[error("{0}")]
    Classified(Box<ClassifiedError>),

    /// A streaming failure, carrying the prompt of the call it interrupted.
    #[error("{source} (prompt: {})", preview(.prompt))]
    Annotated { prompt: String, source: Box<Error> },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

const PROMPT_PREVIEW_CHARS: usize = 80;

fn preview(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(PROMPT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

impl From<ClassifiedError> for Error {
    fn from(err: ClassifiedError) -> Self {
        Error::Classified(Box::new(err))
    }
}

/// A failure that never went through a driver's classifier gets the default heuristic and an
/// unknown provider context.
impl From<ProviderFailure> for Error {
    fn from(failure: ProviderFailure) -> Self {
        let context = CallContext::new("unknown", "unknown", Operation::Stream);
        classify_failure(&DefaultClassifier, failure, &context)
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn content_policy(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::ContentPolicy {
            message: msg.into(),
            context,
        }
    }

    /// Attach the prompt of the failed call. Already-annotated errors are returned unchanged.
    pub fn annotate(self, prompt: impl Into<String>) -> Self {
        match self {
            annotated @ Error::Annotated { .. } => annotated,
            other => Error::Annotated {
                prompt: prompt.into(),
                source: Box::new(other),
            },
        }
    }

    /// Taxonomy name: `json_error`, `validation_error`, `content_policy_violation`, the
    /// classified error's name, ...
    pub fn name(&self) -> &str {
        match self {
            Error::Structured(e) => e.name(),
            Error::ContentPolicy { .. } => "content_policy_violation",
            Error::Classified(e) => &e.name,
            Error::Annotated { source, .. } => source.name(),
            Error::Configuration { .. } => "configuration_error",
            Error::Serialization(_) => "serialization_error",
            Error::Yaml(_) => "yaml_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Tri-state retryability: `Some(true)` retry, `Some(false)` do not, `None` unknown.
    pub fn retryable(&self) -> Option<bool> {
        match self {
            Error::Classified(e) => e.retryable,
            Error::Annotated { source, .. } => source.retryable(),
            Error::ContentPolicy { .. } | Error::Configuration { .. } => Some(false),
            _ => None,
        }
    }

    /// The classified provider failure behind this error, if any.
    pub fn as_classified(&self) -> Option<&ClassifiedError> {
        match self {
            Error::Classified(e) => Some(e.as_ref()),
            Error::Annotated { source, .. } => source.as_classified(),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredError> {
        match self {
            Error::Structured(e) => Some(e),
            Error::Annotated { source, .. } => source.as_structured(),
            _ => None,
        }
    }

    /// The prompt attached by [`Error::annotate`].
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Error::Annotated { prompt, .. } => Some(prompt),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::ContentPolicy { context, .. } => {
                Some(context)
            }
            Error::Annotated { source, .. } => source.context(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_once() {
        let err = Error::from(StructuredError::json("no JSON found"))
            .annotate("first")
            .annotate("second");
        assert_eq!(err.prompt(), Some("first"));
        assert_eq!(err.name(), "json_error");
        assert!(err.as_structured().is_some());
    }

    #[test]
    fn test_annotated_display_truncates_prompt() {
        let prompt = "x".repeat(200);
        let err = Error::from(StructuredError::json("boom")).annotate(prompt);
        let text = err.to_string();
        assert!(text.starts_with("json_error: boom (prompt: "));
        assert!(text.ends_with("...)"));
    }

    #[test]
    fn test_context_display() {
        let err = Error::configuration_with_context(
            "invalid boolean",
            ErrorContext::new()
                .with_field_path("AI_LIB_LOG_CHUNKS")
                .with_source("runtime_config"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid boolean (field: AI_LIB_LOG_CHUNKS, source: runtime_config)"
        );
        assert_eq!(err.retryable(), Some(false));
    }
}
