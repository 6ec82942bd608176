//! 错误分类：把任意供应商失败归一为带有三态可重试标记的结构化错误。
//!
//! # Error Classification
//!
//! Every provider failure is turned into a [`ClassifiedError`] before it reaches the caller.
//! The classifier never retries anything; it only says whether a retry makes sense.
//!
//! | `retryable` | Meaning |
//! |-------------|---------|
//! | `Some(true)` | transient, retry |
//! | `Some(false)` | permanent, do not retry |
//! | `None` | unknown |
//!
//! Vendor knowledge plugs in through [`ProviderRules`] wrapped in an [`OverrideClassifier`],
//! which falls back to [`DefaultClassifier`] for anything the rules do not recognize.
//!
//! ```rust
//! use ai_lib_unify::classify::{CallContext, DefaultClassifier, ErrorClassifier, Operation, ProviderFailure};
//!
//! let failure = ProviderFailure::new("Too many requests").with_status(429);
//! let context = CallContext::new("openai", "gpt-4o", Operation::Stream);
//! let classified = DefaultClassifier.classify(failure, &context);
//! assert_eq!(classified.retryable, Some(true));
//! assert_eq!(classified.code, Some(429));
//! ```

pub mod default;
pub mod failure;

pub use default::{retryable_for, status_of, DefaultClassifier};
pub use failure::ProviderFailure;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

use crate::error::ErrorContext;
use crate::error_code::StandardErrorCode;

/// Which path the failing call was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Execute,
    Stream,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Execute => "execute",
            Operation::Stream => "stream",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub provider: String,
    pub model: String,
    pub operation: Operation,
}

impl CallContext {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, operation: Operation) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            operation,
        }
    }
}

/// A provider failure with a name, an optional status code and a tri-state retry flag.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub name: String,
    pub message: String,
    pub code: Option<u16>,
    pub retryable: Option<bool>,
    pub context: CallContext,
    /// The failure as the driver reported it.
    pub original: ProviderFailure,
    pub stack: Option<String>,
}

impl ClassifiedError {
    /// Serializable view. The original failure is reduced to its message.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "message": self.message,
            "code": self.code,
            "retryable": self.retryable,
            "context": self.context,
            "stack": self.stack,
            "originalErrorMessage": self.original.message,
        })
    }

    /// Position in the standard taxonomy, from the name first and the code second.
    pub fn standard_code(&self) -> StandardErrorCode {
        StandardErrorCode::resolve(&self.name, self.code)
    }

    /// Whether `err` or anything in its `source()` chain is a classified error.
    pub fn is_classified(err: &(dyn StdError + 'static)) -> bool {
        Self::find(err).is_some()
    }

    /// The first classified error in `err`'s `source()` chain.
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ClassifiedError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(classified) = e.downcast_ref::<ClassifiedError>() {
                return Some(classified);
            }
            if let Some(classified) = e
                .downcast_ref::<crate::Error>()
                .and_then(crate::Error::as_classified)
            {
                return Some(classified);
            }
            current = e.source();
        }
        None
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{} {} via {}]",
            self.name, self.message, self.context.provider, self.context.model, self.context.operation
        )
    }
}

impl StdError for ClassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.original)
    }
}

/// Turns a raw failure into a [`ClassifiedError`]. Pure and synchronous.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError;
}

impl<C: ErrorClassifier + ?Sized> ErrorClassifier for &C {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError {
        (**self).classify(failure, context)
    }
}

impl<C: ErrorClassifier + ?Sized> ErrorClassifier for std::sync::Arc<C> {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError {
        (**self).classify(failure, context)
    }
}

impl<C: ErrorClassifier + ?Sized> ErrorClassifier for Box<C> {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError {
        (**self).classify(failure, context)
    }
}

/// Route `failure` through `classifier` and wrap the outcome as a crate error.
///
/// Refusals flagged by the driver skip classification and surface as
/// [`crate::Error::ContentPolicy`].
pub fn classify_failure(
    classifier: &dyn ErrorClassifier,
    failure: ProviderFailure,
    context: &CallContext,
) -> crate::Error {
    if failure.content_policy {
        debug!(
            provider = %context.provider,
            model = %context.model,
            operation = %context.operation,
            "provider refused content"
        );
        return crate::Error::content_policy(
            failure.message,
            ErrorContext::new()
                .with_source(context.provider.clone())
                .with_details(format!("model: {}", context.model)),
        );
    }
    let classified = classifier.classify(failure, context);
    debug!(
        provider = %context.provider,
        model = %context.model,
        operation = %context.operation,
        name = %classified.name,
        code = ?classified.code,
        retryable = ?classified.retryable,
        "provider failure classified"
    );
    classified.into()
}

/// A vendor rule's opinion. Unset fields are taken from the delegate classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub name: Option<String>,
    pub code: Option<u16>,
    pub retryable: Option<bool>,
}

impl Verdict {
    pub fn retryable(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            code: None,
            retryable: Some(true),
        }
    }

    pub fn permanent(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            code: None,
            retryable: Some(false),
        }
    }

    pub fn with_code(mut self, code: Option<u16>) -> Self {
        self.code = code;
        self
    }
}

/// Vendor-specific recognition of failure shapes.
pub trait ProviderRules: Send + Sync {
    /// `None` when the failure is not a shape these rules know.
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict>;
}

/// Classifier that consults vendor rules before a delegate.
#[derive(Debug, Clone, Default)]
pub struct OverrideClassifier<R, C = DefaultClassifier> {
    rules: R,
    delegate: C,
}

impl<R: ProviderRules> OverrideClassifier<R, DefaultClassifier> {
    pub const fn new(rules: R) -> Self {
        Self {
            rules,
            delegate: DefaultClassifier,
        }
    }
}

impl<R: ProviderRules, C: ErrorClassifier> OverrideClassifier<R, C> {
    pub fn with_delegate(rules: R, delegate: C) -> Self {
        Self { rules, delegate }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }
}

impl<R: ProviderRules, C: ErrorClassifier> ErrorClassifier for OverrideClassifier<R, C> {
    fn classify(&self, failure: ProviderFailure, context: &CallContext) -> ClassifiedError {
        let verdict = self.rules.verdict(&failure);
        let mut classified = self.delegate.classify(failure, context);
        if let Some(verdict) = verdict {
            if let Some(name) = verdict.name {
                classified.name = name;
            }
            if verdict.code.is_some() {
                classified.code = verdict.code;
            }
            if verdict.retryable.is_some() {
                classified.retryable = verdict.retryable;
            }
        }
        classified
    }
}
