//! Tests for error classification logic

use ai_lib_unify::classify::{
    CallContext, DefaultClassifier, ErrorClassifier, Operation, OverrideClassifier, ProviderFailure,
    ProviderRules, Verdict,
};
use ai_lib_unify::drivers::classifier_for;
use ai_lib_unify::error_code::StandardErrorCode;
use ai_lib_unify::{ClassifiedError, Error};
use serde_json::json;

fn ctx(provider: &str) -> CallContext {
    CallContext::new(provider, "model-x", Operation::Execute)
}

fn default_retryable(failure: ProviderFailure) -> Option<bool> {
    DefaultClassifier.classify(failure, &ctx("any")).retryable
}

#[test]
fn test_tri_state_table() {
    let cases: Vec<(ProviderFailure, Option<bool>)> = vec![
        (ProviderFailure::new("Too Many Requests").with_status(429), Some(true)),
        (ProviderFailure::new("Bad Request").with_status(400), Some(false)),
        (ProviderFailure::new("Please retry later"), Some(true)),
        (ProviderFailure::new("Invalid API key"), None),
        (ProviderFailure::new("Request timeout"), Some(true)),
        (ProviderFailure::new("Server overloaded, try again"), Some(true)),
        (ProviderFailure::new("upstream returned 502 Bad Gateway"), Some(true)),
        (ProviderFailure::new("Not Found").with_field("statusCode", 404), Some(false)),
        (ProviderFailure::new("Request throttled").with_field("code", "503"), Some(true)),
    ];
    for (failure, expected) in cases {
        let message = failure.message.clone();
        assert_eq!(default_retryable(failure), expected, "message: {}", message);
    }
}

#[test]
fn test_status_outranks_wording() {
    // A 4xx status is final even when the text suggests retrying.
    let failure = ProviderFailure::new("rate limit policy invalid, retry with a valid key").with_status(401);
    assert_eq!(default_retryable(failure), Some(false));
}

#[test]
fn test_io_timeout_is_retryable() {
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed");
    let classified = DefaultClassifier.classify(ProviderFailure::from(io), &ctx("local"));
    assert_eq!(classified.name, "TimeoutError");
    assert_eq!(classified.retryable, Some(true));
    assert!(classified.original.source.is_some());
}

#[test]
fn test_plain_value_has_no_stack() {
    let classified = DefaultClassifier.classify(
        ProviderFailure::from(json!({"message": "boom", "stack": "at line 1"})),
        &ctx("any"),
    );
    assert_eq!(classified.message, "boom");
    assert_eq!(classified.stack, None);
}

#[test]
fn test_vendor_overrides() {
    let anthropic = classifier_for("anthropic").classify(
        ProviderFailure::from_value(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"},
            "status": 529
        })),
        &ctx("anthropic"),
    );
    assert_eq!(anthropic.name, "overloaded_error");
    assert_eq!(anthropic.code, Some(529));
    assert_eq!(anthropic.retryable, Some(true));
    assert_eq!(anthropic.standard_code(), StandardErrorCode::Overloaded);

    let bedrock = classifier_for("bedrock").classify(
        ProviderFailure::new("Rate exceeded").with_name("ThrottlingException"),
        &ctx("bedrock"),
    );
    assert_eq!(bedrock.retryable, Some(true));
    assert_eq!(bedrock.standard_code(), StandardErrorCode::RateLimited);

    let gemini = classifier_for("gemini").classify(
        ProviderFailure::from_value(json!({
            "error": {"code": 400, "status": "INVALID_ARGUMENT", "message": "Please retry with a valid model"}
        })),
        &ctx("gemini"),
    );
    assert_eq!(gemini.name, "INVALID_ARGUMENT");
    assert_eq!(gemini.code, Some(400));
    assert_eq!(gemini.retryable, Some(false));

    let openai = classifier_for("openai").classify(
        ProviderFailure::from_value(json!({
            "status": 429,
            "error": {"code": "insufficient_quota", "message": "You exceeded your current quota"}
        })),
        &ctx("openai"),
    );
    assert_eq!(openai.code, Some(429));
    assert_eq!(openai.retryable, Some(false));
    assert_eq!(openai.standard_code(), StandardErrorCode::QuotaExhausted);
}

struct MaintenanceRules;

impl ProviderRules for MaintenanceRules {
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict> {
        failure
            .message
            .contains("scheduled maintenance")
            .then(|| Verdict::retryable("MaintenanceWindow"))
    }
}

#[test]
fn test_custom_rules_stack_on_vendor_classifier() {
    let classifier = OverrideClassifier::with_delegate(MaintenanceRules, classifier_for("openai"));
    let classified = classifier.classify(
        ProviderFailure::new("scheduled maintenance until 10:00").with_status(400),
        &ctx("openai"),
    );
    assert_eq!(classified.name, "MaintenanceWindow");
    assert_eq!(classified.code, Some(400));
    assert_eq!(classified.retryable, Some(true));
}

#[test]
fn test_to_json_excludes_original() {
    let classified = DefaultClassifier.classify(
        ProviderFailure::new("Service Unavailable").with_status(503),
        &CallContext::new("openai", "gpt-4o", Operation::Stream),
    );
    let value = classified.to_json();
    assert_eq!(
        value,
        json!({
            "name": "ProviderError",
            "message": "Service Unavailable",
            "code": 503,
            "retryable": true,
            "context": {"provider": "openai", "model": "gpt-4o", "operation": "stream"},
            "stack": null,
            "originalErrorMessage": "Service Unavailable"
        })
    );
}

#[test]
fn test_is_classified_through_wrappers() {
    let classified = DefaultClassifier.classify(ProviderFailure::new("x"), &ctx("any"));
    let err: Error = Error::from(classified).annotate("prompt text");
    assert!(ClassifiedError::is_classified(&err));

    let wrapped = anyhow::Error::new(err).context("while summarizing");
    assert!(ClassifiedError::is_classified(wrapped.as_ref()));

    let plain = std::io::Error::new(std::io::ErrorKind::Other, "not classified");
    assert!(!ClassifiedError::is_classified(&plain));
}
