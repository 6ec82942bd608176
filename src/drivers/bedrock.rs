//! AWS Bedrock: exception-name based classification.
//!
//! Bedrock SDK errors are identified by exception name; the HTTP status lives in
//! `$metadata.httpStatusCode`. Names may arrive qualified (`com.amazon.coral#ThrottlingException`)
//! through the raw `__type` field.

use crate::classify::{retryable_for, ProviderFailure, ProviderRules, Verdict};

const RETRYABLE_EXCEPTIONS: &[&str] = &[
    "ThrottlingException",
    "ServiceUnavailableException",
    "InternalServerException",
    "ModelNotReadyException",
    "ModelTimeoutException",
];

const PERMANENT_EXCEPTIONS: &[&str] = &[
    "ValidationException",
    "AccessDeniedException",
    "ResourceNotFoundException",
    "ServiceQuotaExceededException",
    "ModelErrorException",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BedrockRules;

impl BedrockRules {
    fn exception_name(failure: &ProviderFailure) -> Option<&str> {
        failure
            .name
            .as_deref()
            .or_else(|| failure.field_str("__type"))
            .map(|name| name.rsplit('#').next().unwrap_or(name))
    }
}

impl ProviderRules for BedrockRules {
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict> {
        let status = failure.field_status("$metadata.httpStatusCode");
        match Self::exception_name(failure) {
            Some(name) if RETRYABLE_EXCEPTIONS.contains(&name) => {
                Some(Verdict::retryable(name).with_code(status))
            }
            Some(name) if PERMANENT_EXCEPTIONS.contains(&name) => {
                Some(Verdict::permanent(name).with_code(status))
            }
            _ => status.map(|status| Verdict {
                name: None,
                code: Some(status),
                retryable: retryable_for(Some(status), &failure.message),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CallContext, ErrorClassifier, OverrideClassifier, Operation};
    use serde_json::json;

    fn classify(failure: ProviderFailure) -> crate::classify::ClassifiedError {
        OverrideClassifier::new(BedrockRules).classify(
            failure,
            &CallContext::new("bedrock", "anthropic.claude-3-haiku", Operation::Execute),
        )
    }

    #[test]
    fn test_throttling_is_retryable_with_metadata_status() {
        let classified = classify(ProviderFailure::from_value(json!({
            "name": "ThrottlingException",
            "message": "Too many tokens, please wait before trying again.",
            "$metadata": {"httpStatusCode": 429}
        })));
        assert_eq!(classified.name, "ThrottlingException");
        assert_eq!(classified.code, Some(429));
        assert_eq!(classified.retryable, Some(true));
    }

    #[test]
    fn test_validation_is_permanent() {
        let classified = classify(
            ProviderFailure::new("Malformed input request, please reformat your input and retry.")
                .with_name("ValidationException"),
        );
        assert_eq!(classified.retryable, Some(false));
    }

    #[test]
    fn test_qualified_type() {
        let classified = classify(ProviderFailure::from_value(json!({
            "__type": "com.amazon.coral.service#ModelNotReadyException",
            "message": "Model is loading"
        })));
        assert_eq!(classified.name, "ModelNotReadyException");
        assert_eq!(classified.retryable, Some(true));
    }

    #[test]
    fn test_unknown_exception_uses_metadata_status() {
        let classified = classify(ProviderFailure::from_value(json!({
            "name": "ConflictException",
            "message": "Conflict",
            "$metadata": {"httpStatusCode": 409}
        })));
        assert_eq!(classified.name, "ConflictException");
        assert_eq!(classified.code, Some(409));
        assert_eq!(classified.retryable, Some(false));
    }
}
