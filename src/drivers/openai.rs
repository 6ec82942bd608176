//! OpenAI Chat Completions: classification rules and response decoding.
//!
//! Also covers OpenAI-compatible vendors (DeepSeek, Moonshot, Azure OpenAI).
//! Tool calls stream as `delta.tool_calls[]` keyed by `index`; the `id` is only sent with the
//! first fragment. Usage arrives in a final chunk when `stream_options.include_usage` is set.

use serde_json::Value;

use crate::classify::{ProviderFailure, ProviderRules, Verdict};
use crate::types::{Chunk, ChunkDelta, ProviderResponse, ResultUnit, TokenUsage, ToolCall, ToolCallFragment};

/// `insufficient_quota` arrives as HTTP 429 but will not clear by retrying.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiRules;

impl ProviderRules for OpenAiRules {
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict> {
        let code = failure
            .field_str("error.code")
            .or_else(|| failure.field_str("code"))
            .or_else(|| failure.field_str("error.type"))?;
        match code {
            "insufficient_quota" | "context_length_exceeded" | "invalid_api_key" => Some(Verdict {
                name: failure.name.is_none().then(|| code.to_string()),
                code: None,
                retryable: Some(false),
            }),
            _ => None,
        }
    }
}

fn usage_from(u: &Value) -> TokenUsage {
    TokenUsage {
        prompt: u.get("prompt_tokens").and_then(Value::as_u64),
        result: u.get("completion_tokens").and_then(Value::as_u64),
        total: None,
    }
}

/// Decode one SSE `data:` payload. `[DONE]` and empty payloads yield `None`; a
/// `delta.refusal` fails the stream as a content-policy refusal.
pub fn decode_event(data: &str) -> Result<Option<Chunk>, ProviderFailure> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    let body: Value = serde_json::from_str(data)
        .map_err(|e| ProviderFailure::from_error(e).with_name("DecodeError"))?;
    if body.get("error").is_some() {
        return Err(ProviderFailure::from_value(body));
    }

    let mut delta = ChunkDelta::new();
    if let Some(choice) = body.pointer("/choices/0") {
        if let Some(refusal) = choice.pointer("/delta/refusal").and_then(Value::as_str) {
            if !refusal.trim().is_empty() {
                return Err(ProviderFailure::new(refusal).content_policy());
            }
        }
        if let Some(text) = choice.pointer("/delta/content").and_then(Value::as_str) {
            if !text.is_empty() {
                delta = delta.with_text(text);
            }
        }
        for call in choice
            .pointer("/delta/tool_calls")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let index = call.get("index").and_then(Value::as_u64).unwrap_or(0);
            let mut fragment = ToolCallFragment::new(index.to_string());
            if let Some(id) = call.get("id").and_then(Value::as_str) {
                fragment = fragment.with_true_id(id);
            }
            if let Some(name) = call.pointer("/function/name").and_then(Value::as_str) {
                fragment = fragment.with_name(name);
            }
            if let Some(arguments) = call.pointer("/function/arguments").and_then(Value::as_str) {
                fragment = fragment.with_input(arguments);
            }
            delta = delta.with_tool_call(fragment);
        }
        if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
            delta = delta.with_finish_reason(reason);
        }
    }
    if let Some(usage) = body.get("usage").filter(|u| u.is_object()) {
        delta = delta.with_usage(usage_from(usage));
    }

    if delta == ChunkDelta::default() {
        Ok(None)
    } else {
        Ok(Some(Chunk::Delta(delta)))
    }
}

/// Decode a blocking Chat Completions response body.
pub fn decode_response(body: &Value) -> Result<ProviderResponse, ProviderFailure> {
    if body.get("error").is_some() {
        return Err(ProviderFailure::from_value(body.clone()));
    }
    let message = body.pointer("/choices/0/message").unwrap_or(&Value::Null);
    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Err(ProviderFailure::new(refusal).content_policy());
    }

    let mut response = ProviderResponse::default();
    if let Some(text) = message.get("content").and_then(Value::as_str) {
        response.result.push(ResultUnit::text(text));
    }
    for call in message.get("tool_calls").and_then(Value::as_array).into_iter().flatten() {
        let id = call.get("id").and_then(Value::as_str).unwrap_or_default();
        let name = call.pointer("/function/name").and_then(Value::as_str).unwrap_or_default();
        let arguments = call
            .pointer("/function/arguments")
            .and_then(Value::as_str)
            .unwrap_or_default();
        response.tool_calls.push(ToolCall::new(id, name, arguments));
    }
    response.finish_reason = body
        .pointer("/choices/0/finish_reason")
        .and_then(Value::as_str)
        .map(String::from);
    response.token_usage = body.get("usage").map(usage_from);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CallContext, ErrorClassifier, OverrideClassifier, Operation};
    use crate::types::ToolInput;
    use serde_json::json;

    #[test]
    fn test_insufficient_quota_is_permanent_despite_429() {
        let failure = ProviderFailure::from_value(json!({
            "status": 429,
            "error": {
                "message": "You exceeded your current quota",
                "type": "insufficient_quota",
                "code": "insufficient_quota"
            }
        }));
        let classified = OverrideClassifier::new(OpenAiRules).classify(
            failure,
            &CallContext::new("openai", "gpt-4o", Operation::Execute),
        );
        assert_eq!(classified.code, Some(429));
        assert_eq!(classified.retryable, Some(false));
        assert_eq!(classified.name, "insufficient_quota");
    }

    #[test]
    fn test_plain_rate_limit_left_to_default() {
        let failure = ProviderFailure::new("Rate limit reached")
            .with_status(429)
            .with_field("code", "rate_limit_exceeded");
        assert_eq!(OpenAiRules.verdict(&failure), None);
    }

    #[test]
    fn test_decode_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"},"index":0}]}"#;
        let Some(Chunk::Delta(delta)) = decode_event(data).unwrap() else {
            panic!("expected delta");
        };
        assert_eq!(delta.result, vec![ResultUnit::text("Hello")]);
        assert!(decode_event("[DONE]").unwrap().is_none());
        assert!(decode_event(r#"{"choices":[{"delta":{},"index":0}]}"#).unwrap().is_none());
    }

    #[test]
    fn test_decode_tool_call_fragments() {
        let first = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_abc","type":"function","function":{"name":"search","arguments":""}}]}}]}"#;
        let second = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"q\":1}"}}]}}]}"#;
        let Some(Chunk::Delta(a)) = decode_event(first).unwrap() else { panic!() };
        let Some(Chunk::Delta(b)) = decode_event(second).unwrap() else { panic!() };
        assert_eq!(a.tool_calls[0].true_id.as_deref(), Some("call_abc"));
        assert_eq!(b.tool_calls[0].id, "0");
        assert_eq!(b.tool_calls[0].input, Some(ToolInput::Text("{\"q\":1}".into())));
    }

    #[test]
    fn test_decode_response() {
        let body = json!({
            "choices": [{"message": {"content": "Hi there!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let response = decode_response(&body).unwrap();
        assert_eq!(response.result, vec![ResultUnit::text("Hi there!")]);
        assert_eq!(response.token_usage, Some(TokenUsage::new(10, 5)));
    }

    #[test]
    fn test_streamed_refusal_is_content_policy() {
        let data = r#"{"choices":[{"index":0,"delta":{"content":null,"refusal":"I can't assist with that."}}]}"#;
        let failure = decode_event(data).unwrap_err();
        assert!(failure.content_policy);
        assert_eq!(failure.message, "I can't assist with that.");

        let empty = r#"{"choices":[{"index":0,"delta":{"content":"ok","refusal":null}}]}"#;
        assert!(decode_event(empty).unwrap().is_some());
    }

    #[test]
    fn test_refusal_is_content_policy() {
        let body = json!({"choices": [{"message": {"content": null, "refusal": "I can't help with that."}}]});
        assert!(decode_response(&body).unwrap_err().content_policy);
    }
}
