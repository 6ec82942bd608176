//! Anthropic Messages API: 错误分类规则与响应解码
//!
//! Anthropic specifics on the response side:
//! - Errors carry `error.type` (`overloaded_error`, `rate_limit_error`, ...).
//! - Streaming uses typed events; text arrives as `content_block_delta` / `text_delta`.
//! - Tool input streams as `input_json_delta` fragments keyed by content block index;
//!   the `toolu_...` id only appears in the preceding `content_block_start`.
//! - Input tokens are reported in `message_start`, output tokens in `message_delta`.

use serde_json::Value;

use crate::classify::{ProviderFailure, ProviderRules, Verdict};
use crate::types::{Chunk, ChunkDelta, ProviderResponse, ResultUnit, TokenUsage, ToolCall, ToolCallFragment};

/// `error.type` values Anthropic documents as transient.
const RETRYABLE_TYPES: &[&str] = &["overloaded_error", "rate_limit_error", "api_error"];

/// `error.type` values that will fail the same way again.
const PERMANENT_TYPES: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "not_found_error",
    "request_too_large",
];

/// Classification rules for Anthropic error bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicRules;

impl ProviderRules for AnthropicRules {
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict> {
        let kind = failure
            .field_str("error.type")
            .or_else(|| failure.field_str("type").filter(|t| *t != "error"))?;
        if RETRYABLE_TYPES.contains(&kind) {
            Some(Verdict::retryable(kind))
        } else if PERMANENT_TYPES.contains(&kind) {
            Some(Verdict::permanent(kind))
        } else {
            None
        }
    }
}

fn normalize_stop_reason(reason: &str) -> String {
    match reason {
        "end_turn" | "stop_sequence" => "stop".to_string(),
        "max_tokens" => "length".to_string(),
        "tool_use" => "tool_calls".to_string(),
        "refusal" => "content_filter".to_string(),
        other => other.to_string(),
    }
}

fn usage_side(usage: &Value, key: &str) -> Option<u64> {
    usage.get(key).and_then(Value::as_u64)
}

/// Decode one streamed event payload. Keep-alives and bookkeeping events yield `None`.
pub fn decode_event(data: &str) -> Result<Option<Chunk>, ProviderFailure> {
    if data.trim().is_empty() {
        return Ok(None);
    }
    let event: Value = serde_json::from_str(data).map_err(|e| {
        ProviderFailure::from_error(e).with_name("DecodeError")
    })?;

    let index = event.get("index").and_then(Value::as_u64).unwrap_or(0).to_string();
    let delta = match event.get("type").and_then(Value::as_str).unwrap_or("") {
        "message_start" => {
            let prompt = event
                .pointer("/message/usage")
                .and_then(|u| usage_side(u, "input_tokens"));
            match prompt {
                Some(prompt) => ChunkDelta::new().with_usage(TokenUsage {
                    prompt: Some(prompt),
                    ..Default::default()
                }),
                None => return Ok(None),
            }
        }
        "content_block_start" => {
            let block = event.get("content_block").unwrap_or(&Value::Null);
            match block.get("type").and_then(Value::as_str) {
                Some("tool_use") => {
                    let mut fragment = ToolCallFragment::new(index);
                    if let Some(name) = block.get("name").and_then(Value::as_str) {
                        fragment = fragment.with_name(name);
                    }
                    if let Some(id) = block.get("id").and_then(Value::as_str) {
                        fragment = fragment.with_true_id(id);
                    }
                    ChunkDelta::new().with_tool_call(fragment)
                }
                Some("text") => match block.get("text").and_then(Value::as_str) {
                    Some(text) if !text.is_empty() => ChunkDelta::new().with_text(text),
                    _ => return Ok(None),
                },
                _ => return Ok(None),
            }
        }
        "content_block_delta" => {
            let body = event.get("delta").unwrap_or(&Value::Null);
            match body.get("type").and_then(Value::as_str) {
                Some("text_delta") => match body.get("text").and_then(Value::as_str) {
                    Some(text) if !text.is_empty() => ChunkDelta::new().with_text(text),
                    _ => return Ok(None),
                },
                Some("input_json_delta") => {
                    let partial = body.get("partial_json").and_then(Value::as_str).unwrap_or("");
                    ChunkDelta::new().with_tool_call(ToolCallFragment::new(index).with_input(partial))
                }
                _ => return Ok(None),
            }
        }
        "message_delta" => {
            let mut delta = ChunkDelta::new();
            if let Some(reason) = event.pointer("/delta/stop_reason").and_then(Value::as_str) {
                delta = delta.with_finish_reason(normalize_stop_reason(reason));
            }
            if let Some(result) = event.get("usage").and_then(|u| usage_side(u, "output_tokens")) {
                delta = delta.with_usage(TokenUsage {
                    result: Some(result),
                    ..Default::default()
                });
            }
            delta
        }
        "error" => return Err(ProviderFailure::from_value(event)),
        _ => return Ok(None),
    };
    Ok(Some(Chunk::Delta(delta)))
}

/// Decode a blocking Messages API response body.
pub fn decode_response(body: &Value) -> Result<ProviderResponse, ProviderFailure> {
    if body.get("type").and_then(Value::as_str) == Some("error") {
        return Err(ProviderFailure::from_value(body.clone()));
    }

    let mut response = ProviderResponse::default();
    for block in body.get("content").and_then(Value::as_array).into_iter().flatten() {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    response.result.push(ResultUnit::text(text));
                }
            }
            Some("tool_use") => {
                let id = block.get("id").and_then(Value::as_str).unwrap_or_default();
                let name = block.get("name").and_then(Value::as_str).unwrap_or_default();
                let input = block.get("input").cloned().unwrap_or(Value::Null);
                response.tool_calls.push(ToolCall::new(id, name, input));
            }
            _ => {}
        }
    }

    response.finish_reason = body
        .get("stop_reason")
        .and_then(Value::as_str)
        .map(normalize_stop_reason);
    if response.finish_reason.as_deref() == Some("content_filter") && response.result.is_empty() {
        return Err(ProviderFailure::new("The model refused to answer").content_policy());
    }
    response.token_usage = body.get("usage").map(|u| TokenUsage {
        prompt: usage_side(u, "input_tokens"),
        result: usage_side(u, "output_tokens"),
        total: None,
    });
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolInput;
    use serde_json::json;

    #[test]
    fn test_rules() {
        let overloaded = ProviderFailure::from_value(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        }));
        assert_eq!(AnthropicRules.verdict(&overloaded), Some(Verdict::retryable("overloaded_error")));

        let invalid = ProviderFailure::from_value(json!({
            "error": {"type": "invalid_request_error", "message": "max_tokens: must be positive"}
        }));
        assert_eq!(AnthropicRules.verdict(&invalid).and_then(|v| v.retryable), Some(false));

        assert_eq!(AnthropicRules.verdict(&ProviderFailure::new("socket hang up")), None);
    }

    #[test]
    fn test_decode_text_delta() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        match decode_event(data).unwrap() {
            Some(Chunk::Delta(delta)) => assert_eq!(delta.result, vec![ResultUnit::text("Hi")]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(decode_event(r#"{"type":"ping"}"#).unwrap().is_none());
    }

    #[test]
    fn test_decode_tool_use_start_carries_true_id() {
        let data = r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"get_weather","input":{}}}"#;
        let Some(Chunk::Delta(delta)) = decode_event(data).unwrap() else {
            panic!("expected delta");
        };
        let fragment = &delta.tool_calls[0];
        assert_eq!(fragment.id, "1");
        assert_eq!(fragment.true_id.as_deref(), Some("toolu_01"));
        assert_eq!(fragment.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn test_decode_message_delta() {
        let data = r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":15}}"#;
        let Some(Chunk::Delta(delta)) = decode_event(data).unwrap() else {
            panic!("expected delta");
        };
        assert_eq!(delta.finish_reason.as_deref(), Some("stop"));
        assert_eq!(delta.token_usage.and_then(|u| u.result), Some(15));
    }

    #[test]
    fn test_decode_error_event() {
        let data = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let failure = decode_event(data).unwrap_err();
        assert_eq!(failure.message, "Overloaded");
        assert_eq!(failure.field_str("error.type"), Some("overloaded_error"));
    }

    #[test]
    fn test_decode_response() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Checking."},
                {"type": "tool_use", "id": "toolu_9", "name": "lookup", "input": {"q": "rust"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let response = decode_response(&body).unwrap();
        assert_eq!(response.result, vec![ResultUnit::text("Checking.")]);
        assert_eq!(response.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(response.tool_calls[0].input, ToolInput::Json(json!({"q": "rust"})));
        assert_eq!(response.token_usage.unwrap().finalize().total, Some(15));
    }
}
