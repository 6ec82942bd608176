//! Gemini generateContent API: 错误分类规则与响应解码
//!
//! Gemini specifics on the response side:
//! - Errors are `{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": ...}}`.
//! - Streaming is NDJSON; each line is a complete `generateContent` response.
//! - Text and function calls are `parts` of `candidates[0].content`; function calls carry no id.
//! - A blocked prompt has `promptFeedback.blockReason` and no candidates.

use serde_json::Value;

use crate::classify::{ProviderFailure, ProviderRules, Verdict};
use crate::types::{Chunk, ChunkDelta, ProviderResponse, ResultUnit, TokenUsage, ToolCall};

const RETRYABLE_STATUSES: &[&str] = &["RESOURCE_EXHAUSTED", "UNAVAILABLE", "DEADLINE_EXCEEDED", "INTERNAL"];

const PERMANENT_STATUSES: &[&str] = &[
    "INVALID_ARGUMENT",
    "FAILED_PRECONDITION",
    "PERMISSION_DENIED",
    "UNAUTHENTICATED",
    "NOT_FOUND",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiRules;

impl ProviderRules for GeminiRules {
    fn verdict(&self, failure: &ProviderFailure) -> Option<Verdict> {
        let status = failure.field_str("error.status")?;
        let code = failure.field_status("error.code");
        if RETRYABLE_STATUSES.contains(&status) {
            Some(Verdict::retryable(status).with_code(code))
        } else if PERMANENT_STATUSES.contains(&status) {
            Some(Verdict::permanent(status).with_code(code))
        } else {
            None
        }
    }
}

fn normalize_finish_reason(reason: &str) -> String {
    match reason {
        "STOP" => "stop".to_string(),
        "MAX_TOKENS" => "length".to_string(),
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => "content_filter".to_string(),
        other => other.to_lowercase(),
    }
}

/// Decode one NDJSON line of a streamed response.
pub fn decode_event(data: &str) -> Result<Option<Chunk>, ProviderFailure> {
    let line = data.trim().trim_start_matches(',').trim_end_matches(',');
    if line.is_empty() || line == "[" || line == "]" {
        return Ok(None);
    }
    let body: Value = serde_json::from_str(line)
        .map_err(|e| ProviderFailure::from_error(e).with_name("DecodeError"))?;
    let response = decode_response(&body)?;

    let mut delta = ChunkDelta::new();
    delta.result = response.result;
    delta.finish_reason = response.finish_reason;
    delta.token_usage = response.token_usage;
    delta.tool_calls = response.tool_calls.into_iter().map(Into::into).collect();

    if delta == ChunkDelta::default() {
        Ok(None)
    } else {
        Ok(Some(Chunk::Delta(delta)))
    }
}

/// Decode a `generateContent` response body.
pub fn decode_response(body: &Value) -> Result<ProviderResponse, ProviderFailure> {
    if body.get("error").is_some() {
        return Err(ProviderFailure::from_value(body.clone()));
    }
    if let Some(reason) = body.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
        return Err(ProviderFailure::new(format!("Prompt blocked: {}", reason))
            .with_field("promptFeedback", body["promptFeedback"].clone())
            .content_policy());
    }

    let mut response = ProviderResponse::default();
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                response.result.push(ResultUnit::text(text));
            }
        } else if let Some(call) = part.get("functionCall") {
            let name = call.get("name").and_then(Value::as_str).unwrap_or_default();
            let id = format!("call_{}", response.tool_calls.len());
            let args = call.get("args").cloned().unwrap_or_else(|| Value::Object(Default::default()));
            response.tool_calls.push(ToolCall::new(id, name, args));
        } else if let Some(data) = part.get("inlineData") {
            let mime = data.get("mimeType").and_then(Value::as_str).unwrap_or("application/octet-stream");
            if let Some(payload) = data.get("data").and_then(Value::as_str) {
                response
                    .result
                    .push(ResultUnit::image(format!("data:{};base64,{}", mime, payload)));
            }
        }
    }

    response.finish_reason = body
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
        .map(normalize_finish_reason);
    response.token_usage = body.get("usageMetadata").map(|u| TokenUsage {
        prompt: u.get("promptTokenCount").and_then(Value::as_u64),
        result: u.get("candidatesTokenCount").and_then(Value::as_u64),
        total: None,
    });
    Ok(response)
}
