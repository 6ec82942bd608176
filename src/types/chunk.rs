//! Streamed chunks as handed over by provider drivers.

use serde::{Deserialize, Serialize};

use super::result::ResultUnit;
use super::tool::{ToolCall, ToolCallFragment};
use super::usage::TokenUsage;

/// One element of a provider stream: either a bare text fragment or a structured delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Chunk {
    Text(String),
    Delta(ChunkDelta),
}

/// Structured chunk payload. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<ResultUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallFragment>,
}

impl ChunkDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: ResultUnit) -> Self {
        self.result.push(unit);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_unit(ResultUnit::Text(text.into()))
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    pub fn with_tool_call(mut self, fragment: ToolCallFragment) -> Self {
        self.tool_calls.push(fragment);
        self
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Chunk::Text(s.to_string())
    }
}

impl From<String> for Chunk {
    fn from(s: String) -> Self {
        Chunk::Text(s)
    }
}

impl From<ChunkDelta> for Chunk {
    fn from(delta: ChunkDelta) -> Self {
        Chunk::Delta(delta)
    }
}

/// Complete response from a blocking provider call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub result: Vec<ResultUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: vec![ResultUnit::Text(text.into())],
            ..Default::default()
        }
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }
}

/// A blocking response re-expressed as the single chunk of a one-shot stream.
impl From<ProviderResponse> for Chunk {
    fn from(response: ProviderResponse) -> Self {
        Chunk::Delta(ChunkDelta {
            result: response.result,
            finish_reason: response.finish_reason,
            token_usage: response.token_usage,
            tool_calls: response
                .tool_calls
                .into_iter()
                .map(ToolCallFragment::from)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_deserializes_from_string_or_object() {
        let text: Chunk = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(text, Chunk::from("hello"));

        let delta: Chunk = serde_json::from_value(json!({
            "result": [{"type": "text", "value": "hi"}],
            "finish_reason": "stop",
            "token_usage": {"prompt": 3, "result": 1},
            "tool_calls": [{"id": "call_1", "name": "lookup", "input": "{\"q\":"}]
        }))
        .unwrap();
        let Chunk::Delta(delta) = delta else {
            panic!("expected structured chunk");
        };
        assert_eq!(delta.result, vec![ResultUnit::text("hi")]);
        assert_eq!(delta.finish_reason.as_deref(), Some("stop"));
        assert_eq!(delta.token_usage, Some(TokenUsage::new(3, 1)));
        assert_eq!(delta.tool_calls[0].name.as_deref(), Some("lookup"));
    }
}
