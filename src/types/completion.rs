//! The canonical completion returned by both the blocking and the streaming path.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::chunk::ProviderResponse;
use super::result::{reduce_units, ResultUnit};
use super::tool::ToolCall;
use super::usage::TokenUsage;
use crate::structured::StructuredError;

/// Final, provider-independent result of one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub result: Vec<ResultUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<StructuredError>,
    /// Number of chunks consumed (streaming only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<u64>,
    /// Wall-clock time spent draining the stream (streaming only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<Duration>,
}

impl Completion {
    /// Build a completion from a blocking response.
    ///
    /// Adjacent units are reduced the same way streamed units are, and string tool inputs
    /// are parsed when `parse_tool_arguments` is set.
    pub fn from_response(response: ProviderResponse, parse_tool_arguments: bool) -> Self {
        let tool_calls: Vec<ToolCall> = response
            .tool_calls
            .into_iter()
            .map(|mut call| {
                if parse_tool_arguments {
                    call.input = call.input.into_parsed();
                }
                call
            })
            .collect();
        Self {
            result: reduce_units(response.result),
            token_usage: response.token_usage.map(TokenUsage::finalize),
            finish_reason: response.finish_reason.filter(|r| !is_blank_reason(r)),
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            ..Default::default()
        }
    }

    /// Concatenation of every text unit.
    pub fn text(&self) -> String {
        self.result
            .iter()
            .filter_map(ResultUnit::as_text)
            .collect::<Vec<_>>()
            .concat()
    }

    /// First structured unit, if any.
    pub fn structured(&self) -> Option<&serde_json::Value> {
        self.result.iter().find_map(ResultUnit::as_structured)
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// Providers send empty or literal `"null"` finish reasons after the real one.
pub(crate) fn is_blank_reason(reason: &str) -> bool {
    let trimmed = reason.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}
