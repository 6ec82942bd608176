//! Tool calls requested by the model, and the fragments they stream in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool input: raw argument text while streaming, parsed JSON once complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolInput {
    Text(String),
    Json(Value),
}

impl ToolInput {
    /// Merge a later fragment into this input.
    ///
    /// Strings concatenate, objects shallow-merge, any other pairing is overwritten.
    pub fn absorb(&mut self, next: ToolInput) {
        match (self, next) {
            (ToolInput::Text(acc), ToolInput::Text(piece)) => acc.push_str(&piece),
            (ToolInput::Json(Value::Object(acc)), ToolInput::Json(Value::Object(piece))) => {
                for (k, v) in piece {
                    acc.insert(k, v);
                }
            }
            (slot, next) => *slot = next,
        }
    }

    /// Parse string input as JSON. Input that is not valid JSON stays a string: some tools
    /// take free-form text.
    pub fn into_parsed(self) -> ToolInput {
        match self {
            ToolInput::Text(s) => match serde_json::from_str::<Value>(s.trim()) {
                Ok(v) if !s.trim().is_empty() => ToolInput::Json(v),
                _ => ToolInput::Text(s),
            },
            other => other,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ToolInput::Json(v) => Some(v),
            ToolInput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolInput::Text(s) => Some(s),
            ToolInput::Json(_) => None,
        }
    }
}

impl Default for ToolInput {
    fn default() -> Self {
        ToolInput::Text(String::new())
    }
}

impl From<&str> for ToolInput {
    fn from(s: &str) -> Self {
        ToolInput::Text(s.to_string())
    }
}

impl From<String> for ToolInput {
    fn from(s: String) -> Self {
        ToolInput::Text(s)
    }
}

impl From<Value> for ToolInput {
    fn from(v: Value) -> Self {
        ToolInput::Json(v)
    }
}

/// Tool call (invocation from model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: impl Into<ToolInput>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input: input.into(),
        }
    }
}

/// A partial tool call as it arrives in one streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ToolInput>,
    /// Real call id, for providers that stream under a placeholder id and reveal the
    /// actual one in a later fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_id: Option<String>,
}

impl ToolCallFragment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<ToolInput>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_true_id(mut self, true_id: impl Into<String>) -> Self {
        self.true_id = Some(true_id.into());
        self
    }
}

impl From<ToolCall> for ToolCallFragment {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            name: Some(call.name),
            input: Some(call.input),
            true_id: None,
        }
    }
}
