use std::collections::HashMap;

use crate::types::tool::{ToolCall, ToolCallFragment, ToolInput};

/// Collects streamed tool-call fragments into final ToolCall objects, keyed by call id.
/// Calls keep the order in which their id was first seen.
/// This is intentionally tolerant: if argument parsing fails, the raw string is kept.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    calls: Vec<PendingCall>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
struct PendingCall {
    call: ToolCall,
    true_id: Option<String>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Merge one fragment into the call with the same id, creating it on first sight.
    pub fn push(&mut self, fragment: ToolCallFragment) {
        let ToolCallFragment {
            id,
            name,
            input,
            true_id,
        } = fragment;

        match self.index.get(&id) {
            Some(&slot) => {
                let pending = &mut self.calls[slot];
                if let Some(input) = input {
                    pending.call.input.absorb(input);
                }
                if let Some(name) = name.filter(|n| !n.is_empty()) {
                    pending.call.name = name;
                }
                if true_id.is_some() {
                    pending.true_id = true_id;
                }
            }
            None => {
                self.index.insert(id.clone(), self.calls.len());
                self.calls.push(PendingCall {
                    call: ToolCall {
                        id,
                        name: name.unwrap_or_default(),
                        input: input.unwrap_or_default(),
                    },
                    true_id,
                });
            }
        }
    }

    /// Restore deferred ids and, when `parse_arguments` is set, parse string inputs as JSON.
    pub fn finalize(self, parse_arguments: bool) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .map(|pending| {
                let mut call = pending.call;
                if let Some(true_id) = pending.true_id.filter(|id| !id.is_empty()) {
                    call.id = true_id;
                }
                if parse_arguments {
                    call.input = call.input.into_parsed();
                }
                call
            })
            .collect()
    }
}

impl Extend<ToolCallFragment> for ToolCallAssembler {
    fn extend<I: IntoIterator<Item = ToolCallFragment>>(&mut self, iter: I) {
        for fragment in iter {
            self.push(fragment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_fragments_concatenate_then_parse() {
        let mut assembler = ToolCallAssembler::new();
        assembler.push(
            ToolCallFragment::new("call_1")
                .with_name("search")
                .with_input("{\"q\":"),
        );
        assembler.push(ToolCallFragment::new("call_1").with_input("\"x\"}"));

        let calls = assembler.finalize(true);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search");
        assert_eq!(calls[0].input, ToolInput::Json(json!({"q": "x"})));
    }

    #[test]
    fn test_object_fragments_merge() {
        let mut assembler = ToolCallAssembler::new();
        assembler.push(ToolCallFragment::new("a").with_input(json!({"x": 1, "y": 1})));
        assembler.push(ToolCallFragment::new("a").with_input(json!({"y": 2})));
        let calls = assembler.finalize(true);
        assert_eq!(calls[0].input, ToolInput::Json(json!({"x": 1, "y": 2})));
    }

    #[test]
    fn test_mismatched_fragment_overwrites() {
        let mut assembler = ToolCallAssembler::new();
        assembler.push(ToolCallFragment::new("a").with_input("partial"));
        assembler.push(ToolCallFragment::new("a").with_input(json!({"done": true})));
        let calls = assembler.finalize(false);
        assert_eq!(calls[0].input, ToolInput::Json(json!({"done": true})));
    }

    #[test]
    fn test_order_name_and_true_id() {
        let mut assembler = ToolCallAssembler::new();
        assembler.extend([
            ToolCallFragment::new("0").with_name("first"),
            ToolCallFragment::new("1").with_name("second"),
            ToolCallFragment::new("0").with_name(""),
            ToolCallFragment::new("1").with_true_id("toolu_abc"),
        ]);
        let calls = assembler.finalize(true);
        assert_eq!(calls[0].id, "0");
        assert_eq!(calls[0].name, "first");
        assert_eq!(calls[1].id, "toolu_abc");
        assert_eq!(calls[1].name, "second");
    }

    #[test]
    fn test_invalid_json_stays_text() {
        let mut assembler = ToolCallAssembler::new();
        assembler.push(ToolCallFragment::new("a").with_input("{\"q\": "));
        let calls = assembler.finalize(true);
        assert_eq!(calls[0].input, ToolInput::Text("{\"q\": ".into()));
    }
}
