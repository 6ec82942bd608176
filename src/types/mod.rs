//! 类型系统模块：定义统一的补全结果、流式分片、工具调用与用量类型。
//!
//! # Types Module
//!
//! This module defines the provider-independent data model every driver is normalized into.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResultUnit`] | One unit of output: text, structured JSON or image |
//! | [`Chunk`] | One streamed element (bare text or structured delta) |
//! | [`ProviderResponse`] | A complete blocking response from a driver |
//! | [`Completion`] | The canonical result handed to the caller |
//! | [`ToolCall`] | Function/tool call requested by the model |
//! | [`TokenUsage`] | Prompt / result / total token counts |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_unify::types::{combine, ResultUnit};
//!
//! let merged = combine(&ResultUnit::text("Hel"), &ResultUnit::text("lo"));
//! assert_eq!(merged, Some(ResultUnit::text("Hello")));
//! ```

pub mod chunk;
pub mod completion;
pub mod result;
pub mod tool;
pub mod usage;

pub use chunk::{Chunk, ChunkDelta, ProviderResponse};
pub use completion::Completion;
pub use result::{combine, push_unit, reduce_units, ResultUnit};
pub use tool::{ToolCall, ToolCallFragment, ToolInput};
pub use usage::TokenUsage;
