//! # ai-lib-unify
//!
//! 多厂商大模型响应归一化：流式聚合、结构化输出修复与校验、可重试错误分类。
//!
//! Response normalization for multi-provider LLM calls. Whatever a provider returns, blocking
//! or streamed, clean or wrapped in chatter, the caller gets one [`Completion`] or one
//! classified [`Error`].
//!
//! ## Overview
//!
//! - **Stream Aggregation**: chunks (bare text or structured deltas) fold into one completion;
//!   tool-call fragments merge by id, token usage keeps the per-side maximum
//! - **Structured Output**: JSON is located in free text, repaired when slightly broken, and
//!   validated against a JSON schema
//! - **Error Classification**: every provider failure carries a name, an optional code and a
//!   tri-state `retryable` flag, with vendor-specific overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_lib_unify::classify::ProviderFailure;
//! use ai_lib_unify::drivers::{CompletionRequest, ProviderDriver};
//! use ai_lib_unify::types::ProviderResponse;
//! use ai_lib_unify::CompletionClient;
//!
//! #[derive(Debug)]
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl ProviderDriver for Echo {
//!     fn provider_id(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn execute(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderFailure> {
//!         Ok(ProviderResponse::text(format!("Sure: ```json\n{{\"said\": \"{}\",}}\n```", request.prompt)))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let client = CompletionClient::new(Echo);
//! let request = CompletionRequest::new("echo-1", "hi")
//!     .with_json_mode(ai_lib_unify::structured::JsonModeConfig::json_object());
//! let completion = client.stream(&request).await?;
//! assert_eq!(completion.structured(), Some(&serde_json::json!({"said": "hi"})));
//! # Ok::<_, ai_lib_unify::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Result units, chunks, completions, tool calls, token usage |
//! | [`pipeline`] | Stream aggregation, byte framing, one-shot fallback |
//! | [`structured`] | JSON extraction, repair, schema validation, JSON mode |
//! | [`classify`] | Failure classification and vendor override hook |
//! | [`drivers`] | Driver trait and per-vendor rules and decoders |
//! | [`client`] | Blocking and streaming call paths with [`CallStats`] |
//! | [`config`] | [`RuntimeConfig`] from defaults, YAML and environment |
//! | [`error_code`] | Standard error code taxonomy |

pub mod classify;
pub mod client;
pub mod config;
pub mod drivers;
pub mod error_code;
pub mod pipeline;
pub mod structured;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use classify::{CallContext, ClassifiedError, ErrorClassifier, Operation, ProviderFailure};
pub use client::{CallStats, CompletionClient, CompletionClientBuilder};
pub use config::RuntimeConfig;
pub use drivers::{ChunkStream, CompletionRequest, ProviderDriver};
pub use types::{Chunk, Completion, ResultUnit, TokenUsage, ToolCall};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
