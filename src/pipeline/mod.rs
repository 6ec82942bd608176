//! 流水线模块：把供应商的分片流归并为一个统一的补全结果。
//!
//! # Stream Pipeline
//!
//! Everything between a driver's raw output and the caller's [`Completion`](crate::types::Completion).
//!
//! ```text
//! bytes ──decode──▶ Chunk stream ──aggregate──▶ Completion
//!                        ▲                          │
//! ProviderResponse ─fallback (one-shot)        JSON mode: extract / repair / validate
//! ```
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | [`StreamAccumulator`] and the async [`aggregate()`] driver loop |
//! | [`decode`] | SSE / NDJSON framing over a byte stream |
//! | [`fallback`] | One-shot stream for drivers without native streaming |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_unify::pipeline::collect;
//! use ai_lib_unify::types::{Chunk, ChunkDelta, TokenUsage};
//! use ai_lib_unify::Error;
//!
//! # tokio_test::block_on(async {
//! let source = futures::stream::iter(vec![
//!     Ok::<_, Error>(Chunk::from("Hel")),
//!     Ok(ChunkDelta::new().with_text("lo").with_usage(TokenUsage::new(3, 2)).into()),
//! ]);
//! let completion = collect(source).await?;
//! assert_eq!(completion.text(), "Hello");
//! assert_eq!(completion.token_usage.and_then(|u| u.total), Some(5));
//! # Ok::<_, Error>(())
//! # }).unwrap();
//! ```

pub mod aggregate;
pub mod decode;
pub mod fallback;

pub use aggregate::{aggregate, collect, StreamAccumulator};
pub use decode::{decode_stream, EventDecoder, Framing};
pub use fallback::one_shot;
