//! Completion client: runs one call against a [`ProviderDriver`](crate::drivers::ProviderDriver).
//!
//! Keep the public surface small and predictable. Implementation details are split into
//! submodules under `src/client/`.
//!
//! | Path | Driver call | Result |
//! |------|-------------|--------|
//! | [`CompletionClient::execute`] | `execute` | response normalized, structured output validated |
//! | [`CompletionClient::stream`] | `stream` | chunks aggregated, structured output validated |
//!
//! Every driver failure is classified with the driver's classifier before it is returned.

pub mod builder;
pub mod core;
mod execution;
pub mod types;

pub use builder::CompletionClientBuilder;
pub use core::CompletionClient;
pub use types::CallStats;
