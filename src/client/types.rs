//! Per-call metadata returned next to the completion.

use serde::{Deserialize, Serialize};

use crate::classify::Operation;

/// Facts about one finished call, for logging and metrics in the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    pub provider: String,
    pub model: String,
    pub operation: Operation,
    /// Generated per call; not sent to the provider.
    pub client_request_id: String,
    pub duration_ms: u128,
    /// Chunks consumed on the streaming path; `None` for blocking calls.
    pub chunks: Option<u64>,
    pub finish_reason: Option<String>,
}
