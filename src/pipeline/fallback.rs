//! Non-streaming fallback
//!
//! Drivers without native streaming answer with one blocking response; it is re-emitted as a
//! one-element stream so the aggregator sees the same contract on both paths.

use futures::stream;

use crate::drivers::ChunkStream;
use crate::types::{Chunk, ProviderResponse};

/// Wrap a blocking response as a one-shot chunk stream.
pub fn one_shot(response: ProviderResponse) -> ChunkStream {
    Box::pin(stream::once(async move { Ok(Chunk::from(response)) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResultUnit, TokenUsage, ToolCall};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_one_shot_yields_single_chunk() {
        let response = ProviderResponse::text("hi")
            .with_finish_reason("stop")
            .with_usage(TokenUsage::new(2, 1))
            .with_tool_call(ToolCall::new("c1", "f", "{}"));
        let chunks: Vec<_> = one_shot(response).collect().await;
        assert_eq!(chunks.len(), 1);
        let Ok(Chunk::Delta(delta)) = &chunks[0] else {
            panic!("expected structured chunk");
        };
        assert_eq!(delta.result, vec![ResultUnit::text("hi")]);
        assert_eq!(delta.tool_calls[0].id, "c1");
    }
}
