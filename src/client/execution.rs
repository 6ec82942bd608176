//! 请求执行逻辑：阻塞与流式两条路径的单次调用。
//!
//! Request execution (single attempt). Retrying is the caller's decision, informed by
//! [`crate::Error::retryable`].

use futures::StreamExt;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::core::CompletionClient;
use super::types::CallStats;
use crate::classify::{classify_failure, CallContext, Operation, ProviderFailure};
use crate::drivers::CompletionRequest;
use crate::pipeline::aggregate::{aggregate, resolve_structured};
use crate::types::Completion;
use crate::{Error, Result};

impl CompletionClient {
    fn fail(&self, failure: ProviderFailure, context: &CallContext, client_request_id: &str) -> Error {
        let err = classify_failure(self.driver.classifier(), failure, context);
        info!(
            client_request_id,
            provider = %context.provider,
            model = %context.model,
            operation = %context.operation,
            error = err.name(),
            retryable = ?err.retryable(),
            "completion call failed"
        );
        err
    }

    fn stats(
        &self,
        context: CallContext,
        client_request_id: String,
        started: Instant,
        completion: &Completion,
    ) -> CallStats {
        CallStats {
            provider: context.provider,
            model: context.model,
            operation: context.operation,
            client_request_id,
            duration_ms: started.elapsed().as_millis(),
            chunks: completion.chunks,
            finish_reason: completion.finish_reason.clone(),
        }
    }

    /// Blocking call plus its [`CallStats`].
    ///
    /// Extraction and validation errors are returned as they are, without prompt annotation.
    pub async fn execute_with_stats(&self, request: &CompletionRequest) -> Result<(Completion, CallStats)> {
        let client_request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let context = self.call_context(request, Operation::Execute);

        let response = match self.driver.execute(request).await {
            Ok(response) => response,
            Err(failure) => return Err(self.fail(failure, &context, &client_request_id)),
        };

        let mut completion = Completion::from_response(response, self.config.parse_tool_arguments);
        resolve_structured(&mut completion, request, &self.config)?;

        let stats = self.stats(context, client_request_id, started, &completion);
        info!(
            client_request_id = %stats.client_request_id,
            provider = %stats.provider,
            model = %stats.model,
            duration_ms = stats.duration_ms as u64,
            finish_reason = stats.finish_reason.as_deref().unwrap_or(""),
            "completion executed"
        );
        Ok((completion, stats))
    }

    /// Streaming call plus its [`CallStats`].
    ///
    /// Mid-stream failures are classified with [`Operation::Stream`] and annotated with the
    /// prompt; so are extraction and validation errors raised at stream end.
    pub async fn stream_with_stats(&self, request: &CompletionRequest) -> Result<(Completion, CallStats)> {
        let client_request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let context = self.call_context(request, Operation::Stream);

        let source = match self.driver.stream(request).await {
            Ok(source) => source,
            Err(failure) => {
                let err = self.fail(failure, &context, &client_request_id);
                return Err(err.annotate(request.prompt.as_str()));
            }
        };

        let classifier = self.driver.classifier();
        let classified =
            source.map(|item| item.map_err(|failure| classify_failure(classifier, failure, &context)));
        let completion = aggregate(classified, request, &self.config).await?;

        let stats = self.stats(context, client_request_id, started, &completion);
        info!(
            client_request_id = %stats.client_request_id,
            provider = %stats.provider,
            model = %stats.model,
            chunks = stats.chunks.unwrap_or(0),
            duration_ms = stats.duration_ms as u64,
            "completion streamed"
        );
        Ok((completion, stats))
    }
}
