//! Stream aggregation: fold provider chunks into one [`Completion`].

use futures::{Stream, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::drivers::CompletionRequest;
use crate::types::{push_unit, Chunk, ChunkDelta, Completion, ResultUnit, TokenUsage};
use crate::types::completion::is_blank_reason;
use crate::utils::ToolCallAssembler;
use crate::{Error, Result};

/// Running state of one streamed call.
///
/// ```
/// use ai_lib_unify::pipeline::StreamAccumulator;
/// use ai_lib_unify::types::Chunk;
///
/// let mut acc = StreamAccumulator::new();
/// acc.push(Chunk::from("Hel"));
/// acc.push(Chunk::from("lo"));
/// assert_eq!(acc.finish(true).text(), "Hello");
/// ```
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    result: Vec<ResultUnit>,
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
    tools: ToolCallAssembler,
    chunks: u64,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks pushed so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn push(&mut self, chunk: Chunk) {
        self.chunks += 1;
        match chunk {
            Chunk::Text(text) => push_unit(&mut self.result, ResultUnit::Text(text)),
            Chunk::Delta(delta) => self.push_delta(delta),
        }
    }

    fn push_delta(&mut self, delta: ChunkDelta) {
        let ChunkDelta {
            result,
            finish_reason,
            token_usage,
            tool_calls,
        } = delta;

        for unit in result {
            push_unit(&mut self.result, unit);
        }
        if let Some(reason) = finish_reason.filter(|r| !is_blank_reason(r)) {
            self.finish_reason = Some(reason);
        }
        if let Some(partial) = token_usage {
            self.usage.get_or_insert_with(TokenUsage::default).absorb(&partial);
        }
        self.tools.extend(tool_calls);
    }

    /// Close the aggregation. Tool inputs are parsed when `parse_tool_arguments` is set.
    pub fn finish(self, parse_tool_arguments: bool) -> Completion {
        let tool_calls = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.finalize(parse_tool_arguments))
        };
        Completion {
            result: self.result,
            token_usage: self.usage.map(TokenUsage::finalize),
            finish_reason: self.finish_reason,
            tool_calls,
            chunks: Some(self.chunks),
            ..Default::default()
        }
    }
}

/// Drain `source` into one completion for `request`.
///
/// Any failure, from the source or from structured-output validation, is annotated with the
/// request's prompt. With JSON mode on, the result is replaced by the single structured value
/// recovered from the output; `config.attach_validation_errors` turns an extraction or
/// validation failure into [`Completion::validation_error`] instead.
pub async fn aggregate<S, E>(
    source: S,
    request: &CompletionRequest,
    config: &RuntimeConfig,
) -> Result<Completion>
where
    S: Stream<Item = std::result::Result<Chunk, E>>,
    E: Into<Error>,
{
    let started = Instant::now();
    let mut source = Box::pin(source);
    let mut acc = StreamAccumulator::new();

    while let Some(item) = source.next().await {
        let chunk = item.map_err(|e| e.into().annotate(request.prompt.as_str()))?;
        if config.log_chunks {
            debug!(model = %request.model, chunk = acc.chunks() + 1, ?chunk, "stream chunk");
        }
        acc.push(chunk);
    }

    if acc.chunks() == 0 {
        warn!(model = %request.model, "stream ended without any chunk");
    }

    let mut completion = acc.finish(config.parse_tool_arguments);

    if let Err(err) = resolve_structured(&mut completion, request, config) {
        return Err(err.annotate(request.prompt.as_str()));
    }

    let elapsed = started.elapsed();
    completion.execution_time = Some(elapsed);
    info!(
        model = %request.model,
        chunks = completion.chunks.unwrap_or(0),
        duration_ms = elapsed.as_millis() as u64,
        finish_reason = completion.finish_reason.as_deref().unwrap_or(""),
        "stream aggregated"
    );
    Ok(completion)
}

/// Replace `completion.result` with the structured value JSON mode asked for.
///
/// With `attach_validation_errors`, extraction and validation failures are stored on the
/// completion instead of returned. A no-op when JSON mode is off.
pub(crate) fn resolve_structured(
    completion: &mut Completion,
    request: &CompletionRequest,
    config: &RuntimeConfig,
) -> Result<()> {
    if !request.json_mode.is_enabled() {
        return Ok(());
    }
    match request
        .json_mode
        .resolve_units(&completion.result, config.repair_json)
    {
        Ok(value) => completion.result = vec![ResultUnit::Structured(value)],
        Err(Error::Structured(err)) if config.attach_validation_errors => {
            warn!(
                model = %request.model,
                error = err.name(),
                violations = err.violations().len(),
                "structured output attached as validation error"
            );
            completion.validation_error = Some(err);
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

/// [`aggregate`] with no prompt, no JSON mode and default configuration.
pub async fn collect<S, E>(source: S) -> Result<Completion>
where
    S: Stream<Item = std::result::Result<Chunk, E>>,
    E: Into<Error>,
{
    aggregate(source, &CompletionRequest::new("", ""), &RuntimeConfig::default()).await
}
