//! Integration tests for stream aggregation

mod common;

use ai_lib_unify::classify::ProviderFailure;
use ai_lib_unify::config::RuntimeConfig;
use ai_lib_unify::pipeline::{aggregate, collect};
use ai_lib_unify::structured::JsonModeConfig;
use ai_lib_unify::types::{Chunk, ChunkDelta, ResultUnit, TokenUsage, ToolCallFragment, ToolInput};
use ai_lib_unify::{ClassifiedError, CompletionRequest, Error};
use common::{init_tracing, rechunk, source};
use serde_json::json;

#[tokio::test]
async fn test_rechunking_does_not_change_text() {
    init_tracing();
    let text = "The quick brown fox → jumps over the lazy dog. 素早い茶色の狐";
    for size in 1..=9 {
        let completion = collect(source(rechunk(text, size))).await.unwrap();
        assert_eq!(completion.text(), text, "chunk size {}", size);
        assert_eq!(completion.result.len(), 1);
    }
}

#[tokio::test]
async fn test_usage_keeps_maximum_per_side() {
    let chunks = vec![
        ChunkDelta::new().with_usage(TokenUsage::new(5, 10)).into(),
        ChunkDelta::new().with_usage(TokenUsage::new(5, 25)).into(),
        ChunkDelta::new().with_usage(TokenUsage::new(0, 0)).into(),
    ];
    let completion = collect(source(chunks)).await.unwrap();
    assert_eq!(
        completion.token_usage,
        Some(TokenUsage {
            prompt: Some(5),
            result: Some(25),
            total: Some(30)
        })
    );
}

#[tokio::test]
async fn test_tool_call_fragments_merge_by_id() {
    let chunks = vec![
        ChunkDelta::new()
            .with_tool_call(ToolCallFragment::new("0").with_name("search").with_true_id("call_abc"))
            .into(),
        ChunkDelta::new()
            .with_tool_call(ToolCallFragment::new("0").with_input("{\"q\":"))
            .into(),
        ChunkDelta::new()
            .with_tool_call(ToolCallFragment::new("1").with_name("weather").with_input(json!({"city": "Oslo"})))
            .into(),
        ChunkDelta::new()
            .with_tool_call(ToolCallFragment::new("0").with_input("\"x\"}").with_name(""))
            .into(),
        ChunkDelta::new()
            .with_tool_call(ToolCallFragment::new("1").with_input(json!({"unit": "C"})))
            .with_finish_reason("tool_calls")
            .into(),
    ];
    let completion = collect(source(chunks)).await.unwrap();
    let calls = completion.tool_calls();
    assert_eq!(calls.len(), 2);

    assert_eq!(calls[0].id, "call_abc");
    assert_eq!(calls[0].name, "search");
    assert_eq!(calls[0].input, ToolInput::Json(json!({"q": "x"})));

    assert_eq!(calls[1].id, "1");
    assert_eq!(calls[1].input, ToolInput::Json(json!({"city": "Oslo", "unit": "C"})));
    assert_eq!(completion.finish_reason.as_deref(), Some("tool_calls"));
}

#[tokio::test]
async fn test_invalid_tool_json_stays_text() {
    let chunks = vec![ChunkDelta::new()
        .with_tool_call(ToolCallFragment::new("t").with_name("f").with_input("{\"q\": "))
        .into()];
    let completion = collect(source(chunks)).await.unwrap();
    assert_eq!(completion.tool_calls()[0].input, ToolInput::Text("{\"q\": ".into()));
}

#[tokio::test]
async fn test_finish_reason_last_non_empty_wins() {
    let chunks = vec![
        ChunkDelta::new().with_finish_reason("length").into(),
        Chunk::from("text"),
        ChunkDelta::new().with_finish_reason("stop").into(),
        ChunkDelta::new().with_finish_reason("").into(),
    ];
    let completion = collect(source(chunks)).await.unwrap();
    assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    assert_eq!(completion.chunks, Some(4));
}

#[tokio::test]
async fn test_source_error_is_annotated_with_prompt() {
    init_tracing();
    let items: Vec<Result<Chunk, Error>> = vec![
        Ok(Chunk::from("partial")),
        Err(ProviderFailure::new("upstream connect error").with_status(503).into()),
        Ok(Chunk::from("never read")),
    ];
    let request = CompletionRequest::new("gpt-4o", "Summarize the report");
    let err = aggregate(futures::stream::iter(items), &request, &RuntimeConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.prompt(), Some("Summarize the report"));
    assert_eq!(err.retryable(), Some(true));
    assert!(ClassifiedError::is_classified(&err));
    assert!(err.to_string().contains("Summarize the report"));
}

#[tokio::test]
async fn test_json_mode_replaces_result() {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "born": {"type": "string", "format": "date"}
        },
        "required": ["name"]
    });
    let request = CompletionRequest::new("m", "who?").with_schema(schema);
    let text = "Result:\n```json\n{\"name\": \"Ada\", \"born\": \"\",}\n```\nAnything else?";
    let completion = aggregate(source(rechunk(text, 4)), &request, &RuntimeConfig::default())
        .await
        .unwrap();
    assert_eq!(completion.result.len(), 1);
    assert_eq!(completion.structured().unwrap()["name"], "Ada");
    assert!(completion.validation_error.is_none());
}

#[tokio::test]
async fn test_validation_failure_raised_or_attached() {
    let schema = json!({
        "type": "object",
        "properties": {"score": {"type": "integer", "minimum": 0}},
        "required": ["score"]
    });
    let request = CompletionRequest::new("m", "rate it").with_json_mode(JsonModeConfig::from_schema(schema, "rating"));

    let err = aggregate(source(vec![Chunk::from("{\"score\": -3}")]), &request, &RuntimeConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.name(), "validation_error");
    assert_eq!(err.prompt(), Some("rate it"));
    assert_eq!(err.as_structured().map(|e| e.violations().len()), Some(1));

    let config = RuntimeConfig {
        attach_validation_errors: true,
        ..Default::default()
    };
    let completion = aggregate(source(vec![Chunk::from("{\"score\": -3}")]), &request, &config)
        .await
        .unwrap();
    let attached = completion.validation_error.as_ref().expect("attached error");
    assert_eq!(attached.name(), "validation_error");
    assert_eq!(completion.text(), "{\"score\": -3}");
}

#[tokio::test]
async fn test_json_mode_without_json_is_json_error() {
    let request = CompletionRequest::new("m", "p").with_json_mode(JsonModeConfig::json_object());
    let err = aggregate(source(vec![Chunk::from("I cannot answer that.")]), &request, &RuntimeConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.name(), "json_error");
}

#[tokio::test]
async fn test_empty_stream() {
    init_tracing();
    let completion = collect(source(Vec::new())).await.unwrap();
    assert!(completion.result.is_empty());
    assert_eq!(completion.chunks, Some(0));
    assert!(completion.token_usage.is_none());
    assert!(completion.tool_calls.is_none());
}

#[tokio::test]
async fn test_image_units_are_not_merged() {
    let chunks = vec![
        ChunkDelta::new().with_unit(ResultUnit::image("https://cdn/a.png")).into(),
        ChunkDelta::new().with_unit(ResultUnit::image("https://cdn/b.png")).into(),
    ];
    let completion = collect(source(chunks)).await.unwrap();
    assert_eq!(completion.result.len(), 2);
}
