//! Provider 驱动边界: 通过 trait 接入各厂商的调用与错误分类规则
//!
//! Provider driver boundary. A driver performs the vendor call and reports either one
//! [`ProviderResponse`] or a stream of [`Chunk`]s; everything downstream is provider-agnostic.
//!
//! The vendor modules carry what is specific to each provider on the response side:
//! classification rules for its failures and decoders from its wire payloads into chunks.
//!
//! | Module | Rules | Decoders |
//! |--------|-------|----------|
//! | [`anthropic`] | `error.type` | Messages API events and bodies |
//! | [`bedrock`] | exception names, `$metadata.httpStatusCode` | none |
//! | [`gemini`] | `error.status`, `error.code` | `generateContent` bodies |
//! | [`openai`] | `insufficient_quota` | Chat Completions chunks and bodies |

pub mod anthropic;
pub mod bedrock;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::classify::{DefaultClassifier, ErrorClassifier, OverrideClassifier, ProviderFailure};
use crate::structured::JsonModeConfig;
use crate::types::{Chunk, ProviderResponse};

pub use anthropic::AnthropicRules;
pub use bedrock::BedrockRules;
pub use gemini::GeminiRules;
pub use openai::OpenAiRules;

/// Chunks as a driver streams them. Failures are still raw; the client classifies them.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, ProviderFailure>> + Send + 'static>>;

/// One call as the driver sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub json_mode: JsonModeConfig,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            json_mode: JsonModeConfig::off(),
        }
    }

    pub fn with_json_mode(mut self, json_mode: JsonModeConfig) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Ask for JSON validated against `schema`.
    pub fn with_schema(self, schema: serde_json::Value) -> Self {
        self.with_json_mode(JsonModeConfig::from_schema(schema, "response"))
    }
}

/// Core trait for provider adaptation.
///
/// The trait is object-safe; the client holds drivers as `Arc<dyn ProviderDriver>`.
/// Only [`execute`](ProviderDriver::execute) is required: drivers without native
/// streaming get a one-shot stream built from it.
#[async_trait]
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Unique provider identifier (`openai`, `anthropic`, `bedrock`, ...).
    fn provider_id(&self) -> &str;

    /// Blocking call.
    async fn execute(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderFailure>;

    /// Streaming call.
    async fn stream(&self, request: &CompletionRequest) -> Result<ChunkStream, ProviderFailure> {
        let response = self.execute(request).await?;
        Ok(crate::pipeline::fallback::one_shot(response))
    }

    /// Classifier for this driver's failures; vendor rules are picked by provider id.
    fn classifier(&self) -> &dyn ErrorClassifier {
        classifier_for(self.provider_id())
    }
}

static ANTHROPIC: OverrideClassifier<AnthropicRules> = OverrideClassifier::new(AnthropicRules);
static BEDROCK: OverrideClassifier<BedrockRules> = OverrideClassifier::new(BedrockRules);
static GEMINI: OverrideClassifier<GeminiRules> = OverrideClassifier::new(GeminiRules);
static OPENAI: OverrideClassifier<OpenAiRules> = OverrideClassifier::new(OpenAiRules);
static DEFAULT: DefaultClassifier = DefaultClassifier;

/// Shipped classifier for a provider id; unknown ids get the default heuristic.
pub fn classifier_for(provider_id: &str) -> &'static dyn ErrorClassifier {
    match provider_id.to_ascii_lowercase().as_str() {
        "anthropic" | "claude" => &ANTHROPIC,
        "bedrock" | "aws-bedrock" | "amazon-bedrock" => &BEDROCK,
        "gemini" | "google" | "vertex" | "vertex-ai" => &GEMINI,
        "openai" | "azure-openai" => &OPENAI,
        _ => &DEFAULT,
    }
}
