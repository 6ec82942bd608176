use std::sync::Arc;

use crate::classify::{CallContext, Operation};
use crate::client::builder::CompletionClientBuilder;
use crate::config::RuntimeConfig;
use crate::drivers::{CompletionRequest, ProviderDriver};
use crate::types::Completion;
use crate::Result;

/// Provider-independent completion client.
///
/// Holds only shared, immutable state, so clones are cheap and concurrent calls need no
/// locking.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    pub(crate) driver: Arc<dyn ProviderDriver>,
    pub(crate) config: Arc<RuntimeConfig>,
}

impl CompletionClient {
    /// Client over `driver` with the default runtime configuration.
    pub fn new<D: ProviderDriver + 'static>(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
            config: Arc::new(RuntimeConfig::default()),
        }
    }

    pub fn builder() -> CompletionClientBuilder {
        CompletionClientBuilder::new()
    }

    pub fn driver(&self) -> &dyn ProviderDriver {
        self.driver.as_ref()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn provider_id(&self) -> &str {
        self.driver.provider_id()
    }

    /// Blocking path: one driver response, normalized into a [`Completion`].
    pub async fn execute(&self, request: &CompletionRequest) -> Result<Completion> {
        self.execute_with_stats(request).await.map(|(completion, _)| completion)
    }

    /// Streaming path: the driver's chunks aggregated into a [`Completion`].
    pub async fn stream(&self, request: &CompletionRequest) -> Result<Completion> {
        self.stream_with_stats(request).await.map(|(completion, _)| completion)
    }

    pub(crate) fn call_context(&self, request: &CompletionRequest, operation: Operation) -> CallContext {
        CallContext::new(self.driver.provider_id(), request.model.as_str(), operation)
    }
}
