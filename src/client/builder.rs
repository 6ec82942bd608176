use std::sync::Arc;

use crate::client::core::CompletionClient;
use crate::config::RuntimeConfig;
use crate::drivers::ProviderDriver;
use crate::{Error, ErrorContext, Result};

/// Builder for clients with custom configuration.
///
/// ```
/// use ai_lib_unify::client::CompletionClientBuilder;
///
/// let err = CompletionClientBuilder::new().build().unwrap_err();
/// assert_eq!(err.name(), "configuration_error");
/// ```
#[derive(Debug, Default)]
pub struct CompletionClientBuilder {
    driver: Option<Arc<dyn ProviderDriver>>,
    config: RuntimeConfig,
}

impl CompletionClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider driver. Required.
    pub fn driver<D: ProviderDriver + 'static>(mut self, driver: D) -> Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    /// Share a driver already held elsewhere.
    pub fn shared_driver(mut self, driver: Arc<dyn ProviderDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply `AI_LIB_*` environment overrides on top of the current configuration.
    pub fn config_from_env(mut self) -> Result<Self> {
        self.config = self.config.apply_env()?;
        Ok(self)
    }

    pub fn build(self) -> Result<CompletionClient> {
        let driver = self.driver.ok_or_else(|| {
            Error::configuration_with_context(
                "a provider driver is required",
                ErrorContext::new()
                    .with_field_path("driver")
                    .with_source("client_builder"),
            )
        })?;
        Ok(CompletionClient {
            driver,
            config: Arc::new(self.config),
        })
    }
}
