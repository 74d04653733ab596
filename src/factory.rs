use crate::driver::{ChatDriver, OpenAIChatDriver};
use crate::provider::ResponsesProvider;
use crate::types::{DriverConfig, ModelProvider, ModelTier};
use crate::{Error, OpenAIProvider};
use std::sync::Arc;

/// Factory for creating chat drivers.
#[derive(Debug, Clone, Default)]
pub struct ChatDriverFactory {
    config: DriverConfig,
}

impl ChatDriverFactory {
    /// Create a factory whose drivers share `config`.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Create a factory configured from environment variables.
    ///
    /// A missing `OPENAI_API_KEY` is not an error here; drivers report it on
    /// their first request.
    pub fn from_env() -> Self {
        Self::new(DriverConfig::from_env())
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Create a driver for `tier` backed by `provider`.
    ///
    /// Only [`ModelProvider::OpenAI`] is implemented; other providers fail
    /// with [`Error::UnsupportedProvider`].
    pub fn create(
        &self,
        tier: ModelTier,
        provider: ModelProvider,
    ) -> Result<Box<dyn ChatDriver>, Error> {
        match provider {
            ModelProvider::OpenAI => {
                let client = OpenAIProvider::from_config(&self.config)?;
                Ok(self.create_with_provider(tier, Arc::new(client)))
            }
            unsupported => {
                tracing::warn!(provider = %unsupported, "requested unsupported provider");
                Err(Error::UnsupportedProvider(unsupported))
            }
        }
    }

    /// Create an OpenAI-format driver over a caller-supplied transport.
    pub fn create_with_provider(
        &self,
        tier: ModelTier,
        provider: Arc<dyn ResponsesProvider>,
    ) -> Box<dyn ChatDriver> {
        let driver =
            OpenAIChatDriver::new(provider, tier).with_temperature(self.config.temperature);
        tracing::debug!(model = driver.model(), "created chat driver");
        Box::new(driver)
    }
}
