use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable overriding the OpenAI base URL.
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Low but non-zero, so wording may vary while factual content stays stable.
pub const DEFAULT_TEMPERATURE: f32 = 0.25;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Logical model size, resolved to a concrete model identifier by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Mini,
    Standard,
    Large,
}

impl ModelTier {
    /// Concrete OpenAI model identifier for this tier.
    pub fn openai_model(&self) -> &'static str {
        match self {
            ModelTier::Mini => "gpt-4.1-mini",
            ModelTier::Standard => "gpt-4o",
            ModelTier::Large => "gpt-4.1",
        }
    }
}

/// Backing model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAI,
    Google,
    Anthropic,
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelProvider::OpenAI => "openai",
            ModelProvider::Google => "google",
            ModelProvider::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

/// Settings shared by every driver a factory creates.
///
/// The API key is optional here: a missing key is reported when a request is
/// made, not when the configuration is built.
#[derive(Clone)]
pub struct DriverConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl DriverConfig {
    /// Configuration with no credential and default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.api_key = env::var(OPENAI_API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Ok(base_url) = env::var(OPENAI_BASE_URL_VAR) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}
