use anyhow::{anyhow, Result};
use std::env;
use std::fmt;

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_MODEL: &str = "claude-sonnet-4-6";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    /// Read an environment variable, falling back to `default` when it is optional
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Clone)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: i32,
}

impl AnthropicProviderConfig {
    pub fn new(api_key: String, host: String, model: String) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens: 4096,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl fmt::Debug for AnthropicProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProviderConfig")
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProviderConfig for AnthropicProviderConfig {
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("ANTHROPIC_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("Anthropic API key should be present"))?;

        let host = Self::get_env("ANTHROPIC_HOST", false, None)?
            .unwrap_or_else(|| ANTHROPIC_HOST.to_string());

        let model = Self::get_env("ANTHROPIC_MODEL", false, None)?
            .unwrap_or_else(|| ANTHROPIC_MODEL.to_string());

        Ok(Self::new(api_key, host, model))
    }
}
