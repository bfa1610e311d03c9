use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::base::{Provider, ProviderResponse};
use super::configs::{AnthropicProviderConfig, ANTHROPIC_VERSION};
use super::utils::{anthropic_response_to_message, messages_to_anthropic_spec, tools_to_anthropic_spec};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let error_text = response.text().await?;
                Err(anyhow!("Request failed: {} - {}", status, error_text))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        container: Option<&str>,
    ) -> Result<ProviderResponse> {
        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages_to_anthropic_spec(messages),
        });

        if !tools.is_empty() {
            payload["tools"] = json!(tools_to_anthropic_spec(tools)?);
        }
        if let Some(container) = container {
            payload["container"] = json!(container);
        }

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            container = ?container,
            "sending messages request"
        );
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Anthropic API error: {}", error));
        }

        anthropic_response_to_message(&response)
    }
}
