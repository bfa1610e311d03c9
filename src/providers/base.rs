use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    PauseTurn,
    Other(String),
}

impl StopReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "pause_turn" => StopReason::PauseTurn,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// One model response
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    /// Handle of the sandbox session the provider ran code in, if any
    pub container: Option<String>,
    pub usage: Usage,
}

impl ProviderResponse {
    pub fn new(message: Message, stop_reason: StopReason) -> Self {
        Self {
            message,
            stop_reason,
            container: None,
            usage: Usage::default(),
        }
    }

    pub fn with_container<S: Into<String>>(mut self, container: S) -> Self {
        self.container = Some(container.into());
        self
    }
}

/// Base trait for chat model providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for the conversation. `container`
    /// resumes an existing sandbox session when the provider supports one.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        container: Option<&str>,
    ) -> Result<ProviderResponse>;
}
