use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{Provider, ProviderResponse};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A request as seen by the mock provider
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
    pub container: Option<String>,
}

/// A mock provider that returns pre-configured responses and records every
/// request it receives.
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ProviderResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        container: Option<&str>,
    ) -> Result<ProviderResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools.iter().map(|t| t.name().to_string()).collect(),
            container: container.map(String::from),
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(anyhow!("MockProvider has no more scripted responses"))
        } else {
            Ok(responses.remove(0))
        }
    }
}
