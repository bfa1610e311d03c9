use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, info};

use crate::dispatcher::ToolHandler;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::Tool;
use crate::providers::base::{Provider, StopReason};

/// The running exchange with the model. Messages can only be appended.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A conversation seeded with a single user turn
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            messages: vec![Message::user().with_text(prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Agent drives a model through tool calls until it produces a final answer
pub struct Agent {
    provider: Box<dyn Provider>,
    handler: Box<dyn ToolHandler>,
    tools: Vec<Tool>,
    track_container: bool,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, handler: Box<dyn ToolHandler>) -> Self {
        let tools = handler.tools();
        Self {
            provider,
            handler,
            tools,
            track_container: false,
        }
    }

    /// Give the model a provider-side code sandbox. The handler's tools become
    /// callable only from inside that sandbox, and the sandbox session is
    /// resumed on every later request.
    pub fn with_code_execution(mut self, tool_type: &str, name: &str) -> Self {
        let mut tools = vec![Tool::server(tool_type, name)];
        tools.extend(self.tools.into_iter().map(|t| t.callable_from(tool_type)));
        self.tools = tools;
        self.track_container = true;
        self
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run a fresh conversation from `prompt` and return the final answer text
    pub async fn reply(&self, prompt: &str) -> Result<String> {
        let mut conversation = Conversation::new(prompt);
        self.run(&mut conversation).await
    }

    /// Drive the conversation until the model ends its turn. Returns the text
    /// blocks of the final assistant message joined by newlines.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        let mut container: Option<String> = None;
        let mut turn = 0usize;

        loop {
            turn += 1;
            let response = self
                .provider
                .complete(conversation.messages(), &self.tools, container.as_deref())
                .await?;

            if self.track_container {
                if let Some(id) = &response.container {
                    container = Some(id.clone());
                }
            }
            debug!(
                turn,
                stop_reason = ?response.stop_reason,
                input_tokens = ?response.usage.input_tokens,
                output_tokens = ?response.usage.output_tokens,
                "model responded"
            );

            conversation.push(response.message.clone());

            if response.stop_reason == StopReason::EndTurn {
                return Ok(response.message.text());
            }

            let tool_requests: Vec<&ToolRequest> = response.message.tool_requests();
            if tool_requests.is_empty() {
                continue;
            }
            info!(turn, count = tool_requests.len(), "dispatching tool calls");

            let outputs = join_all(
                tool_requests
                    .iter()
                    .map(|request| self.handler.call(&request.tool_call)),
            )
            .await;

            let mut message_tool_response = Message::user();
            for (request, output) in tool_requests.iter().zip(outputs) {
                message_tool_response =
                    message_tool_response.with_tool_response(request.id.clone(), output?);
            }
            conversation.push(message_tool_response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageContent;
    use crate::models::tool::ToolCall;
    use crate::providers::base::ProviderResponse;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Echoes the tool name and records the order calls arrive in
    #[derive(Clone, Default)]
    struct EchoHandler {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ToolHandler for EchoHandler {
        fn tools(&self) -> Vec<Tool> {
            vec![Tool::new("echo", "Echo", json!({"type": "object"}))]
        }

        async fn call(&self, tool_call: &ToolCall) -> Result<String> {
            self.seen.lock().unwrap().push(tool_call.name.clone());
            if tool_call.name == "explode" {
                anyhow::bail!("exploded");
            }
            Ok(format!("echo:{}", tool_call.arguments))
        }
    }

    fn tool_use(calls: &[(&str, &str)]) -> ProviderResponse {
        let message = calls.iter().fold(Message::assistant(), |m, (id, name)| {
            m.with_tool_request(*id, ToolCall::new(*name, json!({"id": id})))
        });
        ProviderResponse::new(message, StopReason::ToolUse)
    }

    fn final_answer(text: &str) -> ProviderResponse {
        ProviderResponse::new(Message::assistant().with_text(text), StopReason::EndTurn)
    }

    #[tokio::test]
    async fn test_results_are_appended_in_request_order() -> Result<()> {
        let provider = MockProvider::new(vec![
            tool_use(&[("a", "echo"), ("b", "other")]),
            final_answer("done"),
        ]);
        let handler = EchoHandler::default();
        let agent = Agent::new(Box::new(provider.clone()), Box::new(handler.clone()));

        let mut conversation = Conversation::new("go");
        let answer = agent.run(&mut conversation).await?;
        assert_eq!(answer, "done");

        let results = &conversation.messages()[2];
        let ids: Vec<&str> = results
            .content
            .iter()
            .map(|c| c.as_tool_response().unwrap().id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(*handler.seen.lock().unwrap(), vec!["echo", "other"]);
        assert_eq!(conversation.messages().len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_final_text_blocks_are_joined() -> Result<()> {
        let final_message = Message::assistant()
            .with_text("line one")
            .with_content(MessageContent::Opaque(json!({"type": "code_execution_tool_result"})))
            .with_text("line two");
        let provider = MockProvider::new(vec![ProviderResponse::new(
            final_message,
            StopReason::EndTurn,
        )]);
        let agent = Agent::new(Box::new(provider), Box::new(EchoHandler::default()));

        assert_eq!(agent.reply("go").await?, "line one\nline two");
        Ok(())
    }

    #[tokio::test]
    async fn test_pause_without_tool_calls_resends_conversation() -> Result<()> {
        let provider = MockProvider::new(vec![
            ProviderResponse::new(Message::assistant().with_text("thinking"), StopReason::PauseTurn),
            final_answer("done"),
        ]);
        let agent = Agent::new(Box::new(provider.clone()), Box::new(EchoHandler::default()));

        agent.reply("go").await?;

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].messages.len(), 2);
        assert!(!calls[1].messages.iter().any(|m| m.has_tool_response()));
        Ok(())
    }

    #[tokio::test]
    async fn test_handler_errors_end_the_run() {
        let provider = MockProvider::new(vec![tool_use(&[("a", "explode")]), final_answer("never")]);
        let agent = Agent::new(Box::new(provider.clone()), Box::new(EchoHandler::default()));

        let err = agent.reply("go").await.unwrap_err();
        assert_eq!(err.to_string(), "exploded");
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_container_is_forwarded_only_with_code_execution() -> Result<()> {
        let script = || {
            vec![
                tool_use(&[("a", "echo")]).with_container("container_1"),
                final_answer("done"),
            ]
        };

        let plain = MockProvider::new(script());
        Agent::new(Box::new(plain.clone()), Box::new(EchoHandler::default()))
            .reply("go")
            .await?;
        assert_eq!(plain.calls()[1].container, None);

        let sandboxed = MockProvider::new(script());
        let agent = Agent::new(Box::new(sandboxed.clone()), Box::new(EchoHandler::default()))
            .with_code_execution("code_execution_20260120", "code_execution");
        agent.reply("go").await?;

        let calls = sandboxed.calls();
        assert_eq!(calls[0].container, None);
        assert_eq!(calls[1].container.as_deref(), Some("container_1"));
        assert_eq!(calls[0].tools, vec!["code_execution", "echo"]);
        Ok(())
    }
}
