use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;
use super::tool::ToolCall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub tool_call: ToolCall,
    /// Set when the call was issued from inside a provider-side tool. The
    /// provider expects it back verbatim when the turn is replayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Content passed inside a message
pub enum MessageContent {
    Text(TextContent),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
    /// A provider-managed block (server tool use, sandbox output). It is never
    /// interpreted locally, only sent back unchanged on the next request.
    Opaque(Value),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn tool_request<S: Into<String>>(id: S, tool_call: ToolCall) -> Self {
        MessageContent::ToolRequest(ToolRequest {
            id: id.into(),
            tool_call,
            caller: None,
        })
    }

    pub fn tool_response<S: Into<String>, C: Into<String>>(id: S, content: C) -> Self {
        MessageContent::ToolResponse(ToolResponse {
            id: id.into(),
            content: content.into(),
        })
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub content: Vec<MessageContent>,
}

impl Message {
    pub fn user() -> Self {
        Message {
            role: Role::User,
            content: Vec::new(),
        }
    }

    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            content: Vec::new(),
        }
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a tool request to the message
    pub fn with_tool_request<S: Into<String>>(self, id: S, tool_call: ToolCall) -> Self {
        self.with_content(MessageContent::tool_request(id, tool_call))
    }

    /// Add a tool response to the message
    pub fn with_tool_response<S: Into<String>, C: Into<String>>(self, id: S, content: C) -> Self {
        self.with_content(MessageContent::tool_response(id, content))
    }

    pub fn tool_requests(&self) -> Vec<&ToolRequest> {
        self.content
            .iter()
            .filter_map(|content| content.as_tool_request())
            .collect()
    }

    pub fn has_tool_response(&self) -> bool {
        self.content
            .iter()
            .any(|content| content.as_tool_response().is_some())
    }

    /// All text blocks joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| content.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_only_text_blocks() {
        let message = Message::assistant()
            .with_text("first")
            .with_tool_request("toolu_1", ToolCall::new("run_features", json!({})))
            .with_content(MessageContent::Opaque(json!({"type": "server_tool_use"})))
            .with_text("second");

        assert_eq!(message.text(), "first\nsecond");
        assert_eq!(message.tool_requests().len(), 1);
        assert_eq!(message.tool_requests()[0].id, "toolu_1");
        assert!(!message.has_tool_response());
    }

    #[test]
    fn test_tool_response_detection() {
        let message = Message::user().with_tool_response("toolu_1", "a,b\n1,2\n");
        assert!(message.has_tool_response());
        assert_eq!(
            message.content[0].as_tool_response().unwrap().content,
            "a,b\n1,2\n"
        );
        assert!(message.text().is_empty());
    }
}
