use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::collections::HashSet;

use super::base::{ProviderResponse, StopReason, Usage};
use crate::models::message::{Message, MessageContent, ToolRequest};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal Message format to the Anthropic Messages API specification
pub fn messages_to_anthropic_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let content: Vec<Value> = message
                .content
                .iter()
                .filter_map(content_to_anthropic_spec)
                .collect();
            json!({
                "role": message.role,
                "content": content,
            })
        })
        .collect()
}

fn content_to_anthropic_spec(content: &MessageContent) -> Option<Value> {
    match content {
        // The API rejects empty text blocks
        MessageContent::Text(text) if text.text.is_empty() => None,
        MessageContent::Text(text) => Some(json!({"type": "text", "text": text.text})),
        MessageContent::ToolRequest(request) => {
            let mut block = json!({
                "type": "tool_use",
                "id": request.id,
                "name": request.tool_call.name,
                "input": request.tool_call.arguments,
            });
            if let Some(caller) = &request.caller {
                block["caller"] = caller.clone();
            }
            Some(block)
        }
        MessageContent::ToolResponse(response) => Some(json!({
            "type": "tool_result",
            "tool_use_id": response.id,
            "content": response.content,
        })),
        MessageContent::Opaque(block) => Some(block.clone()),
    }
}

/// Convert internal Tool format to the Anthropic tool specification
pub fn tools_to_anthropic_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(tool.name()) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name()));
        }
        result.push(serde_json::to_value(tool)?);
    }

    Ok(result)
}

/// Convert an Anthropic Messages API response into a provider response
pub fn anthropic_response_to_message(response: &Value) -> Result<ProviderResponse> {
    let blocks = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow!("Invalid response format from Anthropic API: missing content"))?;

    let mut content = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                let text = block.get("text").and_then(|t| t.as_str()).unwrap_or_default();
                content.push(MessageContent::text(text));
            }
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("tool_use block without id"))?;
                let name = block
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("tool_use block {} without name", id))?;
                let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                content.push(MessageContent::ToolRequest(ToolRequest {
                    id: id.to_string(),
                    tool_call: ToolCall::new(name, input),
                    caller: block.get("caller").cloned(),
                }));
            }
            _ => content.push(MessageContent::Opaque(block.clone())),
        }
    }

    let stop_reason = response
        .get("stop_reason")
        .and_then(|r| r.as_str())
        .map(StopReason::parse)
        .ok_or_else(|| anyhow!("Invalid response format from Anthropic API: missing stop_reason"))?;

    let container = response
        .get("container")
        .and_then(|c| c.get("id"))
        .and_then(|id| id.as_str())
        .map(String::from);

    Ok(ProviderResponse {
        message: Message {
            role: Role::Assistant,
            content,
        },
        stop_reason,
        container,
        usage: get_usage(response),
    })
}

fn get_usage(data: &Value) -> Usage {
    let usage = match data.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("input_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let output_tokens = usage
        .get("output_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let total_tokens = match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => Some(input + output),
        _ => None,
    };

    Usage::new(input_tokens, output_tokens, total_tokens)
}
