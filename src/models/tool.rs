use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool declaration sent to the model alongside the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Tool {
    /// A tool the local dispatcher executes
    Function(FunctionTool),
    /// A tool the provider executes on its side, such as a code sandbox
    Server(ServerTool),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the arguments the tool accepts
    pub input_schema: Value,
    /// Server tools allowed to call this tool; empty means the model calls it directly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_callers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub name: String,
}

impl Tool {
    /// Create a new locally executed tool with the given name and description
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool::Function(FunctionTool {
            name: name.into(),
            description: description.into(),
            input_schema,
            allowed_callers: Vec::new(),
        })
    }

    pub fn server<T: Into<String>, N: Into<String>>(tool_type: T, name: N) -> Self {
        Tool::Server(ServerTool {
            tool_type: tool_type.into(),
            name: name.into(),
        })
    }

    /// Restrict a function tool so only the given server tool may invoke it.
    /// Server tools are returned unchanged.
    pub fn callable_from<S: Into<String>>(self, caller: S) -> Self {
        match self {
            Tool::Function(mut tool) => {
                tool.allowed_callers.push(caller.into());
                Tool::Function(tool)
            }
            server => server,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::Function(tool) => &tool.name,
            Tool::Server(tool) => &tool.name,
        }
    }
}

/// A tool call request that the dispatcher can execute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
