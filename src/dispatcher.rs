use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::info;

use crate::data::FeatureRegistry;
use crate::errors::AgentError;
use crate::models::tool::{Tool, ToolCall};

pub const DISCOVER_FEATURES: &str = "discover_features";
pub const RUN_FEATURES: &str = "run_features";

/// Executes the tool calls a model asks for.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Declarations of the tools this handler accepts
    fn tools(&self) -> Vec<Tool>;

    /// Execute one call and return its textual result. Recoverable problems,
    /// such as an unknown tool, are reported inside the text; an `Err` ends the run.
    async fn call(&self, tool_call: &ToolCall) -> Result<String>;
}

#[derive(Debug, Default, Deserialize)]
struct DiscoverArgs {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunArgs {
    feature_names: Vec<String>,
}

/// Serves `discover_features` and `run_features` from a feature registry.
pub struct ToolDispatcher {
    registry: FeatureRegistry,
}

impl ToolDispatcher {
    pub fn new(registry: FeatureRegistry) -> Self {
        Self { registry }
    }

    /// JSON list of feature group docs, optionally filtered by a name substring
    pub fn discover_features(&self, name: Option<&str>) -> Result<String> {
        let docs = self.registry.docs(name);
        Ok(serde_json::to_string(&docs)?)
    }

    /// CSV of the requested features. Unresolvable names are an error.
    pub fn run_features<S: AsRef<str>>(&self, feature_names: &[S]) -> Result<String> {
        let frames = self.registry.run_all(feature_names)?;
        Ok(frames
            .iter()
            .map(|frame| frame.to_csv())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Route a call by name. Unknown or malformed names produce an error
    /// payload instead of failing.
    pub fn dispatch(&self, name: &str, arguments: &Value) -> Result<String> {
        if !is_valid_function_name(name) {
            return Ok(error_payload(&AgentError::ToolNotFound(format!(
                "{} (function names must match [a-zA-Z0-9_-]{{1,64}})",
                name
            ))));
        }
        match name {
            DISCOVER_FEATURES => {
                let args: DiscoverArgs = parse_arguments(name, arguments)?;
                self.discover_features(args.name.as_deref())
            }
            RUN_FEATURES => {
                let args: RunArgs = parse_arguments(name, arguments)?;
                self.run_features(&args.feature_names)
            }
            _ => Ok(error_payload(&AgentError::ToolNotFound(name.to_string()))),
        }
    }

    pub fn tool_declarations() -> Vec<Tool> {
        vec![
            Tool::new(
                DISCOVER_FEATURES,
                "Discover available feature groups and their supported feature names. \
                 Returns documentation for all loaded feature groups.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Optional filter by feature group name (partial match)."
                        }
                    },
                    "required": []
                }),
            ),
            Tool::new(
                RUN_FEATURES,
                "Fetch data for the given feature names. \
                 Returns a CSV string of the resulting table.",
                json!({
                    "type": "object",
                    "properties": {
                        "feature_names": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "List of feature names to fetch."
                        }
                    },
                    "required": ["feature_names"]
                }),
            ),
        ]
    }
}

#[async_trait]
impl ToolHandler for ToolDispatcher {
    fn tools(&self) -> Vec<Tool> {
        Self::tool_declarations()
    }

    async fn call(&self, tool_call: &ToolCall) -> Result<String> {
        info!(tool = %tool_call.name, "dispatching tool call");
        self.dispatch(&tool_call.name, &tool_call.arguments)
    }
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(tool: &str, arguments: &Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| {
        AgentError::InvalidParameters(format!("Could not interpret arguments for {}: {}", tool, e))
            .into()
    })
}

fn is_valid_function_name(name: &str) -> bool {
    static FUNCTION_NAME: OnceLock<Regex> = OnceLock::new();
    FUNCTION_NAME
        .get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("function name pattern is valid")
        })
        .is_match(name)
}

fn error_payload(error: &AgentError) -> String {
    json!({ "error": error.to_string() }).to_string()
}
