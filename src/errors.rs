use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Failures raised by the feature-group layer. These are not caught by the
/// dispatcher; they end the run that requested the data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No feature group provides the feature '{0}'")]
    UnresolvedFeature(String),

    #[error("At least one feature name is required")]
    EmptyRequest,

    #[error("Feature group '{group}' did not produce column '{column}'")]
    MissingColumn { group: String, column: String },
}

