use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of tool results that report a failure back to the model.
pub const TOOL_ERROR_PREFIX: &str = "Error:";

pub fn is_error_result(content: &str) -> bool {
    content.trim_start().starts_with(TOOL_ERROR_PREFIX)
}

/// A finalized tool call emitted by the model.
///
/// `id` identifies the call inside the provider response, `call_id` is what the
/// matching tool result must reference. Chat completions use one value for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRef {
    pub id: String,
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallRef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            call_id: id.clone(),
            id,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Arguments as JSON; empty text is treated as `{}`.
    pub fn parsed_arguments(&self) -> serde_json::Result<serde_json::Value> {
        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidToolDefinition {
    #[error("tool name cannot be empty")]
    EmptyName,

    #[error("tool '{0}' has no description")]
    EmptyDescription(String),

    #[error("tool '{0}' parameters must be a JSON object schema")]
    InvalidParameters(String),
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidToolDefinition> {
        if self.name.trim().is_empty() {
            return Err(InvalidToolDefinition::EmptyName);
        }
        if self.description.trim().is_empty() {
            return Err(InvalidToolDefinition::EmptyDescription(self.name.clone()));
        }
        if !self.parameters.is_object() {
            return Err(InvalidToolDefinition::InvalidParameters(self.name.clone()));
        }
        Ok(())
    }
}

/// One streamed piece of a tool call, addressed by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub index: u32,
    pub id: Option<String>,
    pub call_id: Option<String>,
    pub name: Option<String>,
    /// Appended to the arguments seen so far.
    pub arguments: Option<String>,
    /// Full argument text; used only if nothing was streamed for this position.
    pub complete_arguments: Option<String>,
}

impl ToolCallFragment {
    pub fn arguments_delta(index: u32, delta: impl Into<String>) -> Self {
        Self {
            index,
            arguments: Some(delta.into()),
            ..Default::default()
        }
    }
}
