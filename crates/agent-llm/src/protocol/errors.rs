//! Error types for protocol conversion.

use agent_core::tools::InvalidToolDefinition;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("orphaned tool result: no tool call with id '{0}'")]
    OrphanedToolResult(String),

    #[error("Invalid tool definition: {0}")]
    InvalidToolDefinition(#[from] InvalidToolDefinition),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The provider reported an error inside an otherwise well-formed payload.
    #[error("Provider error: {0}")]
    Provider(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Pulls `error.message` (or the whole `error` value) out of a provider payload.
pub(crate) fn provider_error(payload: &serde_json::Value) -> Option<String> {
    let error = payload.get("error").filter(|error| !error.is_null())?;
    let message = error
        .get("message")
        .and_then(|message| message.as_str())
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_error_prefers_message_field() {
        let payload = json!({"error": {"message": "Invalid API key", "code": "invalid_api_key"}});
        assert_eq!(provider_error(&payload).as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn provider_error_ignores_null_and_missing() {
        assert!(provider_error(&json!({"error": null})).is_none());
        assert!(provider_error(&json!({"choices": []})).is_none());
    }

    #[test]
    fn provider_error_falls_back_to_raw_value() {
        assert_eq!(
            provider_error(&json!({"error": "overloaded"})).as_deref(),
            Some("overloaded")
        );
        assert_eq!(
            provider_error(&json!({"error": {"code": 500}})).as_deref(),
            Some(r#"{"code":500}"#)
        );
    }
}
