use crate::types::{CompletedReply, LLMChunk};
use agent_core::{tools::ToolDefinition, Message};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Protocol conversion error: {0}")]
    Protocol(#[from] crate::protocol::ProtocolError),
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMChunk>> + Send>>;

/// How the provider delivered its reply.
pub enum LLMResponse {
    /// Server-sent events, interpreted lazily.
    Stream(LLMStream),
    /// A single JSON document.
    Complete(CompletedReply),
}

impl std::fmt::Debug for LLMResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMResponse::Stream(_) => f.write_str("LLMResponse::Stream(..)"),
            LLMResponse::Complete(reply) => f.debug_tuple("LLMResponse::Complete").field(reply).finish(),
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one model request for the conversation so far.
    ///
    /// # Arguments
    /// * `system_prompt` - Sent as a `system` message or as `instructions`, per format
    /// * `messages` - Conversation history, untrimmed
    /// * `tools` - Tool definitions; an empty slice omits `tools` from the request
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;
}
