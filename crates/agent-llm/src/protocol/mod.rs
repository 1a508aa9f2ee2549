//! Protocol adapters between internal messages and the provider wire formats.
//!
//! Two formats are supported, selected once per turn:
//!
//! - [`WireFormat::Chat`]: chat completions (`messages`, nested `function` tools,
//!   `choices[0].delta` stream records).
//! - [`WireFormat::Responses`]: responses (`input` items, `instructions`, flat tools,
//!   typed `response.*` stream records).

pub mod chat;
pub mod errors;
pub mod history;
pub mod responses;

use agent_core::tools::ToolDefinition;
use agent_core::Message;
use chat_core::ApiFormat;
use serde_json::Value;

use crate::providers::common::sse::SseFrame;
use crate::types::{CompletedReply, LLMChunk};

pub use errors::{ProtocolError, ProtocolResult};
pub use history::{serialize_history, trim_history, SUPERSEDED_RESULT_MARKER};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireFormat {
    #[default]
    Chat,
    Responses,
}

impl From<ApiFormat> for WireFormat {
    fn from(format: ApiFormat) -> Self {
        match format {
            ApiFormat::Chat => WireFormat::Chat,
            ApiFormat::Responses => WireFormat::Responses,
        }
    }
}

/// Per-request settings that are not part of the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub model: String,
    pub stream: bool,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Build the full request body for one provider call.
pub fn build_request(
    format: WireFormat,
    options: &RequestOptions,
    system_prompt: Option<&str>,
    messages: &[Message],
    tools: &[ToolDefinition],
) -> ProtocolResult<Value> {
    let history = serialize_history(format, system_prompt, messages)?;
    match format {
        WireFormat::Chat => chat::build_request(options, history, tools),
        WireFormat::Responses => responses::build_request(options, system_prompt, history, tools),
    }
}

/// Turn one decoded stream record into text deltas and tool-call fragments.
pub fn interpret_stream_record(
    format: WireFormat,
    frame: &SseFrame,
) -> ProtocolResult<Vec<LLMChunk>> {
    if frame.data.trim().is_empty() {
        return Ok(Vec::new());
    }
    match format {
        WireFormat::Chat => chat::interpret_stream_record(&frame.data),
        WireFormat::Responses => {
            responses::interpret_stream_record(frame.event.as_deref(), &frame.data)
        }
    }
}

pub fn finalize_non_streamed(format: WireFormat, payload: &Value) -> ProtocolResult<CompletedReply> {
    match format {
        WireFormat::Chat => chat::finalize_non_streamed(payload),
        WireFormat::Responses => responses::finalize_non_streamed(payload),
    }
}
