//! Responses wire format (`input` items + flat tools).

use agent_core::tools::{ToolCallFragment, ToolCallRef, ToolDefinition};
use agent_core::{Message, Role};
use serde_json::{json, Value};
use uuid::Uuid;

use super::errors::{provider_error, ProtocolError, ProtocolResult};
use super::RequestOptions;
use crate::types::{CompletedReply, LLMChunk};

/// Flatten messages into `input` items.
///
/// The system prompt travels separately as `instructions`, so no `system` item is
/// ever produced here.
pub fn messages_to_input(messages: &[Message]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::User => out.push(json!({ "role": "user", "content": message.content })),
            Role::Assistant => {
                if !message.content.is_empty() {
                    out.push(json!({ "role": "assistant", "content": message.content }));
                }
                for call in message.tool_calls.iter().flatten() {
                    out.push(json!({
                        "type": "function_call",
                        "call_id": call.call_id,
                        "name": call.name,
                        "arguments": call.arguments,
                    }));
                }
            }
            Role::Tool => {
                let Some(call_id) = message.tool_call_id.as_ref() else {
                    continue;
                };
                out.push(json!({
                    "type": "function_call_output",
                    "call_id": call_id,
                    "output": message.content,
                }));
            }
        }
    }

    out
}

pub fn tools_to_wire(tools: &[ToolDefinition]) -> ProtocolResult<Vec<Value>> {
    tools
        .iter()
        .map(|tool| {
            tool.validate()?;
            Ok(json!({
                "type": "function",
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
                "strict": true,
            }))
        })
        .collect()
}

pub fn build_request(
    options: &RequestOptions,
    instructions: Option<&str>,
    input: Vec<Value>,
    tools: &[ToolDefinition],
) -> ProtocolResult<Value> {
    let mut body = json!({
        "model": options.model,
        "input": input,
        "stream": options.stream,
    });

    if let Some(instructions) = instructions.filter(|text| !text.trim().is_empty()) {
        body["instructions"] = json!(instructions);
    }
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools_to_wire(tools)?);
    }
    if let Some(max_output_tokens) = options.max_output_tokens {
        body["max_output_tokens"] = json!(max_output_tokens);
    }
    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }

    Ok(body)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn output_index(payload: &Value) -> u32 {
    payload
        .get("output_index")
        .and_then(Value::as_u64)
        .and_then(|index| u32::try_from(index).ok())
        .unwrap_or(0)
}

fn function_call_fragment(index: u32, item: &Value) -> Option<ToolCallFragment> {
    if item.get("type").and_then(Value::as_str) != Some("function_call") {
        return None;
    }
    Some(ToolCallFragment {
        index,
        id: str_field(item, "id"),
        call_id: str_field(item, "call_id"),
        name: str_field(item, "name"),
        arguments: None,
        complete_arguments: str_field(item, "arguments"),
    })
}

/// Interpret one stream record. The record type comes from the payload's `type`
/// field, falling back to the SSE event name.
pub fn interpret_stream_record(event: Option<&str>, data: &str) -> ProtocolResult<Vec<LLMChunk>> {
    let payload: Value = serde_json::from_str(data)?;

    let record_type = payload
        .get("type")
        .and_then(Value::as_str)
        .or(event)
        .unwrap_or_default();

    let chunk = match record_type {
        "response.output_text.delta" | "response.refusal.delta" => {
            str_field(&payload, "delta").map(LLMChunk::Token)
        }
        "response.output_item.added" | "response.output_item.done" => payload
            .get("item")
            .and_then(|item| function_call_fragment(output_index(&payload), item))
            .map(|fragment| LLMChunk::ToolCalls(vec![fragment])),
        "response.function_call_arguments.delta" => {
            str_field(&payload, "delta").map(|delta| {
                LLMChunk::ToolCalls(vec![ToolCallFragment {
                    index: output_index(&payload),
                    id: str_field(&payload, "item_id"),
                    arguments: Some(delta),
                    ..Default::default()
                }])
            })
        }
        "response.function_call_arguments.done" => Some(LLMChunk::ToolCalls(vec![
            ToolCallFragment {
                index: output_index(&payload),
                id: str_field(&payload, "item_id"),
                complete_arguments: str_field(&payload, "arguments"),
                ..Default::default()
            },
        ])),
        "error" => {
            let message = str_field(&payload, "message")
                .or_else(|| provider_error(&payload))
                .unwrap_or_else(|| payload.to_string());
            return Err(ProtocolError::Provider(message));
        }
        "response.failed" => {
            let message = payload
                .get("response")
                .and_then(provider_error)
                .unwrap_or_else(|| "response failed".to_string());
            return Err(ProtocolError::Provider(message));
        }
        _ => {
            if let Some(message) = provider_error(&payload) {
                return Err(ProtocolError::Provider(message));
            }
            None
        }
    };

    Ok(chunk.into_iter().collect())
}

pub fn finalize_non_streamed(payload: &Value) -> ProtocolResult<CompletedReply> {
    if let Some(message) = provider_error(payload) {
        return Err(ProtocolError::Provider(message));
    }

    let Some(output) = payload.get("output").and_then(Value::as_array) else {
        return Err(ProtocolError::InvalidPayload(
            "response has no output".to_string(),
        ));
    };

    let mut reply = CompletedReply::default();
    for item in output {
        match item.get("type").and_then(Value::as_str) {
            Some("message") => {
                let parts = item
                    .get("content")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
                    .filter_map(|part| part.get("text").and_then(Value::as_str));
                for text in parts {
                    reply.reply_text.push_str(text);
                }
            }
            Some("function_call") => {
                let Some(name) = str_field(item, "name") else {
                    continue;
                };
                let call_id = str_field(item, "call_id")
                    .or_else(|| str_field(item, "id"))
                    .unwrap_or_else(|| format!("call_{}", Uuid::new_v4()));
                let id = str_field(item, "id").unwrap_or_else(|| call_id.clone());
                reply.tool_calls.push(ToolCallRef {
                    id,
                    call_id,
                    name,
                    arguments: str_field(item, "arguments").unwrap_or_default(),
                });
            }
            _ => {}
        }
    }

    Ok(reply)
}
