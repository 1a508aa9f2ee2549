//! Chat completions wire format (`messages` + nested `function` tools).

use agent_core::tools::{ToolCallFragment, ToolCallRef, ToolDefinition};
use agent_core::{Message, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::errors::{provider_error, ProtocolError, ProtocolResult};
use super::RequestOptions;
use crate::types::{CompletedReply, LLMChunk};

/// Convert internal [`Message`] values to the `messages` array.
///
/// Internal fields (`id`, `created_at`, `hidden`, `tool_name`) are never sent, and
/// a message with neither content nor tool calls is dropped.
pub fn messages_to_wire(system_prompt: Option<&str>, messages: &[Message]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);

    if let Some(prompt) = system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
        out.push(json!({ "role": "system", "content": prompt }));
    }

    for message in messages {
        match message.role {
            Role::User => out.push(json!({ "role": "user", "content": message.content })),
            Role::Assistant => {
                if message.is_empty() {
                    continue;
                }
                let content = if message.content.is_empty() {
                    Value::Null
                } else {
                    json!(message.content)
                };
                let mut msg = json!({ "role": "assistant", "content": content });
                if let Some(tool_calls) = message.tool_calls.as_ref().filter(|c| !c.is_empty()) {
                    msg["tool_calls"] = tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.call_id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                },
                            })
                        })
                        .collect();
                }
                out.push(msg);
            }
            Role::Tool => out.push(json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
                "content": message.content,
            })),
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
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                    "strict": true,
                },
            }))
        })
        .collect()
}

pub fn build_request(
    options: &RequestOptions,
    messages: Vec<Value>,
    tools: &[ToolDefinition],
) -> ProtocolResult<Value> {
    let mut body = json!({
        "model": options.model,
        "messages": messages,
        "stream": options.stream,
    });

    if !tools.is_empty() {
        body["tools"] = Value::Array(tools_to_wire(tools)?);
    }
    if let Some(max_tokens) = options.max_output_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }

    Ok(body)
}

// --- streaming chunk parsing ---

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Deserialize, Default)]
struct ChatDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCallDelta {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<ChatFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Interpret one `data:` payload. Only the first choice is read.
pub fn interpret_stream_record(data: &str) -> ProtocolResult<Vec<LLMChunk>> {
    let payload: Value = serde_json::from_str(data)?;
    if let Some(message) = provider_error(&payload) {
        return Err(ProtocolError::Provider(message));
    }

    let chunk = ChatStreamChunk::deserialize(&payload)?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    if let Some(content) = choice.delta.content.filter(|content| !content.is_empty()) {
        out.push(LLMChunk::Token(content));
    }

    let fragments: Vec<ToolCallFragment> = choice
        .delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|delta| {
            let (name, arguments) = delta
                .function
                .map(|function| (function.name, function.arguments))
                .unwrap_or((None, None));
            ToolCallFragment {
                index: delta.index,
                id: delta.id.clone(),
                call_id: delta.id,
                name,
                arguments,
                complete_arguments: None,
            }
        })
        .collect();
    if !fragments.is_empty() {
        out.push(LLMChunk::ToolCalls(fragments));
    }

    Ok(out)
}

// --- non-streamed completion parsing ---

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
    function_call: Option<ChatFunction>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

pub fn finalize_non_streamed(payload: &Value) -> ProtocolResult<CompletedReply> {
    if let Some(message) = provider_error(payload) {
        return Err(ProtocolError::Provider(message));
    }

    let completion = ChatCompletion::deserialize(payload)?;
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(ProtocolError::InvalidPayload(
            "completion has no choices".to_string(),
        ));
    };
    let message = choice.message;

    let mut tool_calls: Vec<ToolCallRef> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter(|call| !call.function.name.trim().is_empty())
        .map(|call| {
            let id = call
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4()));
            ToolCallRef::new(id, call.function.name, call.function.arguments)
        })
        .collect();

    if tool_calls.is_empty() {
        if let Some(function) = message
            .function_call
            .filter(|function| !function.name.trim().is_empty())
        {
            tool_calls.push(ToolCallRef::new(
                format!("call_{}", Uuid::new_v4()),
                function.name,
                function.arguments,
            ));
        }
    }

    Ok(CompletedReply {
        reply_text: message.content.unwrap_or_default(),
        tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tools::ToolCallRef;

    fn options(stream: bool) -> RequestOptions {
        RequestOptions {
            model: "m".to_string(),
            stream,
            max_output_tokens: None,
            temperature: None,
        }
    }

    #[test]
    fn messages_to_wire_omits_internal_fields() {
        let out = messages_to_wire(None, &[Message::user("Hello")]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0], json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn messages_to_wire_prefixes_system_prompt() {
        let out = messages_to_wire(Some("Be brief."), &[Message::user("Hello")]);
        assert_eq!(out[0], json!({"role": "system", "content": "Be brief."}));

        let out = messages_to_wire(Some("  "), &[Message::user("Hello")]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn messages_to_wire_includes_tool_fields() {
        let messages = vec![
            Message::assistant(
                "",
                Some(vec![ToolCallRef::new("call_1", "get_page", r#"{"tab_id":3}"#)]),
            ),
            Message::tool_result("call_1", "get_page", "page text"),
        ];

        let out = messages_to_wire(None, &messages);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["role"], "assistant");
        assert!(out[0]["content"].is_null());
        assert_eq!(out[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(out[0]["tool_calls"][0]["type"], "function");
        assert_eq!(out[0]["tool_calls"][0]["function"]["name"], "get_page");
        assert_eq!(
            out[0]["tool_calls"][0]["function"]["arguments"],
            r#"{"tab_id":3}"#
        );
        assert_eq!(out[1]["role"], "tool");
        assert_eq!(out[1]["tool_call_id"], "call_1");
        assert!(out[1].get("tool_name").is_none());
    }

    #[test]
    fn messages_to_wire_drops_empty_assistant() {
        let messages = vec![Message::user("hi"), Message::assistant("", None)];
        assert_eq!(messages_to_wire(None, &messages).len(), 1);
    }

    #[test]
    fn tools_to_wire_uses_nested_function_shape() {
        let tools = vec![ToolDefinition::new(
            "list_tabs",
            "List open tabs",
            json!({"type": "object", "properties": {}, "required": [], "additionalProperties": false}),
        )];

        let out = tools_to_wire(&tools).unwrap();

        assert_eq!(out[0]["type"], "function");
        assert_eq!(out[0]["function"]["name"], "list_tabs");
        assert_eq!(out[0]["function"]["description"], "List open tabs");
        assert_eq!(out[0]["function"]["strict"], true);
        assert_eq!(out[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn tools_to_wire_rejects_missing_description() {
        let tools = vec![ToolDefinition::new("list_tabs", "", json!({"type": "object"}))];
        assert!(matches!(
            tools_to_wire(&tools),
            Err(ProtocolError::InvalidToolDefinition(_))
        ));
    }

    #[test]
    fn build_request_without_tools_matches_minimal_shape() {
        let body = build_request(&options(true), messages_to_wire(None, &[Message::user("hi")]), &[])
            .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true,
            })
        );
    }

    #[test]
    fn build_request_with_limits() {
        let mut opts = options(false);
        opts.max_output_tokens = Some(4096);
        opts.temperature = Some(0.5);

        let body = build_request(&opts, Vec::new(), &[]).unwrap();

        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn stream_content_delta_yields_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            interpret_stream_record(data).unwrap(),
            vec![LLMChunk::Token("Hello".to_string())]
        );
    }

    #[test]
    fn stream_tool_call_delta_yields_fragments() {
        let data = r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_1","type":"function","function":{"name":"get_page","arguments":"{\"tab"}}]}}]}"#;

        let chunks = interpret_stream_record(data).unwrap();

        match &chunks[..] {
            [LLMChunk::ToolCalls(fragments)] => {
                assert_eq!(fragments.len(), 1);
                assert_eq!(fragments[0].index, 1);
                assert_eq!(fragments[0].id.as_deref(), Some("call_1"));
                assert_eq!(fragments[0].call_id.as_deref(), Some("call_1"));
                assert_eq!(fragments[0].name.as_deref(), Some("get_page"));
                assert_eq!(fragments[0].arguments.as_deref(), Some("{\"tab"));
            }
            other => panic!("expected one ToolCalls chunk, got {other:?}"),
        }
    }

    #[test]
    fn stream_argument_only_delta_has_no_name() {
        let data = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\":1}"}}]}}]}"#;

        let chunks = interpret_stream_record(data).unwrap();

        let LLMChunk::ToolCalls(fragments) = &chunks[0] else {
            panic!("expected tool calls");
        };
        assert!(fragments[0].name.is_none());
        assert!(fragments[0].id.is_none());
    }

    #[test]
    fn stream_empty_delta_and_no_choices_yield_nothing() {
        assert!(interpret_stream_record(r#"{"choices":[{"delta":{}}]}"#)
            .unwrap()
            .is_empty());
        assert!(interpret_stream_record(r#"{"choices":[]}"#).unwrap().is_empty());
        assert!(interpret_stream_record(r#"{"choices":[{"delta":{"content":""},"finish_reason":"stop"}]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn stream_invalid_json_is_an_error() {
        assert!(matches!(
            interpret_stream_record("{invalid json}"),
            Err(ProtocolError::Serialization(_))
        ));
    }

    #[test]
    fn stream_error_payload_is_an_error() {
        let data = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        match interpret_stream_record(data) {
            Err(ProtocolError::Provider(message)) => assert_eq!(message, "Rate limit reached"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn non_streamed_reads_content_and_tool_calls() {
        let payload = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "click_button", "arguments": "{\"id\":\"submit\"}"}
                    }]
                }
            }]
        });

        let reply = finalize_non_streamed(&payload).unwrap();

        assert_eq!(reply.reply_text, "");
        assert_eq!(
            reply.tool_calls,
            vec![ToolCallRef::new("call_9", "click_button", "{\"id\":\"submit\"}")]
        );
    }

    #[test]
    fn non_streamed_supports_legacy_function_call() {
        let payload = json!({
            "choices": [{
                "message": {
                    "content": "",
                    "function_call": {"name": "list_tabs", "arguments": "{}"}
                }
            }]
        });

        let reply = finalize_non_streamed(&payload).unwrap();

        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "list_tabs");
        assert!(reply.tool_calls[0].call_id.starts_with("call_"));
        assert_eq!(reply.tool_calls[0].id, reply.tool_calls[0].call_id);
    }

    #[test]
    fn non_streamed_text_reply() {
        let payload = json!({"choices": [{"message": {"content": "All done."}}]});
        let reply = finalize_non_streamed(&payload).unwrap();
        assert_eq!(reply.reply_text, "All done.");
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn non_streamed_errors() {
        assert!(matches!(
            finalize_non_streamed(&json!({"choices": []})),
            Err(ProtocolError::InvalidPayload(_))
        ));
        assert!(matches!(
            finalize_non_streamed(&json!({"error": {"message": "Invalid API key"}})),
            Err(ProtocolError::Provider(_))
        ));
    }
}
