use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use agent_core::storage::Storage;
use agent_core::tools::ToolCallRef;
use agent_core::{AgentError, AgentEvent, AgentStatus, ConversationState, Message};
use agent_llm::{LLMProvider, LLMResponse};
use agent_tools::{status_for_tool, ToolDispatcher, ToolInvocation};

use crate::config::AgentLoopConfig;
use crate::stream::handler::consume_llm_stream;

pub type Result<T> = std::result::Result<T, AgentError>;

pub type SharedConversation = Arc<Mutex<ConversationState>>;

/// Result text for calls skipped because the turn was stopped.
pub const CANCELLED_TOOL_RESULT: &str = "Error: cancelled by user";

/// How a turn that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    /// The model produced a reply without tool calls.
    Completed { rounds: usize },
    /// The cancel token fired.
    Stopped,
}

/// Everything one turn needs besides the conversation itself.
pub struct LoopContext<'a> {
    pub event_tx: &'a mpsc::Sender<AgentEvent>,
    pub llm: &'a Arc<dyn LLMProvider>,
    pub tools: Option<&'a ToolDispatcher>,
    pub storage: Option<&'a Arc<dyn Storage>>,
    pub cancel_token: &'a CancellationToken,
    pub config: &'a AgentLoopConfig,
}

/// Run model rounds until a reply without tool calls, cancellation, an error, or the
/// round limit.
///
/// The user message must already be in `state`. On error or cancellation an empty
/// assistant placeholder is removed; everything else appended so far is kept.
pub async fn run_agent_loop_with_config(
    state: &SharedConversation,
    ctx: LoopContext<'_>,
) -> Result<LoopEnd> {
    let conversation_id = state.lock().await.conversation_id.clone();
    let tool_definitions = match ctx.tools {
        Some(dispatcher) if ctx.config.enable_tools => dispatcher.definitions(),
        _ => Vec::new(),
    };

    log::debug!(
        "[{}] Starting agent loop: max_rounds={}, tools={}",
        conversation_id,
        ctx.config.max_rounds,
        tool_definitions.len()
    );

    for round in 0..ctx.config.max_rounds {
        if ctx.cancel_token.is_cancelled() {
            return Ok(LoopEnd::Stopped);
        }

        send_status(ctx.event_tx, AgentStatus::Thinking).await;

        let messages = state.lock().await.messages.clone();
        let timer = Timer::new("llm_request");
        let response = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => return Ok(LoopEnd::Stopped),
            response = ctx.llm.chat(ctx.config.system_prompt.as_deref(), &messages, &tool_definitions) => {
                response.map_err(|error| AgentError::LLM(error.to_string()))?
            }
        };
        timer.debug(&conversation_id);

        let tool_calls = match response {
            LLMResponse::Stream(stream) => {
                let placeholder = state.lock().await.append(Message::assistant("", None));
                let output = match consume_llm_stream(
                    stream,
                    state,
                    placeholder,
                    ctx.event_tx,
                    ctx.cancel_token,
                    &conversation_id,
                )
                .await
                {
                    Ok(output) => output,
                    Err(AgentError::Cancelled) => {
                        remove_if_empty(state, placeholder).await;
                        return Ok(LoopEnd::Stopped);
                    }
                    Err(error) => {
                        remove_if_empty(state, placeholder).await;
                        return Err(error);
                    }
                };

                log::debug!(
                    "[{}] Round {} streamed {} chars, {} tool calls",
                    conversation_id,
                    round + 1,
                    output.token_count,
                    output.tool_calls.len()
                );

                if output.content.is_empty() && output.tool_calls.is_empty() {
                    remove_if_empty(state, placeholder).await;
                    return Err(AgentError::NoUsableReply);
                }
                if !output.tool_calls.is_empty() {
                    let calls = output.tool_calls.clone();
                    state
                        .lock()
                        .await
                        .update(placeholder, |message| message.set_tool_calls(Some(calls)))?;
                }
                output.tool_calls
            }
            LLMResponse::Complete(reply) => {
                if reply.is_empty() {
                    return Err(AgentError::NoUsableReply);
                }
                if !reply.reply_text.is_empty() {
                    send_status(ctx.event_tx, AgentStatus::Speaking).await;
                    let _ = ctx
                        .event_tx
                        .send(AgentEvent::Token {
                            content: reply.reply_text.clone(),
                        })
                        .await;
                }
                let tool_calls = reply.tool_calls.clone();
                state
                    .lock()
                    .await
                    .append(Message::assistant(reply.reply_text, Some(reply.tool_calls)));
                tool_calls
            }
        };

        persist(state, ctx.storage).await;

        if tool_calls.is_empty() {
            log::debug!("[{}] Agent loop finished after {} rounds", conversation_id, round + 1);
            return Ok(LoopEnd::Completed { rounds: round + 1 });
        }

        if !dispatch_tool_calls(state, &ctx, &tool_calls, &conversation_id).await {
            return Ok(LoopEnd::Stopped);
        }
    }

    log::warn!(
        "[{}] Stopping after {} rounds without a final reply",
        conversation_id,
        ctx.config.max_rounds
    );
    Err(AgentError::MaxRoundsExceeded(ctx.config.max_rounds))
}

/// Run calls in order, one tool message per call. Returns false when cancelled.
///
/// A started call always finishes. Calls left when the token fires get
/// [`CANCELLED_TOOL_RESULT`] so every emitted call still has a result.
async fn dispatch_tool_calls(
    state: &SharedConversation,
    ctx: &LoopContext<'_>,
    tool_calls: &[ToolCallRef],
    conversation_id: &str,
) -> bool {
    for (position, call) in tool_calls.iter().enumerate() {
        if ctx.cancel_token.is_cancelled() {
            log::info!(
                "[{}] Stopped before {} of {} tool calls",
                conversation_id,
                position + 1,
                tool_calls.len()
            );
            {
                let mut state = state.lock().await;
                for skipped in &tool_calls[position..] {
                    state.append(Message::tool_result(
                        skipped.call_id.clone(),
                        skipped.name.clone(),
                        CANCELLED_TOOL_RESULT,
                    ));
                }
            }
            persist(state, ctx.storage).await;
            return false;
        }

        let status = ToolInvocation::parse(&call.name, &call.arguments)
            .map(|invocation| invocation.status())
            .unwrap_or_else(|_| status_for_tool(&call.name));
        send_status(ctx.event_tx, status).await;

        let _ = ctx
            .event_tx
            .send(AgentEvent::ToolStart {
                tool_call_id: call.call_id.clone(),
                tool_name: call.name.clone(),
                arguments: call
                    .parsed_arguments()
                    .unwrap_or_else(|_| serde_json::json!({})),
            })
            .await;

        let timer = Timer::new(format!("tool_{}", call.name));
        let (success, result) = match ctx.tools {
            Some(dispatcher) => dispatcher.dispatch_to_text(call).await,
            None => (
                false,
                format!("Error: tool '{}' is not available", call.name),
            ),
        };
        timer.debug(conversation_id);

        state.lock().await.append(Message::tool_result(
            call.call_id.clone(),
            call.name.clone(),
            result.clone(),
        ));
        persist(state, ctx.storage).await;

        let _ = ctx
            .event_tx
            .send(AgentEvent::ToolComplete {
                tool_call_id: call.call_id.clone(),
                tool_name: call.name.clone(),
                success,
                result,
            })
            .await;
    }

    true
}

async fn remove_if_empty(state: &SharedConversation, index: usize) {
    let mut state = state.lock().await;
    if state.messages.get(index).is_some_and(Message::is_empty) {
        let _ = state.remove(index);
    }
}

pub(crate) async fn send_status(event_tx: &mpsc::Sender<AgentEvent>, status: AgentStatus) {
    let _ = event_tx.send(AgentEvent::Status { status }).await;
}

/// Save the conversation. Failures are logged, never fatal.
pub(crate) async fn persist(state: &SharedConversation, storage: Option<&Arc<dyn Storage>>) {
    let Some(storage) = storage else {
        return;
    };
    let (id, messages, updated_at) = {
        let state = state.lock().await;
        (
            state.conversation_id.clone(),
            state.messages.clone(),
            state.updated_at,
        )
    };
    if let Err(e) = storage.save_conversation(&id, &messages, updated_at).await {
        log::warn!("[{}] Failed to save conversation: {}", id, e);
    }
}

struct Timer {
    name: String,
    start: std::time::Instant,
}

impl Timer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: std::time::Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    fn debug(&self, conversation_id: &str) {
        log::debug!(
            "[{}] {} completed in {}ms",
            conversation_id,
            self.name,
            self.elapsed_ms()
        );
    }
}
