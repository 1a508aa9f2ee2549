use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use agent_core::tools::{ToolCallAccumulator, ToolCallRef};
use agent_core::{AgentError, AgentEvent, AgentStatus, ConversationState};
use agent_llm::{LLMChunk, LLMStream};

pub struct StreamHandlingOutput {
    pub content: String,
    pub token_count: usize,
    pub tool_calls: Vec<ToolCallRef>,
}

/// Drain `stream` into the assistant message at `placeholder`.
///
/// Text deltas are appended to the message as they arrive; tool-call fragments are
/// accumulated and returned finalized. Every read races `cancel_token`: on cancellation
/// the text received so far stays in the message and [`AgentError::Cancelled`] is
/// returned.
pub async fn consume_llm_stream(
    mut stream: LLMStream,
    state: &Arc<Mutex<ConversationState>>,
    placeholder: usize,
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel_token: &CancellationToken,
    conversation_id: &str,
) -> Result<StreamHandlingOutput, AgentError> {
    let mut content = String::new();
    let mut token_count = 0usize;
    let mut tool_calls = ToolCallAccumulator::new();

    loop {
        let chunk_result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log::debug!("[{}] Stream cancelled after {} chars", conversation_id, content.len());
                return Err(AgentError::Cancelled);
            }
            next = stream.next() => match next {
                Some(chunk_result) => chunk_result,
                None => break,
            },
        };

        match chunk_result {
            Ok(LLMChunk::Token(token)) => {
                if token.is_empty() {
                    continue;
                }
                if content.is_empty() {
                    let _ = event_tx
                        .send(AgentEvent::Status {
                            status: AgentStatus::Speaking,
                        })
                        .await;
                }
                token_count += token.len();
                content.push_str(&token);

                state
                    .lock()
                    .await
                    .update(placeholder, |message| message.append_content(&token))?;

                let _ = event_tx.send(AgentEvent::Token { content: token }).await;
            }
            Ok(LLMChunk::ToolCalls(fragments)) => {
                log::debug!(
                    "[{}] Received {} tool call parts",
                    conversation_id,
                    fragments.len()
                );
                tool_calls = tool_calls.merge(&fragments);
            }
            Err(error) => {
                log::warn!("[{}] Stream error: {}", conversation_id, error);
                return Err(AgentError::LLM(error.to_string()));
            }
        }
    }

    log::debug!("[{}] LLM stream completed", conversation_id);

    Ok(StreamHandlingOutput {
        content,
        token_count,
        tool_calls: tool_calls.finalize(),
    })
}
