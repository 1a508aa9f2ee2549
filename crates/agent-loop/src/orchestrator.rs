//! Conversation turn orchestration.
//!
//! An [`Orchestrator`] owns one conversation at a time. [`Orchestrator::send`] appends
//! the user message and drives the agent loop; progress is reported as
//! [`AgentEvent`]s on the channel given at construction.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use agent_core::storage::Storage;
use agent_core::{AgentError, AgentEvent, AgentStatus, ConversationState, Message, StateError};
use agent_llm::LLMProvider;
use agent_tools::ToolDispatcher;

use crate::config::AgentLoopConfig;
use crate::runner::{
    persist, run_agent_loop_with_config, send_status, LoopContext, LoopEnd, SharedConversation,
};

/// How a call to [`Orchestrator::send`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A final reply was produced.
    Completed,
    /// The turn was cancelled; partial output is kept.
    Stopped,
    /// Another turn is running; nothing was done.
    Busy,
    /// Provider settings are incomplete; nothing was sent.
    SettingsRequired,
}

pub struct Orchestrator {
    state: SharedConversation,
    llm: Arc<dyn LLMProvider>,
    tools: Option<ToolDispatcher>,
    storage: Option<Arc<dyn Storage>>,
    event_tx: mpsc::Sender<AgentEvent>,
    config: AgentLoopConfig,
}

impl Orchestrator {
    pub fn new(
        conversation_id: impl Into<String>,
        llm: Arc<dyn LLMProvider>,
        event_tx: mpsc::Sender<AgentEvent>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConversationState::new(conversation_id))),
            llm,
            tools: None,
            storage: None,
            event_tx,
            config: AgentLoopConfig::default(),
        }
    }

    /// Restore a stored conversation.
    pub async fn load(
        conversation_id: &str,
        storage: Arc<dyn Storage>,
        llm: Arc<dyn LLMProvider>,
        event_tx: mpsc::Sender<AgentEvent>,
    ) -> Result<Self, AgentError> {
        let state = load_state(storage.as_ref(), conversation_id)
            .await?
            .ok_or_else(|| StateError::ConversationNotFound(conversation_id.to_string()))?;

        log::info!(
            "[{}] Loaded conversation with {} messages",
            conversation_id,
            state.messages.len()
        );

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            llm,
            tools: None,
            storage: Some(storage),
            event_tx,
            config: AgentLoopConfig::default(),
        })
    }

    pub fn with_tools(mut self, tools: ToolDispatcher) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_config(mut self, config: AgentLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared handle to the conversation, for readers.
    pub fn state(&self) -> SharedConversation {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> ConversationState {
        self.state.lock().await.clone()
    }

    pub async fn conversation_id(&self) -> String {
        self.state.lock().await.conversation_id.clone()
    }

    /// Send a user message and run the turn to its end.
    ///
    /// Returns [`TurnOutcome::Busy`] while another turn runs and
    /// [`TurnOutcome::SettingsRequired`] when the provider is not configured; neither
    /// touches the conversation. Errors are also reported as [`AgentEvent::Error`].
    pub async fn send(
        &self,
        text: impl Into<String>,
        cancel_token: CancellationToken,
    ) -> Result<TurnOutcome, AgentError> {
        let conversation_id = {
            let mut state = self.state.lock().await;
            if state.sending {
                log::debug!("[{}] Ignoring send while a turn is running", state.conversation_id);
                return Ok(TurnOutcome::Busy);
            }
            if !self.config.settings_complete {
                drop(state);
                log::info!("Provider settings incomplete; asking for configuration");
                let _ = self.event_tx.send(AgentEvent::SettingsRequired).await;
                return Ok(TurnOutcome::SettingsRequired);
            }
            state.sending = true;
            state.append(Message::user(text));
            state.conversation_id.clone()
        };
        persist(&self.state, self.storage.as_ref()).await;

        let result = run_agent_loop_with_config(
            &self.state,
            LoopContext {
                event_tx: &self.event_tx,
                llm: &self.llm,
                tools: self.tools.as_ref(),
                storage: self.storage.as_ref(),
                cancel_token: &cancel_token,
                config: &self.config,
            },
        )
        .await;

        self.state.lock().await.sending = false;
        persist(&self.state, self.storage.as_ref()).await;

        match result {
            Ok(LoopEnd::Completed { rounds }) => {
                send_status(&self.event_tx, AgentStatus::Idle).await;
                let _ = self.event_tx.send(AgentEvent::Complete { rounds }).await;
                Ok(TurnOutcome::Completed)
            }
            Ok(LoopEnd::Stopped) => {
                log::info!("[{}] Turn stopped", conversation_id);
                send_status(&self.event_tx, AgentStatus::Stopped).await;
                Ok(TurnOutcome::Stopped)
            }
            Err(error) => {
                log::error!("[{}] Turn failed: {}", conversation_id, error);
                let _ = self
                    .event_tx
                    .send(AgentEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
                send_status(&self.event_tx, AgentStatus::Idle).await;
                Err(error)
            }
        }
    }

    /// Remove the message at `index`. Rejected while a turn runs.
    pub async fn remove_message(&self, index: usize) -> Result<Message, StateError> {
        let removed = {
            let mut state = self.state.lock().await;
            if state.sending {
                return Err(StateError::Busy);
            }
            state.remove(index)?
        };
        persist(&self.state, self.storage.as_ref()).await;
        Ok(removed)
    }

    /// Make `conversation_id` the current conversation, loading it from storage when
    /// present and starting it empty otherwise. Rejected while a turn runs.
    pub async fn switch_conversation(&self, conversation_id: &str) -> Result<(), AgentError> {
        if self.state.lock().await.sending {
            return Err(StateError::Busy.into());
        }

        let loaded = match self.storage.as_ref() {
            Some(storage) => load_state(storage.as_ref(), conversation_id).await?,
            None => None,
        };
        let next = loaded.unwrap_or_else(|| ConversationState::new(conversation_id));

        let mut state = self.state.lock().await;
        // a turn may have started while loading
        if state.sending {
            return Err(StateError::Busy.into());
        }
        log::info!(
            "[{}] Switched conversation ({} messages)",
            conversation_id,
            next.messages.len()
        );
        *state = next;
        Ok(())
    }
}

async fn load_state(
    storage: &dyn Storage,
    conversation_id: &str,
) -> Result<Option<ConversationState>, AgentError> {
    let stored = storage
        .load_conversation(conversation_id)
        .await
        .map_err(|e| AgentError::Storage(e.to_string()))?;
    Ok(stored.map(|stored| {
        ConversationState::with_messages(stored.id, stored.messages, stored.updated_at)
    }))
}
