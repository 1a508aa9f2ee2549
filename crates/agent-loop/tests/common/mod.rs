//! Fakes shared by the orchestrator tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use agent_core::tools::{ToolCallFragment, ToolDefinition};
use agent_core::{AgentEvent, AgentStatus, Message};
use agent_llm::provider::Result as LLMResult;
use agent_llm::{CompletedReply, LLMChunk, LLMError, LLMProvider, LLMResponse};
use agent_tools::{BrowserTools, ToolError};
use async_trait::async_trait;
use futures::stream;
use tokio::sync::mpsc;

/// One scripted provider reply.
pub enum Scripted {
    Stream(Vec<LLMResult<LLMChunk>>),
    /// Yields the chunks, then never ends.
    Hanging(Vec<LLMChunk>),
    Complete(CompletedReply),
    Fail(String),
    /// The request is accepted but no response ever arrives.
    NeverResponds,
}

/// A request seen by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<SeenRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> LLMResult<LLMResponse> {
        self.requests.lock().unwrap().push(SeenRequest {
            system_prompt: system_prompt.map(str::to_string),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|tool| tool.name.clone()).collect(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Stream(items)) => Ok(LLMResponse::Stream(Box::pin(stream::iter(items)))),
            Some(Scripted::Hanging(chunks)) => {
                let head = stream::iter(chunks.into_iter().map(Ok));
                Ok(LLMResponse::Stream(Box::pin(
                    futures::StreamExt::chain(head, stream::pending::<LLMResult<LLMChunk>>()),
                )))
            }
            Some(Scripted::Complete(reply)) => Ok(LLMResponse::Complete(reply)),
            Some(Scripted::Fail(message)) => Err(LLMError::Api(message)),
            Some(Scripted::NeverResponds) => futures::future::pending().await,
            None => Err(LLMError::Api("script exhausted".to_string())),
        }
    }
}

pub fn token(text: &str) -> LLMResult<LLMChunk> {
    Ok(LLMChunk::Token(text.to_string()))
}

pub fn tool_call(index: u32, id: &str, name: &str, arguments: &str) -> LLMResult<LLMChunk> {
    Ok(LLMChunk::ToolCalls(vec![ToolCallFragment {
        index,
        id: Some(id.to_string()),
        call_id: Some(id.to_string()),
        name: Some(name.to_string()),
        arguments: Some(arguments.to_string()),
        complete_arguments: None,
    }]))
}

pub const TAB_LISTING: &str = "Title: x\nURL: y\nTabID: 1";

/// Browser that answers from fixed text and records what it was asked.
#[derive(Default)]
pub struct FakeBrowser {
    calls: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }
}

#[async_trait]
impl BrowserTools for FakeBrowser {
    async fn open_page(&self, url: &str, _focus: bool) -> Result<String, ToolError> {
        self.record(format!("open_page {url}"));
        Ok(format!("Title: Page\nURL: {url}\nTabID: 2"))
    }

    async fn click_button(&self, id: &str) -> Result<String, ToolError> {
        self.record(format!("click_button {id}"));
        Ok(format!("Clicked {id}"))
    }

    async fn get_page(&self, tab_id: u64) -> Result<String, ToolError> {
        self.record(format!("get_page {tab_id}"));
        Ok(format!("Content of tab {tab_id}"))
    }

    async fn close_page(&self, tab_id: u64) -> Result<String, ToolError> {
        self.record(format!("close_page {tab_id}"));
        Ok(format!("Closed tab {tab_id}"))
    }

    async fn run_console(&self, command: &str) -> Result<String, ToolError> {
        self.record(format!("run_console {command}"));
        Ok("undefined".to_string())
    }

    async fn list_tabs(&self) -> Result<String, ToolError> {
        self.record("list_tabs");
        Ok(TAB_LISTING.to_string())
    }
}

pub fn drain_events(rx: &mut mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn statuses(events: &[AgentEvent]) -> Vec<AgentStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::Status { status } => Some(*status),
            _ => None,
        })
        .collect()
}
