use crate::agent::error::StateError;
use crate::tools::ToolCallRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(default = "generate_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Kept in history but not rendered: tool results and empty assistant turns.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        let mut message = Self {
            id: generate_id(),
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            hidden: false,
            created_at: Utc::now(),
        };
        message.refresh_hidden();
        message
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Option<Vec<ToolCallRef>>) -> Self {
        let mut message = Self::new(Role::Assistant, content.into());
        message.set_tool_calls(tool_calls);
        message
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut message = Self::new(Role::Tool, content.into());
        message.tool_call_id = Some(tool_call_id.into());
        message.tool_name = Some(tool_name.into());
        message
    }

    pub fn append_content(&mut self, delta: &str) {
        self.content.push_str(delta);
        self.refresh_hidden();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.refresh_hidden();
    }

    /// Empty lists are stored as `None`.
    pub fn set_tool_calls(&mut self, tool_calls: Option<Vec<ToolCallRef>>) {
        self.tool_calls = tool_calls.filter(|calls| !calls.is_empty());
        self.refresh_hidden();
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// Neither text nor tool calls.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && !self.has_tool_calls()
    }

    pub fn refresh_hidden(&mut self) {
        self.hidden = match self.role {
            Role::Tool => true,
            Role::Assistant => self.content.trim().is_empty(),
            Role::User => false,
        };
    }
}

/// Messages of one conversation plus its in-flight flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    #[serde(skip)]
    pub sending: bool,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            sending: false,
            updated_at: Utc::now(),
        }
    }

    pub fn with_messages(
        conversation_id: impl Into<String>,
        messages: Vec<Message>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages,
            sending: false,
            updated_at,
        }
    }

    /// Appends and returns the new message's index.
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.touch();
        self.messages.len() - 1
    }

    pub fn update<F>(&mut self, index: usize, apply: F) -> Result<(), StateError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self
            .messages
            .get_mut(index)
            .ok_or(StateError::MessageNotFound(index))?;
        apply(message);
        self.touch();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Message, StateError> {
        if index >= self.messages.len() {
            return Err(StateError::MessageNotFound(index));
        }
        let removed = self.messages.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|message| !message.hidden)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
