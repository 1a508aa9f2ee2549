use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse activity indicator for the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Thinking,
    Browsing,
    Coding,
    Operating,
    Searching,
    Speaking,
    Idle,
    Stopped,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Thinking => "thinking",
            AgentStatus::Browsing => "browsing",
            AgentStatus::Coding => "coding",
            AgentStatus::Operating => "operating",
            AgentStatus::Searching => "searching",
            AgentStatus::Speaking => "speaking",
            AgentStatus::Idle => "idle",
            AgentStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Status {
        status: AgentStatus,
    },

    Token {
        content: String,
    },

    ToolStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    ToolComplete {
        tool_call_id: String,
        tool_name: String,
        success: bool,
        result: String,
    },

    /// Provider settings are incomplete; nothing was sent.
    SettingsRequired,

    Error {
        message: String,
    },

    Complete {
        rounds: usize,
    },
}
