use chat_core::{Config, DEFAULT_MAX_ROUNDS};

/// Configuration for the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentLoopConfig {
    /// Model requests allowed per user message.
    pub max_rounds: usize,
    pub system_prompt: Option<String>,
    /// Offer the browser tools to the model. Ignored when no dispatcher is attached.
    pub enable_tools: bool,
    /// Endpoint, key and model are set. Turns are refused with
    /// `SettingsRequired` otherwise.
    pub settings_complete: bool,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
            enable_tools: true,
            settings_complete: true,
        }
    }
}

impl AgentLoopConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_rounds: config.max_rounds.max(1),
            system_prompt: config
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.trim().is_empty()),
            enable_tools: true,
            settings_complete: config.is_complete(),
        }
    }
}
