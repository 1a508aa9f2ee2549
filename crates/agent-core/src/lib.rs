pub mod agent;
pub mod storage;
pub mod tools;

pub use agent::{AgentError, AgentEvent, AgentStatus, ConversationState, Message, Role, StateError};
pub use storage::{JsonStorage, Storage, StoredConversation};
pub use tools::{ToolCallAccumulator, ToolCallFragment, ToolCallRef, ToolDefinition};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
