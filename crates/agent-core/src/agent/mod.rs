pub mod error;
pub mod events;
pub mod types;

pub use error::{AgentError, StateError};
pub use events::{AgentEvent, AgentStatus};
pub use types::{ConversationState, Message, Role};
