use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("no usable reply")]
    NoUsableReply,

    #[error("Tool loop stopped after {0} rounds")]
    MaxRoundsExceeded(usize),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Cancelled")]
    Cancelled,
}

/// Rejected synchronously; the conversation is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("a reply is still being generated")]
    Busy,

    #[error("no message at index {0}")]
    MessageNotFound(usize),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),
}
