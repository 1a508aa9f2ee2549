use agent_core::tools::{ToolCallFragment, ToolCallRef};

/// One interpreted piece of a streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMChunk {
    /// Visible reply text, applied in arrival order.
    Token(String),
    /// Raw tool-call fragments for the accumulator.
    ToolCalls(Vec<ToolCallFragment>),
}

/// A reply delivered as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedReply {
    pub reply_text: String,
    pub tool_calls: Vec<ToolCallRef>,
}

impl CompletedReply {
    pub fn is_empty(&self) -> bool {
        self.reply_text.is_empty() && self.tool_calls.is_empty()
    }
}
