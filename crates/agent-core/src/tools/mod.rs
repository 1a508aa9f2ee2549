pub mod accumulator;
pub mod types;

pub use accumulator::{PendingToolCall, ToolCallAccumulator};
pub use types::{
    is_error_result, InvalidToolDefinition, ToolCallFragment, ToolCallRef, ToolDefinition,
    TOOL_ERROR_PREFIX,
};
