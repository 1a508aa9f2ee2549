//! agent-llm - provider access for the tab agent
//!
//! - `protocol` - request builders, stream record interpretation and history trimming
//!   for the chat and responses wire formats
//! - `providers` - SSE frame decoding and the HTTP provider
//! - `provider` - the [`LLMProvider`] seam used by the agent loop

pub mod protocol;
pub mod provider;
pub mod providers;
pub mod types;

pub use protocol::{ProtocolError, RequestOptions, WireFormat};
pub use provider::{LLMError, LLMProvider, LLMResponse, LLMStream};
pub use providers::common::SseFrame;
pub use providers::HttpProvider;
pub use types::{CompletedReply, LLMChunk};
