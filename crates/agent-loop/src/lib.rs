//! Agent loop for the tab agent.
//!
//! [`Orchestrator`] owns the conversation and runs turns; [`run_agent_loop_with_config`]
//! is the request / stream / tool-dispatch loop behind each turn.

pub mod config;
pub mod orchestrator;
pub mod runner;
pub mod stream;

pub use config::AgentLoopConfig;
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use runner::{run_agent_loop_with_config, LoopContext, LoopEnd, SharedConversation};
