//! chat_core - configuration shared by the tabpilot crates
//!
//! - `config` - provider, tool service and loop settings
//! - `paths` - on-disk locations under `~/.tabpilot`

pub mod config;
pub mod paths;

pub use config::{ApiFormat, Config, DEFAULT_MAX_ROUNDS};
