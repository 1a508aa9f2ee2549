//! Browser tools for the tab agent.
//!
//! The model sees six tools (see [`browser_tool_definitions`]). Calls are parsed into a
//! typed [`ToolInvocation`] and forwarded by the [`ToolDispatcher`] to a
//! [`BrowserTools`] implementation such as [`HttpTabControl`].

pub mod browser;
pub mod definitions;
pub mod dispatcher;
pub mod error;
pub mod http_tab_control;
pub mod invocation;

pub use browser::BrowserTools;
pub use definitions::{browser_tool_definitions, BROWSER_TOOL_NAMES};
pub use dispatcher::ToolDispatcher;
pub use error::ToolError;
pub use http_tab_control::HttpTabControl;
pub use invocation::{is_search_url, status_for_tool, ToolInvocation};
