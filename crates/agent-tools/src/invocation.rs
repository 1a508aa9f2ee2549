//! Typed tool arguments.
//!
//! Raw model arguments are parsed into a [`ToolInvocation`] before any external call,
//! so a malformed call never reaches the browser.

use agent_core::AgentStatus;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::definitions::{CLICK_BUTTON, CLOSE_PAGE, GET_PAGE, LIST_TABS, OPEN_PAGE, RUN_CONSOLE};
use crate::error::{Result, ToolError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    OpenPage { url: Url, focus: bool },
    ClickButton { id: String },
    GetPage { tab_id: u64 },
    ClosePage { tab_id: u64 },
    RunConsole { command: String },
    ListTabs,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpenPageArgs {
    url: String,
    focus: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClickButtonArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TabArgs {
    #[serde(alias = "tabId")]
    tab_id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunConsoleArgs {
    command: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn from_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

fn non_empty(tool: &str, field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidArguments(format!(
            "{tool}: '{field}' cannot be empty"
        )));
    }
    Ok(value)
}

fn parse_tab_id(tool: &str, raw: &Value) -> Result<u64> {
    let tab_id = match raw {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    tab_id.filter(|id| *id > 0).ok_or_else(|| {
        ToolError::InvalidArguments(format!(
            "{tool}: 'tab_id' must be a positive integer, got {raw}"
        ))
    })
}

fn parse_page_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ToolError::InvalidArguments(
            "open_page: 'url' cannot be empty".to_string(),
        ));
    }
    let url = Url::parse(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("open_page: invalid url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ToolError::InvalidArguments(format!(
            "open_page: unsupported url scheme '{scheme}', expected http or https"
        ))),
    }
}

impl ToolInvocation {
    /// Parse raw argument text for tool `name`. Empty text is treated as `{}`.
    pub fn parse(name: &str, arguments: &str) -> Result<Self> {
        let raw = arguments.trim();
        let args: Value = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw).map_err(|e| {
                ToolError::InvalidArguments(format!("Invalid JSON arguments: {}", e))
            })?
        };
        Self::from_value(name, args)
    }

    pub fn from_value(name: &str, args: Value) -> Result<Self> {
        if !args.is_object() {
            return Err(ToolError::InvalidArguments(format!(
                "{name}: arguments must be a JSON object"
            )));
        }

        match name {
            OPEN_PAGE => {
                let args: OpenPageArgs = from_args(name, args)?;
                Ok(Self::OpenPage {
                    url: parse_page_url(&args.url)?,
                    focus: args.focus,
                })
            }
            CLICK_BUTTON => {
                let args: ClickButtonArgs = from_args(name, args)?;
                Ok(Self::ClickButton {
                    id: non_empty(name, "id", args.id)?,
                })
            }
            GET_PAGE => {
                let args: TabArgs = from_args(name, args)?;
                Ok(Self::GetPage {
                    tab_id: parse_tab_id(name, &args.tab_id)?,
                })
            }
            CLOSE_PAGE => {
                let args: TabArgs = from_args(name, args)?;
                Ok(Self::ClosePage {
                    tab_id: parse_tab_id(name, &args.tab_id)?,
                })
            }
            RUN_CONSOLE => {
                let args: RunConsoleArgs = from_args(name, args)?;
                Ok(Self::RunConsole {
                    command: non_empty(name, "command", args.command)?,
                })
            }
            LIST_TABS => {
                let _: NoArgs = from_args(name, args)?;
                Ok(Self::ListTabs)
            }
            other => Err(ToolError::NotFound(format!("Tool '{}' not found", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenPage { .. } => OPEN_PAGE,
            Self::ClickButton { .. } => CLICK_BUTTON,
            Self::GetPage { .. } => GET_PAGE,
            Self::ClosePage { .. } => CLOSE_PAGE,
            Self::RunConsole { .. } => RUN_CONSOLE,
            Self::ListTabs => LIST_TABS,
        }
    }

    /// Status shown while this call runs.
    pub fn status(&self) -> AgentStatus {
        match self {
            Self::OpenPage { url, .. } if is_search_url(url) => AgentStatus::Searching,
            Self::OpenPage { .. } | Self::GetPage { .. } | Self::ClosePage { .. } | Self::ListTabs => {
                AgentStatus::Browsing
            }
            Self::ClickButton { .. } => AgentStatus::Operating,
            Self::RunConsole { .. } => AgentStatus::Coding,
        }
    }
}

/// Status for a call by name alone, used when its arguments do not parse.
pub fn status_for_tool(name: &str) -> AgentStatus {
    match name {
        CLICK_BUTTON => AgentStatus::Operating,
        RUN_CONSOLE => AgentStatus::Coding,
        _ => AgentStatus::Browsing,
    }
}

const SEARCH_HOSTS: [&str; 6] = [
    "google.",
    "bing.com",
    "duckduckgo.com",
    "baidu.com",
    "search.yahoo.com",
    "search.brave.com",
];

/// Whether `url` is a search-engine query page.
pub fn is_search_url(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches("www.");
    let known_engine = SEARCH_HOSTS
        .iter()
        .any(|engine| host.starts_with(engine) || host.ends_with(engine.trim_end_matches('.')));
    if !known_engine {
        return false;
    }
    url.path().starts_with("/search")
        || url.path() == "/s"
        || url
            .query_pairs()
            .any(|(key, value)| matches!(key.as_ref(), "q" | "wd" | "p") && !value.is_empty())
}
