//! Schemas for the browser tools offered to the model.
//!
//! Every schema is strict-mode compatible: `additionalProperties` is false and every
//! property is listed in `required`.

use agent_core::tools::ToolDefinition;
use serde_json::{json, Value};

pub const OPEN_PAGE: &str = "open_page";
pub const CLICK_BUTTON: &str = "click_button";
pub const GET_PAGE: &str = "get_page";
pub const CLOSE_PAGE: &str = "close_page";
pub const RUN_CONSOLE: &str = "run_console";
pub const LIST_TABS: &str = "list_tabs";

/// All browser tool names, in the order they are offered.
pub const BROWSER_TOOL_NAMES: [&str; 6] = [
    OPEN_PAGE,
    CLICK_BUTTON,
    GET_PAGE,
    CLOSE_PAGE,
    RUN_CONSOLE,
    LIST_TABS,
];

fn object_schema(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn tab_id_schema(action: &str) -> Value {
    object_schema(json!({
        "tab_id": {
            "type": "integer",
            "description": format!("ID of the tab to {action}, as reported by open_page or list_tabs")
        }
    }))
}

/// Build the fixed tool registry. Called once per turn.
pub fn browser_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            OPEN_PAGE,
            "Open a URL in a new browser tab. Returns the tab title, URL and TabID. Use a search engine URL to search the web.",
            object_schema(json!({
                "url": {
                    "type": "string",
                    "description": "Absolute http or https URL to open"
                },
                "focus": {
                    "type": "boolean",
                    "description": "Whether to bring the new tab to the foreground"
                }
            })),
        ),
        ToolDefinition::new(
            CLICK_BUTTON,
            "Click an interactive element on the current page by the id shown in get_page output.",
            object_schema(json!({
                "id": {
                    "type": "string",
                    "description": "Element id from the page listing"
                }
            })),
        ),
        ToolDefinition::new(
            GET_PAGE,
            "Read the text content and interactive elements of an open tab.",
            tab_id_schema("read"),
        ),
        ToolDefinition::new(CLOSE_PAGE, "Close an open tab.", tab_id_schema("close")),
        ToolDefinition::new(
            RUN_CONSOLE,
            "Run a JavaScript snippet in the console of the active tab and return its output.",
            object_schema(json!({
                "command": {
                    "type": "string",
                    "description": "JavaScript to evaluate"
                }
            })),
        ),
        ToolDefinition::new(
            LIST_TABS,
            "List all open tabs with their title, URL and TabID.",
            object_schema(json!({})),
        ),
    ]
}
