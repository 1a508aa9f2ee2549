//! Internal history -> wire messages, with tool-result trimming.
//!
//! Page reads are the bulk of a browsing conversation. Once a tab has been read
//! again (or reopened), the older read of that tab is replaced by a short marker
//! before the history is sent.

use std::collections::{HashMap, HashSet};

use agent_core::tools::is_error_result;
use agent_core::{Message, Role};
use serde_json::Value;

use super::errors::{ProtocolError, ProtocolResult};
use super::{chat, responses, WireFormat};

/// Replacement text for a tool result superseded by a newer read of the same tab.
pub const SUPERSEDED_RESULT_MARKER: &str = "success";

const GET_PAGE: &str = "get_page";
const OPEN_PAGE: &str = "open_page";

/// Serialize `messages` into the message list of `format`.
///
/// For [`WireFormat::Chat`] the result is the `messages` array, prefixed by the system
/// prompt. For [`WireFormat::Responses`] it is the `input` array; the system prompt is
/// sent as `instructions` by the request builder instead.
pub fn serialize_history(
    format: WireFormat,
    system_prompt: Option<&str>,
    messages: &[Message],
) -> ProtocolResult<Vec<Value>> {
    check_tool_results(messages)?;
    let trimmed = trim_history(messages);

    Ok(match format {
        WireFormat::Chat => chat::messages_to_wire(system_prompt, &trimmed),
        WireFormat::Responses => responses::messages_to_input(&trimmed),
    })
}

/// Every tool result must answer a call emitted by an earlier assistant message.
pub fn check_tool_results(messages: &[Message]) -> ProtocolResult<()> {
    let mut seen_calls: HashSet<&str> = HashSet::new();

    for message in messages {
        match message.role {
            Role::Assistant => {
                for call in message.tool_calls.iter().flatten() {
                    seen_calls.insert(call.call_id.as_str());
                }
            }
            Role::Tool => {
                let call_id = message.tool_call_id.as_deref().unwrap_or_default();
                if !seen_calls.contains(call_id) {
                    return Err(ProtocolError::OrphanedToolResult(call_id.to_string()));
                }
            }
            Role::User => {}
        }
    }

    Ok(())
}

/// Apply the tab-read trimming rules to a copy of `messages`.
///
/// - Sibling `get_page` calls for the same tab inside one assistant message keep only
///   the last call; the dropped calls' results are removed too.
/// - A successful `get_page` / `open_page` result for tab `T` turns every earlier
///   successful result for `T` into [`SUPERSEDED_RESULT_MARKER`].
///
/// Results starting with `Error:` are never collapsed and never collapse others.
pub fn trim_history(messages: &[Message]) -> Vec<Message> {
    let mut dropped_calls: HashSet<String> = HashSet::new();
    let mut calls: HashMap<String, (String, String)> = HashMap::new();
    let mut out: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        let mut message = message.clone();
        match message.role {
            Role::Assistant => {
                if let Some(tool_calls) = message.tool_calls.take() {
                    let kept = dedup_sibling_reads(tool_calls, &mut dropped_calls);
                    for call in &kept {
                        calls.insert(
                            call.call_id.clone(),
                            (call.name.clone(), call.arguments.clone()),
                        );
                    }
                    message.set_tool_calls(Some(kept));
                }
                out.push(message);
            }
            Role::Tool => {
                let call_id = message.tool_call_id.clone().unwrap_or_default();
                if !dropped_calls.contains(&call_id) {
                    out.push(message);
                }
            }
            Role::User => out.push(message),
        }
    }

    collapse_superseded_reads(&mut out, &calls);
    out
}

fn dedup_sibling_reads(
    tool_calls: Vec<agent_core::ToolCallRef>,
    dropped_calls: &mut HashSet<String>,
) -> Vec<agent_core::ToolCallRef> {
    let mut last_read_for_tab: HashMap<u64, usize> = HashMap::new();
    for (position, call) in tool_calls.iter().enumerate() {
        if call.name == GET_PAGE {
            if let Some(tab) = tab_from_arguments(&call.arguments) {
                last_read_for_tab.insert(tab, position);
            }
        }
    }

    tool_calls
        .into_iter()
        .enumerate()
        .filter_map(|(position, call)| {
            let superseded = call.name == GET_PAGE
                && tab_from_arguments(&call.arguments)
                    .and_then(|tab| last_read_for_tab.get(&tab))
                    .is_some_and(|last| *last != position);
            if superseded {
                dropped_calls.insert(call.call_id);
                None
            } else {
                Some(call)
            }
        })
        .collect()
}

fn collapse_superseded_reads(messages: &mut [Message], calls: &HashMap<String, (String, String)>) {
    // tab -> indices of earlier successful results still holding their text
    let mut live_results: HashMap<u64, Vec<usize>> = HashMap::new();

    for index in 0..messages.len() {
        let message = &messages[index];
        if message.role != Role::Tool || is_error_result(&message.content) {
            continue;
        }
        let Some((name, arguments)) = message
            .tool_call_id
            .as_ref()
            .and_then(|call_id| calls.get(call_id))
        else {
            continue;
        };
        let tab = match name.as_str() {
            GET_PAGE => tab_from_arguments(arguments),
            OPEN_PAGE => tab_from_result(&message.content),
            _ => None,
        };
        let Some(tab) = tab else {
            continue;
        };

        let earlier = live_results.entry(tab).or_default();
        for previous in earlier.drain(..) {
            messages[previous].set_content(SUPERSEDED_RESULT_MARKER);
        }
        earlier.push(index);
    }
}

/// `tab_id` (or `tabId`) from call arguments, as a number or numeric string.
pub(crate) fn tab_from_arguments(arguments: &str) -> Option<u64> {
    let args: Value = serde_json::from_str(arguments).ok()?;
    let raw = args.get("tab_id").or_else(|| args.get("tabId"))?;
    match raw {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// The `TabID: <n>` line of an `open_page` result.
pub(crate) fn tab_from_result(content: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix("TabID:")
            .and_then(|rest| rest.trim().parse().ok())
    })
}
