use std::collections::BTreeMap;

use crate::tools::{ToolCallFragment, ToolCallRef};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingToolCall {
    pub id: Option<String>,
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

/// Collects streamed tool-call fragments by position.
///
/// Providers send the call metadata (id, name) in the first fragment for a position
/// and only argument text afterwards. [`merge`](Self::merge) never mutates the
/// receiver: it returns the next accumulator value, so a snapshot taken mid-stream
/// stays valid.
///
/// Fragments are assumed to be monotonic appends in arrival order; a repeated
/// fragment would be concatenated twice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ToolCallAccumulator {
    parts: BTreeMap<u32, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, fragments: &[ToolCallFragment]) -> Self {
        let mut parts = self.parts.clone();
        for fragment in fragments {
            merge_fragment(parts.entry(fragment.index).or_default(), fragment);
        }
        Self { parts }
    }

    /// Complete calls in position order; positions without a name are dropped.
    pub fn finalize(&self) -> Vec<ToolCallRef> {
        self.parts
            .iter()
            .filter_map(|(index, part)| {
                let name = part.name.clone().filter(|name| !name.trim().is_empty())?;
                let call_id = part
                    .call_id
                    .clone()
                    .or_else(|| part.id.clone())
                    .unwrap_or_else(|| format!("call_{index}"));
                let id = part.id.clone().unwrap_or_else(|| call_id.clone());
                Some(ToolCallRef {
                    id,
                    call_id,
                    name,
                    arguments: part.arguments.clone(),
                })
            })
            .collect()
    }

    pub fn get(&self, index: u32) -> Option<&PendingToolCall> {
        self.parts.get(&index)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn set_once(slot: &mut Option<String>, value: Option<&String>) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        *slot = Some(value.clone());
    }
}

fn merge_fragment(part: &mut PendingToolCall, fragment: &ToolCallFragment) {
    set_once(&mut part.id, fragment.id.as_ref());
    set_once(&mut part.call_id, fragment.call_id.as_ref());
    set_once(&mut part.name, fragment.name.as_ref());

    if let Some(delta) = &fragment.arguments {
        part.arguments.push_str(delta);
    }
    if let Some(complete) = &fragment.complete_arguments {
        if part.arguments.is_empty() {
            part.arguments = complete.clone();
        }
    }
}
