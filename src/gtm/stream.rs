//! Per-stream tool-call accumulation, shared by every adapter's `reduce_chunk`.
//!
//! One slot per tool-call index. For each slot the state keeps the first non-empty id, the first
//! non-empty name, and a byte-wise concatenation of every `arguments` fragment observed. It never
//! parses intermediate JSON — only `finalize` parses, once, per slot.

use std::collections::BTreeMap;

use super::{FinishReason, GenericToolCall, ToolArguments};

/// One tool-call slot's accumulated state across however many chunks have arrived so far.
#[derive(Debug, Clone, Default)]
pub struct ToolCallSlot {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_text: String,
}

/// Per-stream, per-adapter state. The caller owns this handle for the lifetime of one in-flight
/// stream and drops it on completion or abort; the core never keeps a `streamId -> state` map of
/// its own (see the "caller-owned handle" redesign note).
#[derive(Debug, Default)]
pub struct StreamState {
    slots: BTreeMap<u32, ToolCallSlot>,
    pub last_finish_reason: Option<FinishReason>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one chunk's worth of tool-call deltas to the accumulated slots.
    ///
    /// `id`/`name` follow a first-non-empty-wins rule: once a slot has a non-empty id or name, a
    /// later delta with an empty value for that field never overwrites it. `arguments` are always
    /// appended verbatim, preserving whitespace exactly as emitted.
    pub fn accumulate<'a>(&mut self, deltas: impl IntoIterator<Item = &'a GenericToolCall>) {
        for delta in deltas {
            let index = delta.index.unwrap_or(0);
            let slot = self.slots.entry(index).or_default();

            if !delta.id.is_empty() && slot.id.is_none() {
                slot.id = Some(delta.id.clone());
            }
            if !delta.name.is_empty() && slot.name.is_none() {
                slot.name = Some(delta.name.clone());
            }

            match &delta.arguments {
                ToolArguments::Raw { raw } => slot.arguments_text.push_str(raw),
                ToolArguments::Parsed(value) => {
                    // A provider that hands us a fully-parsed delta mid-stream (shouldn't happen
                    // in practice, but dialects are free to) still needs byte-identical
                    // concatenation, so we re-serialize rather than silently drop it.
                    if let Ok(text) = serde_json::to_string(value) {
                        slot.arguments_text.push_str(&text);
                    }
                }
            }
        }
    }

    pub fn note_finish_reason(&mut self, reason: FinishReason) {
        self.last_finish_reason = Some(reason);
    }

    /// Drain every accumulated slot into a finished `GenericToolCall`, parsing each slot's
    /// argument text once. Consumes `self`'s slots; the state can be reused afterward (the caller
    /// may keep issuing further tool-call rounds on the same logical connection, though the
    /// streaming reducer always drops the handle once `complete` is observed).
    pub fn finalize(&mut self) -> Vec<GenericToolCall> {
        std::mem::take(&mut self.slots)
            .into_iter()
            .map(|(index, slot)| GenericToolCall {
                id: slot.id.unwrap_or_default(),
                name: slot.name.unwrap_or_default(),
                arguments: ToolArguments::from_accumulated(slot.arguments_text),
                index: Some(index),
                metadata: Default::default(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots accumulated so far. Used by adapters whose wire format (Google) never
    /// carries an explicit tool-call index, to assign one deterministically by arrival order.
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtm::GenericToolCall;

    fn delta(index: u32, id: &str, name: &str, args: &str) -> GenericToolCall {
        GenericToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: ToolArguments::Raw { raw: args.to_string() },
            index: Some(index),
            metadata: Default::default(),
        }
    }

    #[test]
    fn monotone_argument_accumulation_preserves_whitespace() {
        let mut state = StreamState::new();
        state.accumulate([&delta(0, "t1", "search", "{\"q\": ")]);
        state.accumulate([&delta(0, "", "", "\"hi\\n\"")]);
        state.accumulate([&delta(0, "", "", "}")]);

        let calls = state.finalize();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].arguments,
            ToolArguments::Parsed(serde_json::json!({"q": "hi\n"}))
        );
    }

    #[test]
    fn name_is_never_overwritten_by_a_later_empty_delta() {
        let mut state = StreamState::new();
        state.accumulate([&delta(0, "t1", "foo", "{}")]);
        state.accumulate([&delta(0, "", "", "")]);

        let calls = state.finalize();
        assert_eq!(calls[0].name, "foo");
        assert_eq!(calls[0].id, "t1");
    }

    #[test]
    fn unparseable_arguments_fall_back_to_raw() {
        let mut state = StreamState::new();
        state.accumulate([&delta(0, "t1", "foo", "{\"q\":")]);

        let calls = state.finalize();
        assert_eq!(
            calls[0].arguments,
            ToolArguments::Raw {
                raw: "{\"q\":".to_string()
            }
        );
    }

    #[test]
    fn independent_slots_accumulate_separately() {
        let mut state = StreamState::new();
        state.accumulate([&delta(0, "t1", "a", "{\"x\":1}")]);
        state.accumulate([&delta(1, "t2", "b", "{\"y\":2}")]);

        let mut calls = state.finalize();
        calls.sort_by_key(|c| c.index);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "a");
        assert_eq!(calls[1].name, "b");
    }

    #[test]
    fn finalize_drains_slots_so_a_fresh_round_starts_empty() {
        let mut state = StreamState::new();
        state.accumulate([&delta(0, "t1", "a", "{}")]);
        assert!(!state.is_empty());
        state.finalize();
        assert!(state.is_empty());
    }
}
