//! Tool Dialect Converters: translate a list of `GenericTool`/`GenericToolCall` between provider
//! wire shapes, and decide which tools are even eligible to cross a given boundary.
//!
//! Per-provider wire types and their GTM conversions live in the sibling modules; this module only
//! holds the cross-cutting routing logic that doesn't belong to any one dialect.

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod vllm;

use crate::gtm::{GenericTool, ProviderFamily};

/// Convert a tool list authored against `source`'s assumptions into one valid for `target`.
///
/// In practice tools are authored directly in GTM form, so this is mostly a filtering pass
/// (`filter_for_target`) rather than a wire-to-wire reshape; it exists as its own entry point so a
/// caller that already has provider-native tool definitions in hand (e.g. re-offering a tool list
/// the user copied from another dialect's config) can route it through one function regardless of
/// which two families are involved.
pub fn convert_between(source: ProviderFamily, target: ProviderFamily, tools: Vec<GenericTool>) -> Vec<GenericTool> {
    let _ = source;
    filter_for_target(target, tools)
}

/// Drop tools that must not reach `target`:
/// - a tool whose `provider_hint` names a different family than `target`
/// - an `is_special` tool with no `provider_hint` at all (it was modeled as a tool for exactly
///   one native feature and has no safe generic fallback)
/// - a tool that duplicates the destination's own native web-search tool, which every special
///   per-provider web-search tool is assumed to shadow once the destination is reached
pub fn filter_for_target(target: ProviderFamily, tools: Vec<GenericTool>) -> Vec<GenericTool> {
    tools
        .into_iter()
        .filter(|tool| match tool.provider_hint {
            Some(hint) => hint == target,
            None => !tool.is_special,
        })
        .filter(|tool| !(duplicates_native_web_search(tool, target)))
        .collect()
}

fn duplicates_native_web_search(tool: &GenericTool, target: ProviderFamily) -> bool {
    // Native web search is modeled with `provider_hint`, so a tool that survived the hint filter
    // above already belongs to `target` (or carries no hint at all); only a hint-less tool can
    // "duplicate" a native feature, by reusing one of its reserved wire names.
    tool.provider_hint.is_none()
        && matches!(target, ProviderFamily::Google)
        && matches!(tool.wire_name(), "google_search" | "google_search_retrieval")
}

/// The name to place on the wire for `tool` at position `index` in its tool list: explicit `id`,
/// else `name`, else `tool_{index}`.
pub fn tool_name_for(tool: &GenericTool, index: usize) -> String {
    if !tool.id.is_empty() {
        tool.id.clone()
    } else if !tool.name.is_empty() {
        tool.name.clone()
    } else {
        format!("tool_{index}")
    }
}
