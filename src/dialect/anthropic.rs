//! GTM <-> Anthropic tool dialect. Anthropic has no separate "name" vs "id" on a tool
//! definition — `name` serves both roles — and streams tool-call arguments as a sequence of
//! `input_json_delta` fragments rather than an incremental `arguments` string field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gtm::{GenericTool, GenericToolCall, ProviderFamily, ToolArguments};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// The `tool_use` content block shape, as it appears in a non-streaming message or as the
/// finalized form of a streamed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// One `input_json_delta` event body during streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputJsonDelta {
    pub partial_json: String,
}

pub fn tools_from_generic(tools: &[GenericTool]) -> Vec<Tool> {
    tools
        .iter()
        .map(|tool| Tool {
            name: tool.wire_name().to_string(),
            description: tool.description.clone(),
            input_schema: crate::schema::sanitize(ProviderFamily::Anthropic, &tool.parameters),
        })
        .collect()
}

pub fn tools_to_generic(tools: Vec<Tool>) -> Vec<GenericTool> {
    tools
        .into_iter()
        .map(|tool| GenericTool {
            id: tool.name.clone(),
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
            provider_hint: None,
            is_special: false,
            metadata: Default::default(),
        })
        .collect()
}

pub fn tool_calls_from_generic(calls: &[GenericToolCall]) -> Vec<ToolUseBlock> {
    calls
        .iter()
        .map(|call| ToolUseBlock {
            id: call.id.clone(),
            name: call.name.clone(),
            input: match &call.arguments {
                ToolArguments::Parsed(value) => value.clone(),
                ToolArguments::Raw { raw } => serde_json::from_str(raw).unwrap_or(Value::Object(Default::default())),
            },
        })
        .collect()
}

pub fn tool_calls_to_generic(calls: Vec<ToolUseBlock>) -> Vec<GenericToolCall> {
    calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| GenericToolCall {
            id: call.id,
            name: call.name,
            arguments: ToolArguments::Parsed(call.input),
            index: Some(index as u32),
            metadata: Default::default(),
        })
        .collect()
}

/// The `content_block_start` for a `tool_use` block: id and name arrive together, up front, with
/// an empty `input` that subsequent `input_json_delta` events fill in.
pub fn tool_use_start_to_generic(index: u32, id: String, name: String) -> GenericToolCall {
    GenericToolCall {
        id,
        name,
        arguments: ToolArguments::Raw { raw: String::new() },
        index: Some(index),
        metadata: Default::default(),
    }
}

/// One `input_json_delta` event -> an argument-only fragment, per the shared accumulation rule.
pub fn input_json_delta_to_generic(index: u32, delta: InputJsonDelta) -> GenericToolCall {
    GenericToolCall::argument_fragment(index, delta.partial_json, "anthropic")
}
