//! GTM <-> Google (Gemini) tool dialect. Google has no streaming tool-call deltas: each
//! `functionCall` part arrives as a single complete object, `args` already parsed, never as
//! incremental fragments. The accumulator still runs it through one slot so a caller-visible
//! `GenericToolCall` looks the same regardless of which provider produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gtm::{GenericTool, GenericToolCall, ProviderFamily, ToolArguments};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCallingMode {
    Auto,
    Any,
    None,
}

impl FunctionCallingMode {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            FunctionCallingMode::Auto => "AUTO",
            FunctionCallingMode::Any => "ANY",
            FunctionCallingMode::None => "NONE",
        }
    }
}

pub fn tools_from_generic(tools: &[GenericTool]) -> Vec<FunctionDeclaration> {
    tools
        .iter()
        .map(|tool| FunctionDeclaration {
            name: tool.wire_name().to_string(),
            description: tool.description.clone(),
            parameters: crate::schema::sanitize(ProviderFamily::Google, &tool.parameters),
        })
        .collect()
}

pub fn tools_to_generic(tools: Vec<FunctionDeclaration>) -> Vec<GenericTool> {
    tools
        .into_iter()
        .map(|tool| GenericTool {
            id: tool.name.clone(),
            name: tool.name,
            description: tool.description,
            parameters: tool.parameters,
            provider_hint: Some(ProviderFamily::Google),
            is_special: false,
            metadata: Default::default(),
        })
        .collect()
}

pub fn tool_calls_from_generic(calls: &[GenericToolCall]) -> Vec<FunctionCall> {
    calls
        .iter()
        .map(|call| FunctionCall {
            name: call.name.clone(),
            args: match &call.arguments {
                ToolArguments::Parsed(value) => value.clone(),
                ToolArguments::Raw { raw } => serde_json::from_str(raw).unwrap_or(Value::Object(Default::default())),
            },
        })
        .collect()
}

/// Google hands over one complete call per part; there is no accompanying id, so one is
/// synthesized from the call's position in the stream (`dialect::tool_name_for`-style fallback,
/// applied here to the call identity rather than the tool definition).
pub fn tool_calls_to_generic(calls: Vec<FunctionCall>) -> Vec<GenericToolCall> {
    calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| GenericToolCall {
            id: format!("call_{index}"),
            name: call.name,
            arguments: ToolArguments::Parsed(call.args),
            index: Some(index as u32),
            metadata: Default::default(),
        })
        .collect()
}

/// A single streamed `functionCall` part, converted whole (never fragmented) into a
/// `GenericToolCall` ready for immediate finalization.
pub fn function_call_part_to_generic(index: u32, call: FunctionCall) -> GenericToolCall {
    GenericToolCall {
        id: format!("call_{index}"),
        name: call.name,
        arguments: ToolArguments::Parsed(call.args),
        index: Some(index),
        metadata: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn function_call_part_arrives_whole_not_fragmented() {
        let call = function_call_part_to_generic(0, FunctionCall {
            name: "search".into(),
            args: json!({"q": "rust"}),
        });
        assert_eq!(call.name, "search");
        assert_eq!(call.arguments, ToolArguments::Parsed(json!({"q": "rust"})));
    }

    #[test]
    fn synthesized_ids_are_stable_by_position() {
        let calls = vec![
            FunctionCall { name: "a".into(), args: json!({}) },
            FunctionCall { name: "b".into(), args: json!({}) },
        ];
        let generic = tool_calls_to_generic(calls);
        assert_eq!(generic[0].id, "call_0");
        assert_eq!(generic[1].id, "call_1");
    }

    #[test]
    fn function_calling_mode_maps_to_upper_snake_wire_values() {
        assert_eq!(FunctionCallingMode::Auto.as_wire_str(), "AUTO");
        assert_eq!(FunctionCallingMode::Any.as_wire_str(), "ANY");
        assert_eq!(FunctionCallingMode::None.as_wire_str(), "NONE");
    }
}
