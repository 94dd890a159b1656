//! GTM <-> vLLM tool dialect. vLLM's OpenAI-compatible server accepts the same `tools`/
//! `tool_calls` wire shapes as OpenAI — only the schema it tolerates is narrower (see
//! `schema::sanitize`) and its accepted `tool_choice` values are a subset of OpenAI's.

use crate::dialect::openai;
use crate::gtm::{GenericTool, GenericToolCall, ProviderFamily};

pub use openai::{Function, FunctionCall, FunctionCallDelta, Tool, ToolCall, ToolCallDelta, ToolType};

pub fn tools_from_generic(tools: &[GenericTool]) -> Vec<Tool> {
    tools
        .iter()
        .map(|tool| Tool {
            kind: ToolType::Function,
            function: Function {
                name: tool.wire_name().to_string(),
                description: tool.description.clone(),
                parameters: crate::schema::sanitize(ProviderFamily::VLlm, &tool.parameters),
            },
        })
        .collect()
}

pub fn tools_to_generic(tools: Vec<Tool>) -> Vec<GenericTool> {
    openai::tools_to_generic(tools)
}

pub fn tool_calls_from_generic(calls: &[GenericToolCall]) -> Vec<ToolCall> {
    openai::tool_calls_from_generic(calls)
}

pub fn tool_calls_to_generic(calls: Vec<ToolCall>) -> Vec<GenericToolCall> {
    openai::tool_calls_to_generic(calls)
}

pub fn tool_call_delta_to_generic(delta: ToolCallDelta) -> GenericToolCall {
    openai::tool_call_delta_to_generic(delta)
}

/// vLLM's `tool_choice` accepts only `"auto"` and `"none"` (no per-tool forced choice, unlike
/// OpenAI's `{"type": "function", "function": {"name": ...}}`); anything else collapses to
/// `"auto"` rather than producing a request the server would reject outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
}

impl ToolChoice {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }

    pub fn narrow_from_openai(value: &str) -> Self {
        match value {
            "none" => ToolChoice::None,
            _ => ToolChoice::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_parameters_go_through_vllm_sanitization_not_googles() {
        let tools = vec![GenericTool {
            id: "t".into(),
            name: "t".into(),
            description: String::new(),
            parameters: serde_json::json!({
                "type": "object",
                "patternProperties": {"^x": {"type": "string"}}
            }),
            provider_hint: None,
            is_special: false,
            metadata: Default::default(),
        }];

        let wire = tools_from_generic(&tools);
        assert!(wire[0].function.parameters.get("patternProperties").is_none());
    }

    #[test]
    fn forced_function_choice_narrows_to_auto() {
        assert_eq!(ToolChoice::narrow_from_openai("required"), ToolChoice::Auto);
        assert_eq!(ToolChoice::narrow_from_openai("none"), ToolChoice::None);
    }
}
