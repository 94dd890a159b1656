//! GTM <-> OpenAI tool dialect. Also used, unmodified, by Mistral and vLLM, which are wire-compatible
//! with OpenAI's function-calling shape (vLLM additionally narrows the schema and `tool_choice`
//! values it accepts — that narrowing happens in `schema::sanitize`/`provider::vllm`, not here).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gtm::{GenericTool, GenericToolCall, ToolArguments};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: ToolType,
    pub function: Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ToolType,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Always a JSON-encoded string on the wire, never a nested object.
    pub arguments: String,
}

/// A single slot of a streaming `tool_calls` delta array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<ToolType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCallDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

pub fn tools_from_generic(tools: &[GenericTool]) -> Vec<Tool> {
    tools
        .iter()
        .map(|tool| Tool {
            kind: ToolType::Function,
            function: Function {
                name: tool.wire_name().to_string(),
                description: tool.description.clone(),
                parameters: crate::schema::sanitize(crate::gtm::ProviderFamily::OpenAi, &tool.parameters),
            },
        })
        .collect()
}

pub fn tools_to_generic(tools: Vec<Tool>) -> Vec<GenericTool> {
    tools
        .into_iter()
        .map(|tool| GenericTool {
            id: tool.function.name.clone(),
            name: tool.function.name,
            description: tool.function.description,
            parameters: tool.function.parameters,
            provider_hint: None,
            is_special: false,
            metadata: Default::default(),
        })
        .collect()
}

pub fn tool_calls_from_generic(calls: &[GenericToolCall]) -> Vec<ToolCall> {
    calls
        .iter()
        .map(|call| ToolCall {
            id: call.id.clone(),
            kind: ToolType::Function,
            function: FunctionCall {
                name: call.name.clone(),
                arguments: match &call.arguments {
                    ToolArguments::Parsed(value) => serde_json::to_string(value).unwrap_or_default(),
                    ToolArguments::Raw { raw } => raw.clone(),
                },
            },
        })
        .collect()
}

pub fn tool_calls_to_generic(calls: Vec<ToolCall>) -> Vec<GenericToolCall> {
    calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| GenericToolCall {
            id: call.id,
            name: call.function.name,
            arguments: ToolArguments::from_accumulated(call.function.arguments),
            index: Some(index as u32),
            metadata: Default::default(),
        })
        .collect()
}

/// One streaming delta -> one `GenericToolCall` delta, following the shared "empty name does not
/// clobber an accumulated name" rule: when `function.name` is absent on this delta we emit an
/// empty name, never `None`-as-empty-string confusion.
pub fn tool_call_delta_to_generic(delta: ToolCallDelta) -> GenericToolCall {
    let name = delta.function.as_ref().and_then(|f| f.name.clone()).unwrap_or_default();
    let arguments = delta.function.and_then(|f| f.arguments).unwrap_or_default();

    GenericToolCall {
        id: delta.id.unwrap_or_default(),
        name,
        arguments: ToolArguments::Raw { raw: arguments },
        index: Some(delta.index),
        metadata: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tools_roundtrip_through_generic() {
        let tools = vec![GenericTool {
            id: "get_weather".into(),
            name: "get_weather".into(),
            description: "look up weather".into(),
            parameters: json!({"type": "object", "properties": {"city": {"type": "string"}}}),
            provider_hint: None,
            is_special: false,
            metadata: Default::default(),
        }];

        let wire = tools_from_generic(&tools);
        let back = tools_to_generic(wire);

        assert_eq!(back[0].name, tools[0].name);
        assert_eq!(back[0].description, tools[0].description);
    }

    #[test]
    fn tool_call_arguments_serialize_as_json_string_not_object() {
        let calls = vec![GenericToolCall {
            id: "call_1".into(),
            name: "search".into(),
            arguments: ToolArguments::Parsed(json!({"q": "rust"})),
            index: Some(0),
            metadata: Default::default(),
        }];

        let wire = tool_calls_from_generic(&calls);
        assert_eq!(wire[0].function.arguments, r#"{"q":"rust"}"#);
    }

    #[test]
    fn delta_with_missing_name_produces_empty_name_not_panic() {
        let delta = ToolCallDelta {
            index: 0,
            id: None,
            kind: None,
            function: Some(FunctionCallDelta {
                name: None,
                arguments: Some("{\"q\":".into()),
            }),
        };

        let generic = tool_call_delta_to_generic(delta);
        assert_eq!(generic.name, "");
        assert_eq!(generic.arguments, ToolArguments::Raw { raw: "{\"q\":".into() });
    }
}
