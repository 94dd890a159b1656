//! OpenAI Responses API adapter (`/v1/responses`). Distinct dialect from Chat Completions: no
//! `temperature`, a single `input` array instead of `messages`, system content hoisted into
//! `instructions`, and a `reasoning.effort`/`text.verbosity` pair instead of a single temperature
//! knob for "thinking" models.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::dialect;
use crate::error::Result;
use crate::gtm::{FinishReason, GenericStreamingResponse, GenericToolCall, ProviderFamily, StreamState, ToolArguments};
use crate::message::{Message, Role};
use crate::provider::{thinking_effort_for_budget, BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk, ThinkingEffort};

fn effort_as_wire_str(effort: ThinkingEffort) -> &'static str {
    match effort {
        ThinkingEffort::Minimal => "minimal",
        ThinkingEffort::Low => "low",
        ThinkingEffort::Medium => "medium",
        ThinkingEffort::High => "high",
    }
}

fn extract_instructions(messages: &[Message]) -> Option<String> {
    let joined = messages
        .iter()
        .filter(|message| message.role == Role::System)
        .filter_map(|message| message.content.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn input_items(messages: &[Message]) -> Vec<Value> {
    crate::provider::openai::messages_to_wire(
        &messages
            .iter()
            .filter(|message| message.role != Role::System)
            .cloned()
            .collect::<Vec<_>>(),
    )
}

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let url = model_cfg
        .url
        .clone()
        .unwrap_or_else(|| "https://api.openai.com/v1/responses".to_string());

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("Authorization".into(), format!("Bearer {api_key}"));

    let mut body = Map::new();
    body.insert("model".into(), Value::String(model_cfg.model_id.clone()));
    body.insert("input".into(), Value::Array(input_items(messages)));
    body.insert("stream".into(), json!(options.stream_or_default()));

    if let Some(instructions) = extract_instructions(messages) {
        body.insert("instructions".into(), Value::String(instructions));
    }

    // Responses omits max_output_tokens entirely when unset, rather than defaulting to 1024 like
    // the Chat Completions dialect — a caller that wants the model's own default leaves it unset.
    if let Some(max_tokens) = options.max_tokens.filter(|&value| value != 0) {
        body.insert("max_output_tokens".into(), json!(max_tokens));
    }

    if options.thinking_enabled {
        let effort = effort_as_wire_str(thinking_effort_for_budget(options.thinking_budget));
        // `thinking_thoughts` requests verbose intermediate reasoning independent of the effort
        // level the numeric budget maps to; absent a table for verbosity in the spec, a budget
        // that installs non-minimal effort without `thinking_thoughts` gets the matching medium
        // default rather than always echoing `effort`.
        let verbosity = if options.thinking_thoughts { "high" } else { "medium" };
        body.insert("reasoning".into(), json!({"effort": effort}));
        body.insert("text".into(), json!({"verbosity": verbosity}));
    }

    let tools = dialect::filter_for_target(ProviderFamily::OpenAiResponses, options.tools.clone());
    if !tools.is_empty() {
        body.insert("tools".into(), json!(dialect::openai::tools_from_generic(&tools)));
        if let Some(choice) = &options.tool_choice {
            body.insert("tool_choice".into(), Value::String(choice.clone()));
        }
    }

    if let Some(schema) = &options.response_schema {
        let mut text = body.remove("text").and_then(|v| v.as_object().cloned()).unwrap_or_default();
        text.insert(
            "format".into(),
            json!({
                "type": "json_schema",
                "name": "response",
                "schema": crate::schema::sanitize(ProviderFamily::OpenAiResponses, schema),
                "strict": true
            }),
        );
        body.insert("text".into(), Value::Object(text));
    }

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body: Value::Object(body),
    })
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    let RawChunk::OpenAiLine(line) = raw else {
        log::warn!("openai-responses adapter received a non-OpenAI chunk shape");
        return GenericStreamingResponse::error("unexpected chunk shape for this provider");
    };

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("openai-responses: failed to parse event payload: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    match value.get("type").and_then(Value::as_str) {
        Some("response.output_text.delta") | Some("response.output_chunk.delta") => {
            let text = value.get("delta").and_then(Value::as_str).unwrap_or_default();
            GenericStreamingResponse::text(text)
        }

        Some("response.output_item.added") => {
            let item = value.get("item");
            if item.and_then(|i| i.get("type")).and_then(Value::as_str) == Some("function_call") {
                let index = value.get("output_index").and_then(Value::as_u64).unwrap_or(0) as u32;
                let id = item
                    .and_then(|i| i.get("call_id"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let name = item.and_then(|i| i.get("name")).and_then(Value::as_str).unwrap_or_default().to_string();
                state.accumulate([&GenericToolCall {
                    id,
                    name,
                    arguments: ToolArguments::Raw { raw: String::new() },
                    index: Some(index),
                    metadata: Default::default(),
                }]);
            }
            GenericStreamingResponse::default()
        }

        Some("response.function_call_arguments.delta") => {
            let index = value.get("output_index").and_then(Value::as_u64).unwrap_or(0) as u32;
            let fragment = value.get("delta").and_then(Value::as_str).unwrap_or_default();
            state.accumulate([&GenericToolCall::argument_fragment(index, fragment, "openai-responses")]);
            GenericStreamingResponse::default()
        }

        Some("response.completed") => {
            let tool_calls = state.finalize();
            let finish_reason = if !tool_calls.is_empty() {
                FinishReason::ToolCalls
            } else {
                FinishReason::Stop
            };
            GenericStreamingResponse {
                tool_calls,
                complete: true,
                finish_reason: Some(finish_reason),
                ..Default::default()
            }
        }

        Some("response.failed") => {
            let message = value
                .get("response")
                .and_then(|r| r.get("error"))
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("response failed");
            GenericStreamingResponse::error(message)
        }

        other => {
            log::warn!("openai-responses: unrecognized event type {other:?}, skipping");
            GenericStreamingResponse::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ModelConfig {
        ModelConfig {
            id: "gpt5".into(),
            model_id: "gpt-5".into(),
            provider: crate::provider::ProviderKind::OpenAiResponses,
            url: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn no_temperature_field_is_ever_set() {
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &BuildOptions::default()).unwrap();
        assert!(request.body.get("temperature").is_none());
    }

    #[test]
    fn unset_max_tokens_is_omitted_rather_than_defaulted() {
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &BuildOptions::default()).unwrap();
        assert!(request.body.get("max_output_tokens").is_none());
    }

    #[test]
    fn thinking_budget_of_300_maps_to_medium_effort() {
        let mut options = BuildOptions::default();
        options.thinking_enabled = true;
        options.thinking_budget = Some(300);
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &options).unwrap();
        assert_eq!(request.body["reasoning"]["effort"], "medium");
    }

    #[test]
    fn thinking_thoughts_forces_high_verbosity_regardless_of_effort() {
        let mut options = BuildOptions::default();
        options.thinking_enabled = true;
        options.thinking_budget = Some(300);
        options.thinking_thoughts = true;
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &options).unwrap();
        assert_eq!(request.body["text"]["verbosity"], "high");
    }

    #[test]
    fn disabled_thinking_installs_neither_reasoning_nor_text() {
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &BuildOptions::default()).unwrap();
        assert!(request.body.get("reasoning").is_none());
    }

    #[test]
    fn response_completed_finalizes_accumulated_tool_calls() {
        let mut state = StreamState::new();
        reduce_chunk(
            &RawChunk::OpenAiLine(
                r#"{"type":"response.output_item.added","output_index":0,"item":{"type":"function_call","call_id":"call_1","name":"search"}}"#
                    .to_string(),
            ),
            &mut state,
        );
        reduce_chunk(
            &RawChunk::OpenAiLine(
                r#"{"type":"response.function_call_arguments.delta","output_index":0,"delta":"{}"}"#.to_string(),
            ),
            &mut state,
        );
        let done = reduce_chunk(&RawChunk::OpenAiLine(r#"{"type":"response.completed"}"#.to_string()), &mut state);

        assert!(done.complete);
        assert_eq!(done.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(done.tool_calls[0].name, "search");
    }
}
