//! OpenAI Chat Completions adapter. Also the wire shape `mistral` and `vllm` (`Local`) build on
//! directly, since both speak an OpenAI-compatible dialect.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::dialect;
use crate::error::Result;
use crate::gtm::{FinishReason, GenericStreamingResponse, ProviderFamily, StreamState};
use crate::message::{Message, Role};
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk, ResponseFormat};

pub fn messages_to_wire(messages: &[Message]) -> Vec<Value> {
    messages.iter().map(message_to_wire).collect()
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn content_parts(message: &Message) -> Vec<Value> {
    let mut parts = Vec::new();
    if message.has_text() {
        parts.push(json!({"type": "text", "text": message.content.clone().unwrap_or_default()}));
    }
    for image in &message.image_parts {
        parts.push(json!({
            "type": "image_url",
            "image_url": {"url": image.data_url(), "detail": "high"}
        }));
    }
    for audio in &message.audio_parts {
        parts.push(json!({
            "type": "input_audio",
            "input_audio": {"data": audio.base64, "format": audio.mime_type.replace("audio/", "")}
        }));
    }
    parts
}

fn message_to_wire(message: &Message) -> Value {
    let mut obj = Map::new();
    obj.insert("role".into(), Value::String(role_str(message.role).into()));

    if message.role == Role::Tool {
        if let Some(id) = &message.tool_call_id {
            obj.insert("tool_call_id".into(), Value::String(id.clone()));
        }
    }

    // A tool-calls-only assistant message omits `content` entirely rather than sending `null`.
    let omit_content = message.tool_calls.is_some() && !message.has_text() && !message.has_binary_parts();
    if !omit_content {
        if message.has_binary_parts() {
            obj.insert("content".into(), Value::Array(content_parts(message)));
        } else {
            obj.insert(
                "content".into(),
                Value::String(message.content.clone().unwrap_or_default()),
            );
        }
    }

    if let Some(calls) = &message.tool_calls {
        let wire: Vec<Value> = calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {"name": call.name, "arguments": call.arguments_json}
                })
            })
            .collect();
        obj.insert("tool_calls".into(), Value::Array(wire));
    }

    Value::Object(obj)
}

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    build_request_for(
        model_cfg,
        messages,
        api_key,
        options,
        "https://api.openai.com/v1/chat/completions",
        ProviderFamily::OpenAi,
    )
}

/// Shared by `openai`/`mistral`/`vllm`: only the default URL and the sanitization family differ.
pub(crate) fn build_request_for(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
    default_url: &str,
    family: ProviderFamily,
) -> Result<HttpRequestDescriptor> {
    let url = model_cfg.url.clone().unwrap_or_else(|| default_url.to_string());

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("Authorization".into(), format!("Bearer {api_key}"));

    let mut body = Map::new();
    body.insert("model".into(), Value::String(model_cfg.model_id.clone()));
    body.insert("messages".into(), Value::Array(messages_to_wire(messages)));
    body.insert("temperature".into(), json!(options.temperature_or_default()));
    body.insert("stream".into(), json!(options.stream_or_default()));
    body.insert("max_tokens".into(), json!(options.max_tokens_or_default()));

    if !options.tools.is_empty() {
        let tools = dialect::filter_for_target(family, options.tools.clone());
        if !tools.is_empty() {
            body.insert("tools".into(), json!(dialect::openai::tools_from_generic(&tools)));
            if let Some(choice) = &options.tool_choice {
                body.insert("tool_choice".into(), Value::String(choice.clone()));
            }
        }
    }

    if let Some(schema) = &options.response_schema {
        body.insert(
            "response_format".into(),
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "schema": crate::schema::sanitize(family, schema),
                    "strict": true
                }
            }),
        );
    } else if options.response_format == Some(ResponseFormat::Json) {
        body.insert("response_format".into(), json!({"type": "json_object"}));
    }

    log::debug!(
        "openai-family build_request: model={} tools={} schema={}",
        model_cfg.model_id,
        options.tools.len(),
        options.response_schema.is_some()
    );

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body: Value::Object(body),
    })
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        other => {
            log::warn!("openai: unrecognized finish_reason '{other}', mapping to Error");
            FinishReason::Error
        }
    }
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    let RawChunk::OpenAiLine(line) = raw else {
        log::warn!("openai adapter received a non-OpenAI chunk shape");
        return GenericStreamingResponse::error("unexpected chunk shape for this provider");
    };

    if line == "[DONE]" {
        let tool_calls = state.finalize();
        let finish_reason = state.last_finish_reason.unwrap_or(FinishReason::Stop);
        return GenericStreamingResponse {
            tool_calls,
            complete: true,
            finish_reason: Some(finish_reason),
            ..Default::default()
        };
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("openai: failed to parse SSE payload: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    let Some(choice) = value.get("choices").and_then(|choices| choices.get(0)) else {
        return GenericStreamingResponse::default();
    };

    let mut response = GenericStreamingResponse::default();

    if let Some(content) = choice
        .get("delta")
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
    {
        response.content.push(content.to_string());
    }

    if let Some(deltas) = choice
        .get("delta")
        .and_then(|delta| delta.get("tool_calls"))
        .and_then(Value::as_array)
    {
        let generic: Vec<_> = deltas
            .iter()
            .filter_map(|raw_delta| serde_json::from_value(raw_delta.clone()).ok())
            .map(dialect::openai::tool_call_delta_to_generic)
            .collect();
        state.accumulate(&generic);
    }

    if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
        state.note_finish_reason(map_finish_reason(reason));
    }

    response
}
