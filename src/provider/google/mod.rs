//! Google Gemini `generateContent`/`streamGenerateContent` adapter.

mod input;
mod output;

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::dialect;
use crate::dialect::google::FunctionCallingMode;
use crate::error::Result;
use crate::gtm::{GenericStreamingResponse, ProviderFamily, StreamState};
use crate::message::Message;
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk};

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let base_url = model_cfg.url.clone().unwrap_or_else(|| {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}",
            model_cfg.model_id
        )
    });
    let url = format!("{base_url}:streamGenerateContent?key={api_key}&alt=sse");

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());

    let mut body = Map::new();
    body.insert("contents".into(), Value::Array(input::contents_from_messages(messages)));

    if let Some(system_instruction) = input::extract_system_instruction(messages) {
        body.insert("systemInstruction".into(), system_instruction);
    }

    let mut generation_config = Map::new();
    generation_config.insert("temperature".into(), json!(options.temperature_or_default()));
    generation_config.insert("maxOutputTokens".into(), json!(options.max_tokens_or_default()));

    if let Some(schema) = &options.response_schema {
        generation_config.insert("responseMimeType".into(), Value::String("application/json".into()));
        generation_config.insert(
            "responseSchema".into(),
            crate::schema::sanitize(ProviderFamily::Google, schema),
        );
    }
    body.insert("generationConfig".into(), Value::Object(generation_config));

    let tools = dialect::filter_for_target(ProviderFamily::Google, options.tools.clone());
    if !tools.is_empty() {
        body.insert(
            "tools".into(),
            json!([{"functionDeclarations": dialect::google::tools_from_generic(&tools)}]),
        );

        let mode = match options.tool_choice.as_deref() {
            Some("none") => FunctionCallingMode::None,
            Some("required") | Some("any") => FunctionCallingMode::Any,
            _ => FunctionCallingMode::Auto,
        };
        body.insert(
            "toolConfig".into(),
            json!({"functionCallingConfig": {"mode": mode.as_wire_str()}}),
        );
    }

    log::debug!(
        "google build_request: model={} tools={} schema={}",
        model_cfg.model_id,
        tools.len(),
        options.response_schema.is_some()
    );

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body: Value::Object(body),
    })
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    output::reduce_chunk(raw, state)
}
