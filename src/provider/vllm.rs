//! Self-hosted vLLM OpenAI-compatible endpoint (`ProviderKind::Local`). Wire-compatible with
//! OpenAI Chat Completions, but vLLM's schema support and `tool_choice` vocabulary are narrower,
//! so tool installation goes through `dialect::vllm` instead of `dialect::openai` directly.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::dialect;
use crate::error::Result;
use crate::gtm::{GenericStreamingResponse, ProviderFamily, StreamState};
use crate::message::Message;
use crate::provider::openai::messages_to_wire;
use crate::provider::{openai, BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk};

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let url = model_cfg
        .url
        .clone()
        .ok_or_else(|| crate::error::GatewayError::InvalidRequest("vLLM model config requires an explicit url".into()))?;

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
        let tools = dialect::filter_for_target(ProviderFamily::VLlm, options.tools.clone());
        if !tools.is_empty() {
            body.insert("tools".into(), json!(dialect::vllm::tools_from_generic(&tools)));
            if let Some(choice) = &options.tool_choice {
                let narrowed = dialect::vllm::ToolChoice::narrow_from_openai(choice);
                body.insert("tool_choice".into(), Value::String(narrowed.as_wire_str().into()));
            }
        }
    }

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body: Value::Object(body),
    })
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    openai::reduce_chunk(raw, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: Option<&str>) -> ModelConfig {
        ModelConfig {
            id: "local".into(),
            model_id: "llama-3-70b".into(),
            provider: crate::provider::ProviderKind::Local,
            url: url.map(str::to_string),
            extra: Map::new(),
        }
    }

    #[test]
    fn missing_url_is_an_invalid_request() {
        let err = build_request(&cfg(None), &[Message::user("hi")], "key", &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, crate::error::GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn forced_tool_choice_narrows_to_auto_on_the_wire() {
        let mut options = BuildOptions::default();
        options.tools = vec![crate::gtm::GenericTool {
            id: "t".into(),
            name: "t".into(),
            description: String::new(),
            parameters: json!({"type": "object"}),
            provider_hint: None,
            is_special: false,
            metadata: Map::new(),
        }];
        options.tool_choice = Some("required".into());

        let request = build_request(&cfg(Some("http://localhost:8000/v1/chat/completions")), &[], "key", &options).unwrap();
        assert_eq!(request.body["tool_choice"], "auto");
    }
}
