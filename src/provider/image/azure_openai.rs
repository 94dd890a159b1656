//! Azure OpenAI DALL-E image generation: a single synchronous HTTP round trip, no streaming.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{GatewayError, Result};
use crate::gtm::{FinishReason, GenericStreamingResponse};
use crate::message::Message;
use crate::provider::image::{extract_prompt, images_from_data_array};
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig};

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    _options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let prompt = extract_prompt(messages)?;

    let url = model_cfg
        .url
        .clone()
        .ok_or_else(|| GatewayError::InvalidRequest("azure-openai-image requires an explicit endpoint url".into()))?;

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("api-key".into(), api_key.to_string());

    let size = model_cfg.extra.get("size").and_then(Value::as_str).unwrap_or("1024x1024");
    let quality = model_cfg.extra.get("quality").and_then(Value::as_str).unwrap_or("standard");
    let style = model_cfg.extra.get("style").and_then(Value::as_str).unwrap_or("vivid");
    let n = model_cfg.extra.get("n").and_then(Value::as_u64).unwrap_or(1);

    let body = json!({
        "prompt": prompt,
        "n": n,
        "size": size,
        "quality": quality,
        "style": style,
        "response_format": "b64_json",
    });

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body,
    })
}

/// Extracts `data[i].b64_json`/`data[i].url` from the single JSON response body.
pub fn reduce_full_response(body: &[u8]) -> GenericStreamingResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("azure-openai-image: failed to parse response body: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    if let Some(message) = value.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
        return GenericStreamingResponse::error(message.to_string());
    }

    GenericStreamingResponse {
        images: Some(images_from_data_array(&value, "image/png")),
        complete: true,
        finish_reason: Some(FinishReason::Stop),
        ..Default::default()
    }
}
