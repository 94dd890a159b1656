//! OpenAI `/v1/images/generations` (DALL-E on the public API, not Azure). Wire-compatible with
//! `azure_openai`'s response shape; only the default URL, auth header, and the `model` field on
//! the request body differ.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::Result;
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
        .unwrap_or_else(|| "https://api.openai.com/v1/images/generations".to_string());

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("Authorization".into(), format!("Bearer {api_key}"));

    let size = model_cfg.extra.get("size").and_then(Value::as_str).unwrap_or("1024x1024");
    let quality = model_cfg.extra.get("quality").and_then(Value::as_str).unwrap_or("standard");
    let n = model_cfg.extra.get("n").and_then(Value::as_u64).unwrap_or(1);

    let body = json!({
        "model": model_cfg.model_id,
        "prompt": prompt,
        "n": n,
        "size": size,
        "quality": quality,
        "response_format": "b64_json",
    });

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body,
    })
}

/// Same `data[]` shape as `azure_openai`.
pub fn reduce_full_response(body: &[u8]) -> GenericStreamingResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("openai-image: failed to parse response body: {err}");
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
