//! Google Imagen `:predict` adapter. Distinct wire shape from Gemini chat: Imagen authenticates
//! with an `x-goog-api-key` header rather than a key-in-URL query parameter, and its response
//! nests images under `predictions[i].bytesBase64Encoded` instead of a `data[]` array.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::Result;
use crate::gtm::{FinishReason, GenericStreamingResponse};
use crate::message::Message;
use crate::provider::image::{extract_prompt, image_from_b64};
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig};

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    _options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let prompt = extract_prompt(messages)?;

    let url = model_cfg.url.clone().unwrap_or_else(|| {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:predict",
            model_cfg.model_id
        )
    });

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("x-goog-api-key".into(), api_key.to_string());

    let sample_count = model_cfg.extra.get("n").and_then(Value::as_u64).unwrap_or(1);
    let aspect_ratio = model_cfg.extra.get("aspect_ratio").and_then(Value::as_str).unwrap_or("1:1");

    let body = json!({
        "instances": [{"prompt": prompt}],
        "parameters": {"sampleCount": sample_count, "aspectRatio": aspect_ratio},
    });

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body,
    })
}

/// Extracts `predictions[i].bytesBase64Encoded` from the single JSON response body.
pub fn reduce_full_response(body: &[u8]) -> GenericStreamingResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("google-image: failed to parse response body: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    if let Some(message) = value.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
        return GenericStreamingResponse::error(message.to_string());
    }

    let images = value
        .get("predictions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("bytesBase64Encoded")
                        .and_then(Value::as_str)
                        .map(|b64| image_from_b64("image/png", b64))
                })
                .collect()
        })
        .unwrap_or_default();

    GenericStreamingResponse {
        images: Some(images),
        complete: true,
        finish_reason: Some(FinishReason::Stop),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn cfg() -> ModelConfig {
        ModelConfig {
            id: "imagen".into(),
            model_id: "imagen-3.0-generate-002".into(),
            provider: crate::provider::ProviderKind::GoogleImage,
            url: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn auth_uses_a_header_not_a_url_query_param() {
        let request = build_request(&cfg(), &[Message::user("a cat")], "AIza-test", &BuildOptions::default()).unwrap();
        assert_eq!(request.headers["x-goog-api-key"], "AIza-test");
        assert!(!request.url.contains("AIza-test"));
    }

    #[test]
    fn reduce_full_response_extracts_predictions() {
        let body = br#"{"predictions":[{"bytesBase64Encoded":"AAAA"},{"bytesBase64Encoded":"BBBB"}]}"#;
        let response = reduce_full_response(body);
        assert!(response.complete);
        assert_eq!(response.images.unwrap().len(), 2);
    }
}
