//! Image-generation adapters.
//!
//! Three synchronous, one-HTTP-round-trip adapters (`azure_openai`, `openai_image`,
//! `google_image`) share the same prompt-extraction rule and a similar `data[]`/`predictions[]`
//! response shape; `bfl` is the odd one out — a submit/poll/download state machine and the only
//! component in this crate that performs I/O on the caller's behalf (see module docs on `bfl`).

pub mod azure_openai;
pub mod bfl;
pub mod google_image;
pub mod openai_image;

use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::gtm::GeneratedImage;
use crate::message::{Message, Role};

/// Every synchronous image adapter prompts from the last user message's text; there is no
/// conversation history in an image-generation request, only a single prompt.
pub(crate) fn extract_prompt(messages: &[Message]) -> Result<String> {
    messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .and_then(|message| message.content.clone())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| GatewayError::InvalidRequest("image generation requires a user message with prompt text".into()))
}

pub(crate) fn image_from_b64(mime_type: &str, base64: impl Into<String>) -> GeneratedImage {
    GeneratedImage {
        mime_type: mime_type.to_string(),
        base64_or_url: base64.into(),
        needs_download: false,
    }
}

pub(crate) fn image_from_url(mime_type: &str, url: impl Into<String>) -> GeneratedImage {
    GeneratedImage {
        mime_type: mime_type.to_string(),
        base64_or_url: url.into(),
        needs_download: true,
    }
}

/// Shared by `azure_openai` and `openai_image`: both return `data[i].b64_json` or `data[i].url`
/// under the same top-level key, differing only in default URL, auth header, and request body.
pub(crate) fn images_from_data_array(value: &Value, default_mime: &str) -> Vec<GeneratedImage> {
    value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    if let Some(b64) = item.get("b64_json").and_then(Value::as_str) {
                        Some(image_from_b64(default_mime, b64))
                    } else {
                        item.get("url").and_then(Value::as_str).map(|url| image_from_url(default_mime, url))
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_prompt_uses_the_last_user_message() {
        let messages = vec![Message::system("ignored"), Message::user("a cat"), Message::user("a dog")];
        assert_eq!(extract_prompt(&messages).unwrap(), "a dog");
    }

    #[test]
    fn extract_prompt_rejects_no_user_message() {
        let messages = vec![Message::system("ignored")];
        assert!(extract_prompt(&messages).is_err());
    }

    #[test]
    fn images_from_data_array_prefers_b64_over_url() {
        let value = json!({"data": [{"b64_json": "AAA", "url": "https://example.com/x.png"}]});
        let images = images_from_data_array(&value, "image/png");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].base64_or_url, "AAA");
        assert!(!images[0].needs_download);
    }

    #[test]
    fn images_from_data_array_falls_back_to_url() {
        let value = json!({"data": [{"url": "https://example.com/x.png"}]});
        let images = images_from_data_array(&value, "image/png");
        assert!(images[0].needs_download);
    }
}
