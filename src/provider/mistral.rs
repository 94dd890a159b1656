//! Mistral's `chat/completions` endpoint speaks the same wire shape as OpenAI's, unmodified.

use crate::error::Result;
use crate::gtm::{GenericStreamingResponse, ProviderFamily, StreamState};
use crate::message::Message;
use crate::provider::openai;
use crate::provider::{BuildOptions, HttpRequestDescriptor, ModelConfig, RawChunk};

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    openai::build_request_for(
        model_cfg,
        messages,
        api_key,
        options,
        "https://api.mistral.ai/v1/chat/completions",
        ProviderFamily::Mistral,
    )
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    openai::reduce_chunk(raw, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn default_url_points_at_mistral() {
        let cfg = ModelConfig {
            id: "m".into(),
            model_id: "mistral-large-latest".into(),
            provider: crate::provider::ProviderKind::Mistral,
            url: None,
            extra: Map::new(),
        };
        let request = build_request(&cfg, &[Message::user("hi")], "key", &BuildOptions::default()).unwrap();
        assert_eq!(request.url, "https://api.mistral.ai/v1/chat/completions");
    }
}
