//! Provider Adapters: one module per upstream wire protocol, composed behind a sealed enum.
//!
//! `ProviderKind` replaces what would be a trait-object registry in a dynamically-dispatched
//! design: a chat completion's provider is known at request-build time, so matching on a closed
//! enum gets the same "one adapter per provider" shape with exhaustiveness checked at compile
//! time instead of a `Box<dyn Provider>` indirection.

pub mod anthropic;
pub mod google;
pub mod iassistant;
pub mod image;
pub mod mistral;
pub mod openai;
pub mod openai_responses;
pub mod vllm;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::gtm::{GenericStreamingResponse, GenericTool, StreamState};
use crate::message::Message;

/// Which upstream wire protocol a model is configured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    OpenAi,
    OpenAiResponses,
    Anthropic,
    Google,
    Mistral,
    /// Any OpenAI-compatible self-hosted vLLM endpoint.
    Local,
    IAssistant,
    AzureOpenAiImage,
    OpenAiImage,
    GoogleImage,
    Bfl,
}

/// The caller's configuration for one logical model. Plain data — no file loading, no
/// environment lookups; a caller's own config layer is responsible for producing this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub model_id: String,
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Get,
}

/// Everything a caller-owned HTTP client needs to actually issue the request. The core builds
/// this value and never touches a socket itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Json,
}

/// The normalized effort level `provider::openai_responses` installs at `body.reasoning.effort`,
/// derived from the numeric `BuildOptions::thinking_budget` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// `thinking_budget` -> `reasoning.effort`, recognized only by `provider::openai_responses`
/// (OpenAI Responses is the single dialect in this table with a first-class "thinking" budget).
/// `-1` is the documented "dynamic" sentinel, distinct from an absent budget.
pub fn thinking_effort_for_budget(budget: Option<i64>) -> ThinkingEffort {
    match budget {
        None | Some(0) => ThinkingEffort::Minimal,
        Some(-1) => ThinkingEffort::Medium,
        Some(value) if value < 0 => ThinkingEffort::Minimal,
        Some(1..=100) => ThinkingEffort::Low,
        Some(101..=500) => ThinkingEffort::Medium,
        Some(_) => ThinkingEffort::High,
    }
}

/// Per-request knobs every `build_request` reads a subset of.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub temperature: Option<f32>,
    pub stream: Option<bool>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<GenericTool>,
    pub tool_choice: Option<String>,
    pub response_format: Option<ResponseFormat>,
    /// Takes precedence over `response_format` when both are present.
    pub response_schema: Option<Value>,
    pub thinking_enabled: bool,
    /// Numeric budget, mapped to a `reasoning.effort` level through `thinking_effort_for_budget`.
    /// `-1` means "dynamic"; `0`/absent means disabled.
    pub thinking_budget: Option<i64>,
    /// Requests verbose intermediate reasoning text (`body.text.verbosity = "high"`) independent
    /// of the effort level derived from `thinking_budget`.
    pub thinking_thoughts: bool,
}

impl BuildOptions {
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(0.7)
    }

    pub fn stream_or_default(&self) -> bool {
        self.stream.unwrap_or(true)
    }

    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(1024)
    }
}

/// One raw chunk of an upstream stream, already framed by the caller's SSE/JSON-array reader.
/// Image adapters bypass this entirely: the synchronous ones consume a whole response body
/// (`reduce_full_response`), and `image::bfl` is its own async orchestrator.
#[derive(Debug, Clone)]
pub enum RawChunk {
    /// One `data:` line's payload from an OpenAI-family SSE stream, or the literal `"[DONE]"`.
    OpenAiLine(String),
    /// One typed Anthropic SSE event.
    AnthropicEvent { event: String, data: String },
    /// One element of Google's JSON-array streaming response.
    GoogleElement(String),
    /// One iAssistant SSE frame (`event:`/`data:`/`id:` triple; `event`/`id` are optional).
    IAssistantFrame {
        event: Option<String>,
        data: String,
        id: Option<String>,
    },
}

/// Build the upstream HTTP request for `model_cfg.provider`. Dispatches by value; every chat
/// provider kind is handled, image kinds route to their own build functions, and `Bfl` has no
/// single-request shape (it is a submit/poll/download sequence) so it is rejected here in favor
/// of `image::bfl::generate`.
pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    match model_cfg.provider {
        ProviderKind::OpenAi => openai::build_request(model_cfg, messages, api_key, options),
        ProviderKind::OpenAiResponses => openai_responses::build_request(model_cfg, messages, api_key, options),
        ProviderKind::Anthropic => anthropic::build_request(model_cfg, messages, api_key, options),
        ProviderKind::Google => google::build_request(model_cfg, messages, api_key, options),
        ProviderKind::Mistral => mistral::build_request(model_cfg, messages, api_key, options),
        ProviderKind::Local => vllm::build_request(model_cfg, messages, api_key, options),
        ProviderKind::IAssistant => iassistant::build_request(model_cfg, messages, api_key, options),
        ProviderKind::AzureOpenAiImage => image::azure_openai::build_request(model_cfg, messages, api_key, options),
        ProviderKind::OpenAiImage => image::openai_image::build_request(model_cfg, messages, api_key, options),
        ProviderKind::GoogleImage => image::google_image::build_request(model_cfg, messages, api_key, options),
        ProviderKind::Bfl => Err(GatewayError::InvalidRequest(
            "BFL has no single request shape; call provider::image::bfl::generate".into(),
        )),
    }
}

/// Reduce one raw chunk for `kind` into a canonical streaming response fragment. Only meaningful
/// for the seven chat-completion provider kinds; calling this for an image kind is a caller bug,
/// reported as a data-level error rather than a panic since `reduce_chunk` never returns `Result`.
pub fn reduce_chunk(kind: ProviderKind, raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    match kind {
        ProviderKind::OpenAi => openai::reduce_chunk(raw, state),
        ProviderKind::OpenAiResponses => openai_responses::reduce_chunk(raw, state),
        ProviderKind::Anthropic => anthropic::reduce_chunk(raw, state),
        ProviderKind::Google => google::reduce_chunk(raw, state),
        ProviderKind::Mistral => mistral::reduce_chunk(raw, state),
        ProviderKind::Local => vllm::reduce_chunk(raw, state),
        ProviderKind::IAssistant => iassistant::reduce_chunk(raw, state),
        ProviderKind::AzureOpenAiImage | ProviderKind::OpenAiImage | ProviderKind::GoogleImage | ProviderKind::Bfl => {
            log::error!("reduce_chunk called for image provider kind {kind:?}; image adapters use reduce_full_response or generate()");
            GenericStreamingResponse::error("this provider does not stream chunks")
        }
    }
}
