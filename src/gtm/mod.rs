//! The Generic Tool Model (GTM): neutral types every provider dialect converts through.
//!
//! `GenericTool`/`GenericToolCall`/`GenericStreamingResponse` are the pivot of every cross-dialect
//! translation in this crate. No provider-specific type appears in a public signature outside
//! `provider::<name>`; everything else in the crate — the sanitizer, the reducer, the dialect
//! router — speaks only GTM.

pub mod stream;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use stream::StreamState;

/// A provider family, used both by the schema sanitizer (which rules apply) and by
/// `GenericTool::provider_hint` (which destination a special tool is allowed to reach).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderFamily {
    OpenAi,
    OpenAiResponses,
    Anthropic,
    Google,
    Mistral,
    VLlm,
    IAssistant,
}

/// A canonical tool descriptor, authored once and converted to any provider's dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericTool {
    /// Stable identifier; used as the function name on the wire unless `name` differs.
    pub id: String,
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
    /// Restricts this tool to a specific provider family (e.g. Google's native web search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<ProviderFamily>,
    /// True for native provider features modeled as a tool (Google web search, etc.).
    #[serde(default)]
    pub is_special: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GenericTool {
    /// The identifier to place on the wire: explicit `id`, falling back to `name`. Per-provider
    /// conversion still applies the `tool_{index}` fallback (`dialect::tool_name_for`) when both
    /// are empty, since that fallback needs the tool's position in the list.
    pub fn wire_name(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }
}

/// Either a fully parsed tool-call argument object, or the raw text accumulated so far while
/// streaming. Parsing happens exactly once, at finalization (`stream::finalize`); a parse failure
/// is not an error at this layer, it's a fallback to `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Parsed(Value),
    Raw { raw: String },
}

impl ToolArguments {
    pub fn from_accumulated(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ToolArguments::Parsed(value),
            Err(_) => ToolArguments::Raw { raw: text },
        }
    }
}

/// A canonical tool invocation, possibly partial while streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericToolCall {
    /// May be empty while a delta is still arriving.
    #[serde(default)]
    pub id: String,
    /// May be empty while a delta is still arriving.
    #[serde(default)]
    pub name: String,
    pub arguments: ToolArguments,
    /// Slot index, used to correlate deltas across chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GenericToolCall {
    /// A delta carrying only an argument fragment, with name/id left empty. Emitting this instead
    /// of echoing an already-known name prevents downstream fan-out from overwriting an
    /// accumulated name with an empty one when deltas are forwarded chunk-by-chunk.
    pub fn argument_fragment(index: u32, fragment: impl Into<String>, original_format: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("streaming_chunk".into(), Value::Bool(true));
        metadata.insert("original_format".into(), Value::String(original_format.into()));

        Self {
            id: String::new(),
            name: String::new(),
            arguments: ToolArguments::Raw { raw: fragment.into() },
            index: Some(index),
            metadata,
        }
    }
}

/// Normalized stop reason, the same closed set every adapter's finalization maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

/// One image produced by an image-generation adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Already-downloaded base64 payload, or (when `needs_download` is true) a signed URL the
    /// caller must fetch itself. `provider::image::bfl` always resolves this to a payload before
    /// returning, since it owns the download step; the synchronous adapters may return a URL.
    pub base64_or_url: String,
    #[serde(default)]
    pub needs_download: bool,
}

/// One reduced chunk of an upstream response — the sole type crossing the boundary outward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericStreamingResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<GenericToolCall>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passages: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<GeneratedImage>>,
}

impl GenericStreamingResponse {
    pub fn text(fragment: impl Into<String>) -> Self {
        Self {
            content: vec![fragment.into()],
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_message: Some(message.into()),
            complete: true,
            finish_reason: Some(FinishReason::Error),
            ..Default::default()
        }
    }

    pub fn done(finish_reason: FinishReason) -> Self {
        Self {
            complete: true,
            finish_reason: Some(finish_reason),
            ..Default::default()
        }
    }
}
