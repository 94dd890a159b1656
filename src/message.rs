//! Canonical conversational message, independent of any provider's wire shape.
//!
//! Every provider adapter's message canonicalizer (`provider::<name>::input`) consumes a slice
//! of `Message` and produces that provider's own message array; nothing else in this crate reads
//! or writes provider-specific message types directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    /// Plain text content. `None` when a message carries only tool calls or only binary parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_parts: Vec<ImagePart>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_parts: Vec<AudioPart>,

    /// Assistant-only: tool calls this message invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRef>>,

    /// Tool-only: the id of the call this message answers. Required on `Role::Tool` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool-only: the name of the tool that produced this result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Tool-only: whether this result represents a tool execution failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            image_parts: Vec::new(),
            audio_parts: Vec::new(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            is_error: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(text.into()),
            image_parts: Vec::new(),
            audio_parts: Vec::new(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            is_error: None,
        }
    }

    /// Whether this message carries no text and no binary parts — used by canonicalizers that
    /// must omit the text field entirely rather than send an empty string.
    pub fn has_text(&self) -> bool {
        self.content.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_binary_parts(&self) -> bool {
        !self.image_parts.is_empty() || !self.audio_parts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePart {
    pub mime_type: String,
    pub base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImagePart {
    /// `data:<mime>;base64,<payload>` — the shape OpenAI/Mistral/vLLM want inline.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPart {
    pub mime_type: String,
    pub base64: String,
}

/// An assistant message's reference to a tool it invoked, as stored on `Message::tool_calls`.
///
/// Distinct from `gtm::GenericToolCall`: this is the canonical *message* representation (always
/// fully formed, `arguments_json` is a string exactly as the model emitted it), while
/// `GenericToolCall` is the *streaming* representation (may be partial, arguments may be
/// unparsed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRef {
    pub id: String,
    pub name: String,
    pub arguments_json: String,
}

impl ToolCallRef {
    pub fn arguments(&self) -> Value {
        serde_json::from_str(&self.arguments_json).unwrap_or(Value::Null)
    }
}
