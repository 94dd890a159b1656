//! Canonical `Message` list -> Anthropic Messages API request shape.

use serde_json::{json, Value};

use crate::message::{Message, Role};

/// Join every system message's text with `"\n\n"`; Anthropic has no per-turn system role, only
/// one top-level `system` string for the whole request.
pub fn extract_system(messages: &[Message]) -> Option<String> {
    let joined = messages
        .iter()
        .filter(|message| message.role == Role::System)
        .filter_map(|message| message.content.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Everything but `Role::System` becomes a turn; system content is pulled out by `extract_system`.
pub fn messages_to_wire(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter(|message| message.role != Role::System)
        .map(message_to_wire)
        .collect()
}

fn message_to_wire(message: &Message) -> Value {
    if message.role == Role::Tool {
        return tool_result_to_wire(message);
    }

    let role = match message.role {
        Role::Assistant => "assistant",
        _ => "user",
    };

    let mut blocks = Vec::new();
    if message.has_text() {
        blocks.push(json!({"type": "text", "text": message.content.clone().unwrap_or_default()}));
    }
    for image in &message.image_parts {
        blocks.push(json!({
            "type": "image",
            "source": {"type": "base64", "media_type": image.mime_type, "data": image.base64}
        }));
    }
    if let Some(calls) = &message.tool_calls {
        for call in calls {
            blocks.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.arguments()
            }));
        }
    }

    json!({"role": role, "content": blocks})
}

/// A tool result carrying returned images is re-injected as a **user** turn whose content array
/// holds one `tool_result` block (text acknowledgement only) followed by one `image` block per
/// returned image — Anthropic has no way to attach binary data directly to a `tool_result` block
/// in this shape, so the images ride alongside it in the same turn.
fn tool_result_to_wire(message: &Message) -> Value {
    let tool_use_id = message.tool_call_id.clone().unwrap_or_default();
    let text = message.content.clone().unwrap_or_default();

    let mut content = vec![json!({
        "type": "tool_result",
        "tool_use_id": tool_use_id,
        "is_error": message.is_error.unwrap_or(false),
        "content": text
    })];

    for image in &message.image_parts {
        content.push(json!({
            "type": "image",
            "source": {"type": "base64", "media_type": image.mime_type, "data": image.base64}
        }));
    }

    json!({"role": "user", "content": content})
}
