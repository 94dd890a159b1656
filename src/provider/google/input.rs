//! Canonical `Message` list -> Google Gemini `contents[]`/`systemInstruction` request shape.

use serde_json::{json, Value};

use crate::message::{Message, Role};

/// Gemini has a single `systemInstruction` object, not a per-turn role; every system message's
/// text joins with `"\n\n"`, same as Anthropic.
pub fn extract_system_instruction(messages: &[Message]) -> Option<Value> {
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
        Some(json!({"parts": [{"text": joined}]}))
    }
}

pub fn contents_from_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter(|message| message.role != Role::System)
        .map(message_to_content)
        .collect()
}

fn role_str(role: Role) -> &'static str {
    match role {
        // Gemini has no tool role of its own; tool results ride in as a `user` turn carrying a
        // `functionResponse` part, same slot a `user` message's parts occupy.
        Role::Assistant => "model",
        Role::User | Role::Tool | Role::System => "user",
    }
}

fn message_to_content(message: &Message) -> Value {
    if message.role == Role::Tool {
        return function_response_content(message);
    }

    let mut parts = Vec::new();
    if message.has_text() {
        parts.push(json!({"text": message.content.clone().unwrap_or_default()}));
    }
    for image in &message.image_parts {
        parts.push(json!({"inlineData": {"mimeType": image.mime_type, "data": image.base64}}));
    }
    if let Some(calls) = &message.tool_calls {
        for call in calls {
            parts.push(json!({"functionCall": {"name": call.name, "args": call.arguments()}}));
        }
    }

    json!({"role": role_str(message.role), "parts": parts})
}

fn function_response_content(message: &Message) -> Value {
    let name = message.tool_name.clone().unwrap_or_default();
    let response_text = message.content.clone().unwrap_or_default();

    let mut parts = vec![json!({
        "functionResponse": {
            "name": name,
            "response": {"content": response_text}
        }
    })];

    for image in &message.image_parts {
        parts.push(json!({"inlineData": {"mimeType": image.mime_type, "data": image.base64}}));
    }

    json!({"role": "user", "parts": parts})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_role_maps_to_model() {
        let contents = contents_from_messages(&[Message::user("hi")]);
        assert_eq!(contents[0]["role"], "user");

        let assistant = Message {
            role: Role::Assistant,
            content: Some("hello".into()),
            image_parts: Vec::new(),
            audio_parts: Vec::new(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
            is_error: None,
        };
        let contents = contents_from_messages(&[assistant]);
        assert_eq!(contents[0]["role"], "model");
    }

    #[test]
    fn system_instruction_is_extracted_not_inlined() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        assert_eq!(
            extract_system_instruction(&messages),
            Some(json!({"parts": [{"text": "be terse"}]}))
        );
        assert_eq!(contents_from_messages(&messages).len(), 1);
    }
}
