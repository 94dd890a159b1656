//! Google's streaming JSON-array response (`alt=sse`, one candidate object per element) ->
//! `GenericStreamingResponse`. Unlike OpenAI/Anthropic, a Gemini `functionCall` part always
//! arrives whole — there is no fragment-and-reassemble step for Google tool calls — so each one
//! is accumulated as a single complete slot rather than a name/id delta followed by argument
//! fragments.

use serde_json::Value;

use crate::dialect::google::{function_call_part_to_generic, FunctionCall};
use crate::gtm::{FinishReason, GenericStreamingResponse, StreamState};
use crate::provider::RawChunk;

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
        other => {
            log::warn!("google: unrecognized finishReason '{other}', mapping to Error");
            FinishReason::Error
        }
    }
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    let RawChunk::GoogleElement(element) = raw else {
        log::warn!("google adapter received a non-Google chunk shape");
        return GenericStreamingResponse::error("unexpected chunk shape for this provider");
    };

    let value: Value = match serde_json::from_str(element) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("google: failed to parse streamed element: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    if let Some(error) = value.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown upstream error");
        return GenericStreamingResponse::error(message);
    }

    let Some(candidate) = value.get("candidates").and_then(|candidates| candidates.get(0)) else {
        return GenericStreamingResponse::default();
    };

    let mut response = GenericStreamingResponse::default();

    if let Some(parts) = candidate.get("content").and_then(|content| content.get("parts")).and_then(Value::as_array) {
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                response.content.push(text.to_string());
            }
            if let Some(call) = part.get("functionCall") {
                let name = call.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
                let args = call.get("args").cloned().unwrap_or(Value::Object(Default::default()));
                let index = state.slot_count();
                let generic = function_call_part_to_generic(index, FunctionCall { name, args });
                state.accumulate([&generic]);
            }
        }
    }

    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        state.note_finish_reason(map_finish_reason(reason));
        let tool_calls = state.finalize();
        response.complete = true;
        response.finish_reason = Some(map_finish_reason(reason));
        response.tool_calls = tool_calls;
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_contributes_content() {
        let mut state = StreamState::new();
        let element = r#"{"candidates":[{"content":{"parts":[{"text":"hi"}]}}]}"#;
        let response = reduce_chunk(&RawChunk::GoogleElement(element.to_string()), &mut state);
        assert_eq!(response.content, vec!["hi".to_string()]);
    }

    #[test]
    fn function_call_arrives_whole_and_finalizes_on_finish_reason() {
        let mut state = StreamState::new();
        let element = r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"search","args":{"q":"rust"}}}]},"finishReason":"STOP"}]}"#;
        let response = reduce_chunk(&RawChunk::GoogleElement(element.to_string()), &mut state);

        assert!(response.complete);
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.tool_calls[0].name, "search");
    }

    #[test]
    fn safety_finish_reason_maps_to_content_filter() {
        let mut state = StreamState::new();
        let element = r#"{"candidates":[{"content":{"parts":[]},"finishReason":"SAFETY"}]}"#;
        let response = reduce_chunk(&RawChunk::GoogleElement(element.to_string()), &mut state);
        assert_eq!(response.finish_reason, Some(FinishReason::ContentFilter));
    }
}
