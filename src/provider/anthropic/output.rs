//! Anthropic's typed SSE event stream -> `GenericStreamingResponse`.
//!
//! Anthropic streams tool-call arguments as `input_json_delta` events carrying `partial_json`
//! fragments rather than an incremental string field on a growing object, and signals a finished
//! tool call with `content_block_stop` rather than a `finish_reason` on the same frame as the
//! last delta — both are accounted for below.

use serde_json::Value;

use crate::dialect::anthropic::{tool_use_start_to_generic, InputJsonDelta};
use crate::gtm::{FinishReason, GenericStreamingResponse, StreamState};
use crate::provider::RawChunk;

fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        other => {
            log::warn!("anthropic: unrecognized stop_reason '{other}', mapping to Error");
            FinishReason::Error
        }
    }
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    let RawChunk::AnthropicEvent { event, data } = raw else {
        log::warn!("anthropic adapter received a non-Anthropic chunk shape");
        return GenericStreamingResponse::error("unexpected chunk shape for this provider");
    };

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("anthropic: failed to parse SSE payload: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    match event.as_str() {
        "message_start" => GenericStreamingResponse::default(),

        "content_block_start" => {
            let index = value.get("index").and_then(Value::as_u64).unwrap_or(0) as u32;
            let block = value.get("content_block");

            if block.and_then(|b| b.get("type")).and_then(Value::as_str) == Some("tool_use") {
                let id = block.and_then(|b| b.get("id")).and_then(Value::as_str).unwrap_or_default().to_string();
                let name = block.and_then(|b| b.get("name")).and_then(Value::as_str).unwrap_or_default().to_string();
                state.accumulate([&tool_use_start_to_generic(index, id, name)]);
            }

            GenericStreamingResponse::default()
        }

        "content_block_delta" => {
            let index = value.get("index").and_then(Value::as_u64).unwrap_or(0) as u32;
            let Some(delta) = value.get("delta") else {
                return GenericStreamingResponse::default();
            };

            match delta.get("type").and_then(Value::as_str) {
                Some("text_delta") => {
                    let text = delta.get("text").and_then(Value::as_str).unwrap_or_default();
                    GenericStreamingResponse::text(text)
                }
                Some("input_json_delta") => {
                    let partial_json = delta.get("partial_json").and_then(Value::as_str).unwrap_or_default().to_string();
                    let fragment = crate::dialect::anthropic::input_json_delta_to_generic(
                        index,
                        InputJsonDelta { partial_json },
                    );
                    state.accumulate([&fragment]);
                    GenericStreamingResponse::default()
                }
                other => {
                    log::warn!("anthropic: unrecognized delta type {other:?}, skipping");
                    GenericStreamingResponse::default()
                }
            }
        }

        "content_block_stop" => GenericStreamingResponse::default(),

        "message_delta" => {
            if let Some(reason) = value.get("delta").and_then(|d| d.get("stop_reason")).and_then(Value::as_str) {
                state.note_finish_reason(map_stop_reason(reason));
            }
            GenericStreamingResponse::default()
        }

        "message_stop" => {
            let tool_calls = state.finalize();
            let finish_reason = state.last_finish_reason.unwrap_or(FinishReason::Stop);
            GenericStreamingResponse {
                tool_calls,
                complete: true,
                finish_reason: Some(finish_reason),
                ..Default::default()
            }
        }

        "error" => {
            let message = value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown upstream error");
            GenericStreamingResponse::error(message)
        }

        "ping" => GenericStreamingResponse::default(),

        other => {
            log::warn!("anthropic: unrecognized event type '{other}', skipping");
            GenericStreamingResponse::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event: &str, data: &str) -> RawChunk {
        RawChunk::AnthropicEvent {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn text_delta_contributes_content() {
        let mut state = StreamState::new();
        let response = reduce_chunk(
            &event("content_block_delta", r#"{"index":0,"delta":{"type":"text_delta","text":"hi"}}"#),
            &mut state,
        );
        assert_eq!(response.content, vec!["hi".to_string()]);
    }

    #[test]
    fn tool_use_accumulates_across_start_and_deltas_then_finalizes_on_message_stop() {
        let mut state = StreamState::new();
        reduce_chunk(
            &event(
                "content_block_start",
                r#"{"index":0,"content_block":{"type":"tool_use","id":"toolu_1","name":"search","input":{}}}"#,
            ),
            &mut state,
        );
        reduce_chunk(
            &event(
                "content_block_delta",
                r#"{"index":0,"delta":{"type":"input_json_delta","partial_json":"{\"q\":"}}"#,
            ),
            &mut state,
        );
        reduce_chunk(
            &event(
                "content_block_delta",
                r#"{"index":0,"delta":{"type":"input_json_delta","partial_json":"\"rust\"}"}}"#,
            ),
            &mut state,
        );
        reduce_chunk(&event("message_delta", r#"{"delta":{"stop_reason":"tool_use"}}"#), &mut state);
        let done = reduce_chunk(&event("message_stop", "{}"), &mut state);

        assert!(done.complete);
        assert_eq!(done.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(done.tool_calls[0].id, "toolu_1");
        assert_eq!(done.tool_calls[0].name, "search");
        assert_eq!(
            done.tool_calls[0].arguments,
            crate::gtm::ToolArguments::Parsed(serde_json::json!({"q": "rust"}))
        );
    }

    #[test]
    fn error_event_marks_response_as_errored() {
        let mut state = StreamState::new();
        let response = reduce_chunk(&event("error", r#"{"error":{"message":"overloaded"}}"#), &mut state);
        assert!(response.error);
        assert_eq!(response.error_message, Some("overloaded".to_string()));
    }

    #[test]
    fn unrecognized_event_is_skipped_not_fatal() {
        let mut state = StreamState::new();
        let response = reduce_chunk(&event("some_future_event", "{}"), &mut state);
        assert!(!response.error);
    }
}
