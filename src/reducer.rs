//! Streaming Reducer: binds one `StreamState` to repeated `reduce_chunk` calls for one logical
//! stream, and is the only place that observes completion across chunks.
//!
//! Everything here is a thin wrapper — the actual per-chunk translation lives in
//! `provider::reduce_chunk`, and the tool-call accumulation rules live in `gtm::stream`. This
//! module exists so a caller doesn't have to juggle a `ProviderKind` and a `StreamState` by hand
//! and remember to call `finalize` once at the end; that bookkeeping belongs in one type.

use crate::gtm::{GenericStreamingResponse, StreamState};
use crate::provider::{self, ProviderKind, RawChunk};

/// Owns the `StreamState` for one in-flight stream. Create one per stream, `feed` it every raw
/// chunk in receipt order, then `finish` it once the transport signals end-of-stream (or the
/// caller gives up on the connection).
pub struct StreamingReducer {
    kind: ProviderKind,
    state: StreamState,
}

impl StreamingReducer {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            state: StreamState::new(),
        }
    }

    /// Fold one raw chunk into the canonical event stream. Chunks must be delivered in receipt
    /// order — this type does not buffer or reorder them.
    pub fn feed(&mut self, raw: &RawChunk) -> GenericStreamingResponse {
        provider::reduce_chunk(self.kind, raw, &mut self.state)
    }

    /// Drain any tool-call slots the underlying adapter never finalized itself (a transport that
    /// closes without an explicit end-of-stream sentinel) into one final response, and consume
    /// the reducer. Safe to call even when every tool call was already finalized by `feed` — an
    /// empty state simply yields no tool calls.
    pub fn finish(mut self) -> GenericStreamingResponse {
        if self.state.is_empty() {
            return GenericStreamingResponse::done(self.state.last_finish_reason.unwrap_or(crate::gtm::FinishReason::Stop));
        }

        let tool_calls = self.state.finalize();
        let finish_reason = self.state.last_finish_reason.unwrap_or(crate::gtm::FinishReason::ToolCalls);

        GenericStreamingResponse {
            tool_calls,
            complete: true,
            finish_reason: Some(finish_reason),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn finish_drains_tool_calls_the_adapter_left_pending() {
        let mut reducer = StreamingReducer::new(ProviderKind::OpenAi);

        reducer.feed(&RawChunk::OpenAiLine(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"c1","type":"function","function":{"name":"search","arguments":"{}"}}]},"finish_reason":"tool_calls"}]}"#
                .to_string(),
        ));

        // No `[DONE]` sentinel fed — the transport just closed. `finish` still drains the slot.
        let response = reducer.finish();
        assert!(response.complete);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "search");
    }

    #[test]
    fn finish_on_a_text_only_stream_carries_no_tool_calls() {
        let mut reducer = StreamingReducer::new(ProviderKind::OpenAi);
        let response = reducer.feed(&RawChunk::OpenAiLine(
            r#"{"choices":[{"delta":{"content":"hi"}}]}"#.to_string(),
        ));
        assert_eq!(response.content, vec!["hi".to_string()]);

        let done = reducer.finish();
        assert!(done.tool_calls.is_empty());
        assert!(done.complete);
    }

    #[test]
    fn feed_after_done_sentinel_still_finishes_cleanly() {
        let mut reducer = StreamingReducer::new(ProviderKind::OpenAi);
        reducer.feed(&RawChunk::OpenAiLine(
            r#"{"choices":[{"delta":{"content":"hi"},"finish_reason":"stop"}]}"#.to_string(),
        ));
        let done_chunk = reducer.feed(&RawChunk::OpenAiLine("[DONE]".to_string()));
        assert!(done_chunk.complete);
        assert_eq!(done_chunk.finish_reason, Some(crate::gtm::FinishReason::Stop));

        let finish = reducer.finish();
        assert!(finish.tool_calls.is_empty());
    }

    #[test]
    fn a_multi_event_sse_transcript_accumulates_text_and_finishes_on_done() {
        let transcript = indoc! {r#"
            data: {"choices":[{"delta":{"role":"assistant"}}]}
            data: {"choices":[{"delta":{"content":"Lis"}}]}
            data: {"choices":[{"delta":{"content":"bon"}}]}
            data: {"choices":[{"delta":{},"finish_reason":"stop"}]}
            data: [DONE]
        "#};

        let mut reducer = StreamingReducer::new(ProviderKind::OpenAi);
        let mut text = String::new();
        let mut done = None;

        for line in transcript.lines() {
            let payload = line.trim_start_matches("data: ");
            let response = reducer.feed(&RawChunk::OpenAiLine(payload.to_string()));
            text.extend(response.content);
            if response.complete {
                done = Some(response);
            }
        }

        assert_eq!(text, "Lisbon");
        let done = done.expect("[DONE] sentinel should have produced a completed response");
        assert_eq!(done.finish_reason, Some(crate::gtm::FinishReason::Stop));
    }
}
