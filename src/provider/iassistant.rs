//! iAssistant's internal RAG endpoint. One-shot (no conversation history), authenticated with a
//! caller-supplied, already-signed HMAC-JWT — signing the JWT itself is a caller concern (it
//! needs a shared secret this crate never holds), `build_request` only refuses an anonymous
//! caller synchronously, per the documented auth-failure taxonomy.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::gtm::{FinishReason, GenericStreamingResponse, StreamState};
use crate::message::{Message, Role};
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk};

const ANONYMOUS_SENTINEL: &str = "anonymous";

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    _options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    if api_key.is_empty() || api_key == ANONYMOUS_SENTINEL {
        return Err(GatewayError::AuthenticationFailed(
            "iAssistant requires a signed JWT; anonymous callers are rejected".into(),
        ));
    }

    let question = messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .and_then(|message| message.content.clone())
        .ok_or_else(|| GatewayError::InvalidRequest("iAssistant requires at least one user message".into()))?;

    let base_url = model_cfg
        .url
        .clone()
        .unwrap_or_else(|| "https://iassistant.internal/internal-api/v2/rag/ask".to_string());

    let request_uuid = model_cfg
        .extra
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::nil().to_string());
    let search_fields = model_cfg.extra.get("search_fields").and_then(Value::as_str).unwrap_or("default");
    let search_mode = model_cfg.extra.get("s_search_mode").and_then(Value::as_str).unwrap_or("hybrid");
    let search_distance = model_cfg
        .extra
        .get("s_search_distance")
        .and_then(Value::as_f64)
        .unwrap_or(0.7);

    let url = format!(
        "{base_url}?uuid={request_uuid}&searchFields={search_fields}&sSearchMode={search_mode}&sSearchDistance={search_distance}"
    );

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("Authorization".into(), format!("Bearer {api_key}"));

    let profile_id = model_cfg.extra.get("profile_id").and_then(Value::as_str).unwrap_or("default");
    let filter = model_cfg.extra.get("filter").cloned().unwrap_or(Value::Null);

    let body = json!({
        "question": question,
        "filter": filter,
        "profileId": profile_id,
        "metaData": true,
        "telemetry": true,
    });

    log::debug!("iassistant build_request: discarded {} prior messages (one-shot)", messages.len().saturating_sub(1));

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body,
    })
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    let RawChunk::IAssistantFrame { event, data, .. } = raw else {
        log::warn!("iassistant adapter received a non-iAssistant chunk shape");
        return GenericStreamingResponse::error("unexpected chunk shape for this provider");
    };

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("iassistant: failed to parse SSE payload: {err}");
            return GenericStreamingResponse::error(format!("parse error: {err}"));
        }
    };

    match event.as_deref() {
        Some("telemetry") => GenericStreamingResponse {
            telemetry: Some(value),
            ..Default::default()
        },
        Some("passages") => GenericStreamingResponse {
            passages: Some(value),
            ..Default::default()
        },
        Some("answer") => {
            let text = value.get("answer").and_then(Value::as_str).unwrap_or_default();
            GenericStreamingResponse::text(text)
        }
        Some("done") | Some("end") | Some("complete") => {
            state.note_finish_reason(FinishReason::Stop);
            GenericStreamingResponse::done(FinishReason::Stop)
        }
        Some(other) => {
            // Per the source's own fallback: an unrecognized event probes for an embedded
            // `eventType` field before giving up.
            if let Some(event_type) = value.get("eventType").and_then(Value::as_str) {
                log::warn!("iassistant: unrecognized event '{other}', embedded eventType='{event_type}', skipping");
            } else {
                log::warn!("iassistant: unrecognized event '{other}', skipping");
            }
            GenericStreamingResponse::default()
        }
        None => {
            log::warn!("iassistant: frame carried no event name, skipping");
            GenericStreamingResponse::default()
        }
    }
}
