//! Black Forest Labs FLUX: the one component in this crate that performs I/O on the caller's
//! behalf. Every other adapter function is pure; BFL's protocol is submit-then-poll-then-download
//! and cannot be expressed as a single request/response pair, so it gets its own async
//! orchestrator instead of a `build_request`/`reduce_chunk` pair.
//!
//! The state transition logic (`classify_poll_response`, `advance_delay`) is kept as plain,
//! synchronous functions over `serde_json::Value` so it can be unit tested without a network
//! dependency; `generate` is a thin `async` shell around them.

use std::sync::OnceLock;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, Result};
use crate::gtm::{FinishReason, GeneratedImage, GenericStreamingResponse};
use crate::provider::ModelConfig;

const MAX_ATTEMPTS: u32 = 120;
const INITIAL_DELAY_MS: f64 = 500.0;
const MAX_DELAY_MS: f64 = 5000.0;

/// A FLUX generation request. Distinct from `BuildOptions` — BFL has no streaming, no tools, no
/// temperature; its own parameter set (dimensions, reference images, grounding) has no analogue
/// in any other adapter.
#[derive(Debug, Clone, Default)]
pub struct BflRequest {
    pub prompt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub reference_images: Vec<String>,
    pub grounding: Option<Value>,
}

fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT
        .get_or_init(|| Client::builder().build().expect("failed to build BFL HTTP client"))
        .clone()
}

fn submit_body(request: &BflRequest) -> Value {
    let mut body = json!({"prompt": request.prompt});
    let obj = body.as_object_mut().expect("constructed as an object above");

    if let Some(width) = request.width {
        obj.insert("width".into(), json!(width));
    }
    if let Some(height) = request.height {
        obj.insert("height".into(), json!(height));
    }
    if let Some(aspect_ratio) = &request.aspect_ratio {
        obj.insert("aspect_ratio".into(), json!(aspect_ratio));
    }
    if !request.reference_images.is_empty() {
        obj.insert("reference_images".into(), json!(request.reference_images));
    }
    if let Some(grounding) = &request.grounding {
        obj.insert("grounding".into(), grounding.clone());
    }

    body
}

enum PollSignal {
    Pending,
    Ready(Value),
    Moderated(String),
    Terminal(String),
}

/// Interpret one poll response body. Pure — kept separate from `poll_until_terminal` so the
/// status vocabulary is testable without a network round trip.
fn classify_poll_response(value: &Value) -> PollSignal {
    match value.get("status").and_then(Value::as_str).unwrap_or("") {
        "Ready" => PollSignal::Ready(value.clone()),
        "Request Moderated" => PollSignal::Moderated("BFL flagged the request as moderated".into()),
        "Content Moderated" => PollSignal::Moderated("BFL flagged the generated content as moderated".into()),
        "Task not found" => PollSignal::Terminal("BFL reports the task no longer exists".into()),
        "Error" => PollSignal::Terminal("BFL reported a terminal error status".into()),
        _ => PollSignal::Pending,
    }
}

/// Next delay given the current one, per the documented schedule: x1.5 on a plain `Pending`,
/// x2.0 after an HTTP 429, capped at `MAX_DELAY_MS`. Kept in `f64` across calls rather than
/// rounding to whole milliseconds each time — rounding every step compounds error and drifts off
/// the documented 500/750/1125/1687/2531/3796/5000... sequence.
fn advance_delay(current_ms: f64, rate_limited: bool) -> f64 {
    let factor = if rate_limited { 2.0 } else { 1.5 };
    (current_ms * factor).min(MAX_DELAY_MS)
}

fn extract_result_url(ready_value: &Value) -> Option<&str> {
    let result = ready_value.get("result")?;
    result
        .get("sample")
        .and_then(Value::as_str)
        .or_else(|| result.get("url").and_then(Value::as_str))
}

fn cancelled_response() -> GenericStreamingResponse {
    GenericStreamingResponse {
        error: true,
        finish_reason: Some(FinishReason::Error),
        error_message: Some("cancelled".into()),
        complete: true,
        ..Default::default()
    }
}

async fn submit(client: &Client, url: &str, api_key: &str, request: &BflRequest) -> Result<(String, String)> {
    let response = client
        .post(url)
        .header("x-key", api_key)
        .json(&submit_body(request))
        .send()
        .await
        .map_err(|err| GatewayError::Connection(err.to_string()))?;

    let status = response.status();
    let value: Value = response
        .json()
        .await
        .map_err(|err| GatewayError::Parse(format!("BFL submit response: {err}")))?;

    if !status.is_success() {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("BFL submit rejected")
            .to_string();
        return Err(GatewayError::ProviderApi {
            status: status.as_u16(),
            message,
        });
    }

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Parse("BFL submit response missing id".into()))?
        .to_string();
    let polling_url = value
        .get("polling_url")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Parse("BFL submit response missing polling_url".into()))?
        .to_string();

    Ok((id, polling_url))
}

enum PollOutcome {
    Ready(Value),
    Moderated(String),
}

async fn poll_until_terminal(
    client: &Client,
    polling_url: &str,
    api_key: &str,
    cancellation: &CancellationToken,
) -> Result<PollOutcome> {
    let mut delay_ms = INITIAL_DELAY_MS;

    for attempt in 1..=MAX_ATTEMPTS {
        if cancellation.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let response = client
            .get(polling_url)
            .header("x-key", api_key)
            .send()
            .await
            .map_err(|err| GatewayError::Connection(err.to_string()))?;
        let rate_limited = response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS;
        let value: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::Parse(format!("BFL poll response: {err}")))?;

        match classify_poll_response(&value) {
            PollSignal::Ready(value) => return Ok(PollOutcome::Ready(value)),
            PollSignal::Moderated(reason) => return Ok(PollOutcome::Moderated(reason)),
            PollSignal::Terminal(reason) => return Err(GatewayError::ProviderApi { status: 200, message: reason }),
            PollSignal::Pending => {
                log::debug!("bfl: poll attempt {attempt}/{MAX_ATTEMPTS}, next delay {delay_ms}ms");
            }
        }

        if cancellation.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        delay_ms = advance_delay(delay_ms, rate_limited);
    }

    Err(GatewayError::PollTimeout { attempts: MAX_ATTEMPTS })
}

async fn download(client: &Client, ready_value: &Value, cancellation: &CancellationToken) -> GenericStreamingResponse {
    if cancellation.is_cancelled() {
        return cancelled_response();
    }

    let Some(url) = extract_result_url(ready_value) else {
        return GenericStreamingResponse::error("BFL ready response missing result.sample/result.url");
    };

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => return GenericStreamingResponse::error(format!("BFL download failed: {err}")),
    };

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/png")
        .to_string();

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => return GenericStreamingResponse::error(format!("BFL download failed: {err}")),
    };

    GenericStreamingResponse {
        images: Some(vec![GeneratedImage {
            mime_type,
            base64_or_url: STANDARD.encode(&bytes),
            needs_download: false,
        }]),
        complete: true,
        finish_reason: Some(FinishReason::Stop),
        ..Default::default()
    }
}

/// Run the full submit/poll/download sequence. The sole async entry point in this crate.
/// `cancellation` is checked before every `sleep` and `fetch`; on trip it returns the documented
/// `{error: true, finish_reason: Error, error_message: "cancelled"}` response rather than an
/// `Err`, since by the time the caller observes this they are mid-generation and need a value to
/// forward, not a broken future.
pub async fn generate(
    model_cfg: &ModelConfig,
    request: &BflRequest,
    api_key: &str,
    cancellation: &CancellationToken,
) -> GenericStreamingResponse {
    if cancellation.is_cancelled() {
        return cancelled_response();
    }

    let client = http_client();
    let submit_url = model_cfg
        .url
        .clone()
        .unwrap_or_else(|| "https://api.bfl.ml/v1/flux-pro-1.1".to_string());

    let (task_id, polling_url) = match submit(&client, &submit_url, api_key, request).await {
        Ok(pair) => pair,
        Err(GatewayError::Cancelled) => return cancelled_response(),
        Err(err) => return GenericStreamingResponse::error(err.to_string()),
    };
    log::debug!("bfl: submitted task {task_id}, polling {polling_url}");

    match poll_until_terminal(&client, &polling_url, api_key, cancellation).await {
        Ok(PollOutcome::Ready(value)) => download(&client, &value, cancellation).await,
        Ok(PollOutcome::Moderated(reason)) => GenericStreamingResponse {
            error: false,
            finish_reason: Some(FinishReason::ContentFilter),
            error_message: Some(reason),
            complete: true,
            images: Some(Vec::new()),
            ..Default::default()
        },
        Err(GatewayError::Cancelled) => cancelled_response(),
        Err(err) => GenericStreamingResponse::error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_matches_the_documented_sequence() {
        let mut delay = INITIAL_DELAY_MS;
        let mut observed = vec![delay as u64];
        for _ in 0..6 {
            delay = advance_delay(delay, false);
            observed.push(delay as u64);
        }
        assert_eq!(observed, vec![500, 750, 1125, 1687, 2531, 3796, 5000]);
    }

    #[test]
    fn rate_limit_doubles_the_delay_instead_of_the_usual_1_5x() {
        let doubled = advance_delay(1000.0, true);
        assert_eq!(doubled as u64, 2000);
    }

    #[test]
    fn delay_never_exceeds_the_cap() {
        let delay = advance_delay(4000.0, true);
        assert_eq!(delay, MAX_DELAY_MS);
    }

    #[test]
    fn classify_ready_status_carries_the_full_body() {
        let value = json!({"status": "Ready", "result": {"sample": "https://x/y.png"}});
        assert!(matches!(classify_poll_response(&value), PollSignal::Ready(_)));
    }

    #[test]
    fn classify_moderation_statuses() {
        assert!(matches!(
            classify_poll_response(&json!({"status": "Request Moderated"})),
            PollSignal::Moderated(_)
        ));
        assert!(matches!(
            classify_poll_response(&json!({"status": "Content Moderated"})),
            PollSignal::Moderated(_)
        ));
    }

    #[test]
    fn classify_terminal_error_statuses() {
        assert!(matches!(
            classify_poll_response(&json!({"status": "Task not found"})),
            PollSignal::Terminal(_)
        ));
        assert!(matches!(
            classify_poll_response(&json!({"status": "Error"})),
            PollSignal::Terminal(_)
        ));
    }

    #[test]
    fn classify_unrecognized_status_is_pending() {
        assert!(matches!(classify_poll_response(&json!({"status": "Queued"})), PollSignal::Pending));
    }

    #[test]
    fn extract_result_url_prefers_sample_over_url() {
        let value = json!({"result": {"sample": "s", "url": "u"}});
        assert_eq!(extract_result_url(&value), Some("s"));
    }

    #[test]
    fn submit_body_only_includes_present_optional_fields() {
        let request = BflRequest {
            prompt: "a cat".into(),
            width: Some(512),
            ..Default::default()
        };
        let body = submit_body(&request);
        assert_eq!(body["prompt"], "a cat");
        assert_eq!(body["width"], 512);
        assert!(body.get("height").is_none());
        assert!(body.get("aspect_ratio").is_none());
    }

    #[test]
    fn submit_body_with_every_optional_field_set() {
        let request = BflRequest {
            prompt: "a cat astronaut".into(),
            width: Some(1024),
            height: Some(768),
            aspect_ratio: Some("4:3".into()),
            reference_images: vec!["https://example.com/ref.png".into()],
            grounding: Some(json!({"strength": 0.5})),
        };

        insta::assert_json_snapshot!(submit_body(&request), @r#"
        {
          "aspect_ratio": "4:3",
          "grounding": {
            "strength": 0.5
          },
          "height": 768,
          "prompt": "a cat astronaut",
          "reference_images": [
            "https://example.com/ref.png"
          ],
          "width": 1024
        }
        "#);
    }

    #[tokio::test]
    async fn generate_short_circuits_on_an_already_cancelled_token() {
        let cfg = ModelConfig {
            id: "flux".into(),
            model_id: "flux-pro-1.1".into(),
            provider: crate::provider::ProviderKind::Bfl,
            url: None,
            extra: Default::default(),
        };
        let token = CancellationToken::new();
        token.cancel();

        let response = generate(&cfg, &BflRequest::default(), "key", &token).await;
        assert!(response.error);
        assert_eq!(response.error_message.as_deref(), Some("cancelled"));
        assert_eq!(response.finish_reason, Some(FinishReason::Error));
    }
}
