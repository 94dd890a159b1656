use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced synchronously from `build_request` and the BFL orchestrator.
///
/// Chunk-level failures (a malformed SSE frame, an upstream error envelope) are *not* reported
/// through this type: `reduce_chunk` always returns a `GenericStreamingResponse`, setting
/// `error: true` on it, because the caller is mid-stream and needs a value to forward rather than
/// a broken iterator. This enum is reserved for failures that happen before or around a stream:
/// building the request, or driving the BFL poll loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The model configuration didn't resolve to anything usable for the chosen provider.
    #[error("Model '{0}' is not configured")]
    ModelNotFound(String),

    /// The caller-supplied request violates an invariant a provider requires (e.g. no user
    /// message for a one-shot provider).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// BYOK/anonymous auth failure raised synchronously from `build_request` (iAssistant's
    /// HMAC-JWT scheme in particular).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The upstream provider rejected the request once built (only relevant to the BFL
    /// orchestrator, which performs its own I/O).
    #[error("Provider API error ({status}): {message}")]
    ProviderApi { status: u16, message: String },

    /// Network failure while polling or downloading (BFL orchestrator only).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The BFL poll loop was cancelled via its cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// The BFL poll loop exhausted its attempt cap without reaching a terminal status.
    #[error("polling timed out after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    /// A response body (BFL's synchronous submit/poll envelopes; an image adapter's JSON body)
    /// could not be parsed. Chunk-level stream parse failures do not use this variant — those
    /// surface as `GenericStreamingResponse{error: true, ..}` instead, see module docs.
    #[error("parse error: {0}")]
    Parse(String),

    /// BFL reported `Request Moderated`/`Content Moderated` outside of a streaming context (the
    /// synchronous submit call itself was rejected, before any polling began).
    #[error("moderated: {0}")]
    Moderated(String),

    /// Never actually constructed: `schema::sanitize` is total and cannot fail. Kept as a
    /// documented non-case so the error taxonomy names the same categories the wire-level
    /// contract distinguishes.
    #[error("schema sanitization failed")]
    SchemaSanitizeFailed,

    /// Internal error that should not leak provider or request internals to the caller.
    #[error("internal error")]
    Internal(Option<String>),
}

impl GatewayError {
    /// Coarse retry classification left to the caller's own retry policy; the core itself never
    /// retries (BFL's backoff is protocol-mandated, not a generic retry layer, and lives entirely
    /// inside `provider::image::bfl`).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Connection(_) | GatewayError::ProviderApi { status: 500..=599, .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ModelNotFound(_) => "not_found_error",
            GatewayError::InvalidRequest(_) => "invalid_request_error",
            GatewayError::AuthenticationFailed(_) => "authentication_error",
            GatewayError::ProviderApi { .. } => "api_error",
            GatewayError::Connection(_) => "connection_error",
            GatewayError::Cancelled => "cancelled",
            GatewayError::PollTimeout { .. } => "timeout",
            GatewayError::Parse(_) => "parse_error",
            GatewayError::Moderated(_) => "moderated_error",
            GatewayError::SchemaSanitizeFailed => "internal_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}
