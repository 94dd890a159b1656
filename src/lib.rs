//! Provider-agnostic LLM gateway core.
//!
//! This crate translates a canonical chat-completion request into the wire protocol of a
//! specific upstream LLM provider, reduces that provider's streaming response back into a
//! canonical incremental event stream, and translates tool definitions/calls between any two
//! provider dialects through a neutral intermediate representation.
//!
//! The crate performs no I/O of its own, with a single deliberate exception: the Black Forest
//! Labs image orchestrator (`provider::image::bfl`) owns the submit/poll/download loop because
//! that protocol cannot be expressed as a single request/response pair. Every other function in
//! this crate is pure: callers own the HTTP client, the event loop, and the `StreamState` handle.

pub mod dialect;
pub mod error;
pub mod gtm;
pub mod message;
pub mod provider;
pub mod reducer;
pub mod schema;

pub use error::{GatewayError, Result};
pub use gtm::{FinishReason, GeneratedImage, GenericStreamingResponse, GenericTool, GenericToolCall, ProviderFamily};
pub use message::Message;
pub use provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, ProviderKind};
pub use reducer::StreamingReducer;
