//! JSON Schema sanitizer: rewrites a tool-parameter schema for a target provider's restrictions.
//!
//! Pure and total — never observes I/O, never fails. Grounded on the reference Google adapter's
//! `strip_unsupported_schema_fields`, generalized to every provider family in the sanitization
//! table below and extended to also *enforce* fields (OpenAI/OpenAI-Responses strict mode)
//! rather than only stripping them.

use serde_json::{Map, Value};

use crate::gtm::ProviderFamily;

/// Rewrite `value` for `provider`. Always deep-clones: callers routinely share one schema object
/// across many tool definitions, so sanitizing one target must never be visible to another.
pub fn sanitize(provider: ProviderFamily, value: &Value) -> Value {
    let mut cloned = value.clone();

    if !cloned.is_object() {
        // Malformed/non-object input: return a safe empty shell rather than fail.
        return Value::Object(Map::from_iter([
            ("type".to_string(), Value::String("object".to_string())),
            ("properties".to_string(), Value::Object(Map::new())),
        ]));
    }

    match provider {
        ProviderFamily::Google => strip_google_fields(&mut cloned),
        ProviderFamily::VLlm => {
            strip_google_fields(&mut cloned);
            strip_vllm_fields(&mut cloned);
        }
        ProviderFamily::OpenAi | ProviderFamily::OpenAiResponses => enforce_openai_strict(&mut cloned),
        ProviderFamily::Anthropic | ProviderFamily::Mistral | ProviderFamily::IAssistant => {
            // No rewriting for these dialects.
        }
    }

    cloned
}

/// Fields Google's Gemini function-calling schema rejects: `exclusiveMaximum`, `exclusiveMinimum`,
/// `title`, `format` (except `enum`/`date-time` on strings), `minLength`, `maxLength`,
/// `additionalProperties`, `$schema`, `default`. Applied recursively through `properties`/`items`.
fn strip_google_fields(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else { return };

    for key in [
        "exclusiveMaximum",
        "exclusiveMinimum",
        "title",
        "minLength",
        "maxLength",
        "additionalProperties",
        "$schema",
        "default",
    ] {
        obj.remove(key);
    }

    if obj.get("type").and_then(Value::as_str) == Some("string") {
        let should_remove = matches!(obj.get("format").and_then(Value::as_str), Some(format) if format != "enum" && format != "date-time");
        if should_remove {
            obj.remove("format");
        }
    }

    if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
        for prop in props.values_mut() {
            strip_google_fields(prop);
        }
    }

    if let Some(items) = obj.get_mut("items") {
        strip_google_fields(items);
    }
}

/// vLLM rejects a few additional fields its JSON-Schema-to-grammar compiler can't express, on top
/// of Google's restrictions (vLLM's schema support is a strict subset of Gemini's).
fn strip_vllm_fields(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else { return };

    for key in ["patternProperties", "if", "then", "else", "not"] {
        obj.remove(key);
    }

    if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
        for prop in props.values_mut() {
            strip_vllm_fields(prop);
        }
    }
    if let Some(items) = obj.get_mut("items") {
        strip_vllm_fields(items);
    }
}

/// OpenAI's `response_format: json_schema` / `text.format` strict mode requires every object
/// node in the schema to set `additionalProperties: false`, recursively.
fn enforce_openai_strict(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else { return };

    if obj.get("type").and_then(Value::as_str) == Some("object") || obj.contains_key("properties") {
        obj.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
        for prop in props.values_mut() {
            enforce_openai_strict(prop);
        }
    }
    if let Some(items) = obj.get_mut("items") {
        enforce_openai_strict(items);
    }
}
