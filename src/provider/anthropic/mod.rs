//! Anthropic Messages API adapter.

mod input;
mod output;

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::dialect;
use crate::error::Result;
use crate::gtm::{GenericStreamingResponse, ProviderFamily, StreamState};
use crate::message::Message;
use crate::provider::{BuildOptions, HttpMethod, HttpRequestDescriptor, ModelConfig, RawChunk};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub fn build_request(
    model_cfg: &ModelConfig,
    messages: &[Message],
    api_key: &str,
    options: &BuildOptions,
) -> Result<HttpRequestDescriptor> {
    let url = model_cfg
        .url
        .clone()
        .unwrap_or_else(|| "https://api.anthropic.com/v1/messages".to_string());

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".into(), "application/json".into());
    headers.insert("x-api-key".into(), api_key.to_string());
    headers.insert("anthropic-version".into(), ANTHROPIC_VERSION.to_string());

    let mut body = Map::new();
    body.insert("model".into(), Value::String(model_cfg.model_id.clone()));
    body.insert("messages".into(), Value::Array(input::messages_to_wire(messages)));
    body.insert("max_tokens".into(), json!(options.max_tokens_or_default()));
    body.insert("temperature".into(), json!(options.temperature_or_default()));
    body.insert("stream".into(), json!(options.stream_or_default()));

    if let Some(system) = input::extract_system(messages) {
        body.insert("system".into(), Value::String(system));
    }

    let mut tools = dialect::filter_for_target(ProviderFamily::Anthropic, options.tools.clone());

    // A requested response schema has no dedicated field in this dialect: it is installed as a
    // forced tool call, with `tool_choice` pinned to that tool's name.
    if let Some(schema) = &options.response_schema {
        let forced = crate::gtm::GenericTool {
            id: "json".into(),
            name: "json".into(),
            description: "Produce the final answer as a single JSON object matching the schema.".into(),
            parameters: schema.clone(),
            provider_hint: None,
            is_special: false,
            metadata: Map::new(),
        };
        tools.push(forced);
        body.insert(
            "tools".into(),
            json!(dialect::anthropic::tools_from_generic(&tools)),
        );
        body.insert("tool_choice".into(), json!({"type": "tool", "name": "json"}));
    } else if !tools.is_empty() {
        body.insert(
            "tools".into(),
            json!(dialect::anthropic::tools_from_generic(&tools)),
        );
        if let Some(choice) = &options.tool_choice {
            body.insert("tool_choice".into(), anthropic_tool_choice(choice));
        }
    }

    log::debug!(
        "anthropic build_request: model={} tools={} forced_schema={}",
        model_cfg.model_id,
        tools.len(),
        options.response_schema.is_some()
    );

    Ok(HttpRequestDescriptor {
        url,
        method: HttpMethod::Post,
        headers,
        body: Value::Object(body),
    })
}

fn anthropic_tool_choice(choice: &str) -> Value {
    match choice {
        "none" => json!({"type": "auto"}),
        "required" | "any" => json!({"type": "any"}),
        name => json!({"type": "tool", "name": name}),
    }
}

pub fn reduce_chunk(raw: &RawChunk, state: &mut StreamState) -> GenericStreamingResponse {
    output::reduce_chunk(raw, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ModelConfig {
        ModelConfig {
            id: "claude".into(),
            model_id: "claude-3-7-sonnet-20250219".into(),
            provider: crate::provider::ProviderKind::Anthropic,
            url: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn system_messages_are_hoisted_to_the_top_level_field() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let request = build_request(&cfg(), &messages, "key", &BuildOptions::default()).unwrap();
        assert_eq!(request.body["system"], "be terse");
        assert_eq!(request.body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn headers_use_anthropic_auth_scheme() {
        let request = build_request(&cfg(), &[Message::user("hi")], "sk-ant-test", &BuildOptions::default()).unwrap();
        assert_eq!(request.headers["x-api-key"], "sk-ant-test");
        assert_eq!(request.headers["anthropic-version"], ANTHROPIC_VERSION);
        assert!(!request.headers.contains_key("Authorization"));
    }

    #[test]
    fn response_schema_installs_a_forced_json_tool() {
        let mut options = BuildOptions::default();
        options.response_schema = Some(json!({"type": "object"}));
        let request = build_request(&cfg(), &[Message::user("hi")], "key", &options).unwrap();
        assert_eq!(request.body["tool_choice"], json!({"type": "tool", "name": "json"}));
        assert_eq!(request.body["tools"][0]["name"], "json");
    }

    #[test]
    fn full_request_body_for_a_tool_calling_request() {
        let mut options = BuildOptions::default();
        options.stream = Some(false);
        options.tools = vec![crate::gtm::GenericTool {
            id: "get_weather".into(),
            name: "get_weather".into(),
            description: "Look up the current weather for a city.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
            provider_hint: None,
            is_special: false,
            metadata: Map::new(),
        }];

        let messages = vec![Message::system("be terse"), Message::user("weather in Lisbon?")];
        let request = build_request(&cfg(), &messages, "sk-ant-test", &options).unwrap();

        insta::assert_json_snapshot!(request.body, @r#"
        {
          "max_tokens": 1024,
          "messages": [
            {
              "content": [
                {
                  "text": "weather in Lisbon?",
                  "type": "text"
                }
              ],
              "role": "user"
            }
          ],
          "model": "claude-3-7-sonnet-20250219",
          "stream": false,
          "system": "be terse",
          "temperature": 0.7,
          "tools": [
            {
              "description": "Look up the current weather for a city.",
              "input_schema": {
                "properties": {
                  "city": {
                    "type": "string"
                  }
                },
                "required": [
                  "city"
                ],
                "type": "object"
              },
              "name": "get_weather"
            }
          ]
        }
        "#);
    }
}
