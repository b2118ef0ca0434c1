use relaygate_protocol::cohere::patch_content_event;
use relaygate_protocol::json::{is_truthy, truthy};
use relaygate_provider_core::{
    ChunkLog, DownstreamRequest, Headers, ProviderResult, ProviderSettings,
    RelayMode, SelectedCredential, UpstreamCtx, UpstreamHttpRequest, UpstreamPlan,
    UpstreamProvider, filter_request_headers, header_get,
};
use relaygate_transform::{Catalog, JsonObject, RawBody, to_function_tools};
use serde_json::{Map, Value, json};

use crate::auth_extractor;
use crate::common::{
    build_url, encode_body, require_api_key, resolve_base_url, sanitize_for_log, user_text_body,
};

const PROVIDER_NAME: &str = "cohere";
const DEFAULT_BASE_URL: &str = "https://api.cohere.com";
const DEFAULT_MODEL: &str = "command-a-reasoning-08-2025";
const COHERE_VERSION: &str = "2024-10-22";
const SSE_ACCEPT_UTF8: &str = "text/event-stream; charset=utf-8";
const DEBUG_JSON_HEADER: &str = "x-debug-json";
const LOG_CONTENT_CHARS: usize = 500;
const LOG_FRAMES: usize = 10;
const RESERVED_HEADERS: [&str; 5] = [
    "authorization",
    "accept",
    "content-type",
    "cohere-version",
    DEBUG_JSON_HEADER,
];
const ALLOWED_ROLES: [&str; 4] = ["user", "assistant", "system", "tool"];

/// Cohere v2 chat: native content-block messages and an SSE stream whose
/// content events are patched in flight.
#[derive(Debug, Default)]
pub struct CohereProvider;

impl CohereProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for CohereProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn build_request(
        &self,
        ctx: &UpstreamCtx,
        settings: &ProviderSettings,
        credential: &SelectedCredential,
        req: DownstreamRequest,
    ) -> ProviderResult<UpstreamPlan> {
        let url = build_url(resolve_base_url(settings, DEFAULT_BASE_URL)?, "/v2/chat");
        let force_json = debug_json_requested(&req.headers);

        let mut headers = filter_request_headers(&req.headers, &RESERVED_HEADERS);
        auth_extractor::set_content_type_json(&mut headers);
        let api_key = require_api_key(PROVIDER_NAME, credential)?;
        auth_extractor::set_bearer(&mut headers, api_key);
        auth_extractor::set_accept(&mut headers, SSE_ACCEPT_UTF8);
        auth_extractor::set_header(&mut headers, "Cohere-Version", COHERE_VERSION);
        auth_extractor::set_header(&mut headers, "Cache-Control", "no-cache");

        let body = normalize_body(req.body, settings, &ctx.catalog, force_json);

        let relay = if force_json {
            RelayMode::BufferedJson
        } else {
            RelayMode::Reframe(patch_content_event)
        };

        Ok(UpstreamPlan {
            request: UpstreamHttpRequest {
                url,
                headers,
                body: Some(encode_body(&body)?),
                is_stream: !force_json,
            },
            relay,
            chunk_log: ChunkLog::First(LOG_FRAMES),
            log_body: sanitize_for_log(&body, LOG_CONTENT_CHARS),
        })
    }
}

fn debug_json_requested(headers: &Headers) -> bool {
    header_get(headers, DEBUG_JSON_HEADER)
        .map(str::trim)
        .is_some_and(|value| value == "1" || value == "true")
}

fn normalize_body(
    raw: RawBody,
    settings: &ProviderSettings,
    catalog: &Catalog,
    force_json: bool,
) -> JsonObject {
    let mut body = raw.into_object(user_text_body);

    body.insert(
        "model".to_string(),
        Value::String(settings.model_or(DEFAULT_MODEL).to_string()),
    );

    let mut messages: Vec<Value> = match body.remove("messages") {
        Some(Value::Array(messages)) => messages.into_iter().map(normalize_message).collect(),
        _ => vec![normalize_message(json!({"role": "user", "content": ""}))],
    };
    let has_system = messages
        .iter()
        .any(|message| message.get("role").and_then(Value::as_str) == Some("system"));
    if !has_system && settings.inject_defaults {
        messages.insert(
            0,
            json!({"role": "system", "content": [{"type": "text", "text": catalog.system_message}]}),
        );
    }
    body.insert("messages".to_string(), Value::Array(messages));

    let tools = match truthy(body.get("tools")) {
        Some(tools) => to_function_tools(tools),
        None if settings.inject_defaults => to_function_tools(&catalog.tools),
        None => Vec::new(),
    };
    if tools.is_empty() {
        body.remove("tools");
    } else {
        body.insert("tools".to_string(), Value::Array(tools));
    }

    body.remove("thinking");
    body.insert("stream".to_string(), Value::Bool(!force_json));
    body
}

fn normalize_role(role: Option<&Value>) -> &'static str {
    let role = role
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    ALLOWED_ROLES
        .iter()
        .copied()
        .find(|allowed| *allowed == role)
        .unwrap_or("user")
}

/// Allow-listed role and content as a list of typed blocks; other message
/// fields (`tool_call_id`, `tool_calls`, ...) are kept.
fn normalize_message(message: Value) -> Value {
    let mut message = match message {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let role = normalize_role(message.get("role"));
    let content = match message.remove("content") {
        Some(Value::Array(blocks)) => Value::Array(blocks.into_iter().map(text_block).collect()),
        Some(Value::String(text)) => json!([{"type": "text", "text": text}]),
        None | Some(Value::Null) => json!([{"type": "text", "text": ""}]),
        Some(other) => Value::Array(vec![other]),
    };
    message.insert("role".to_string(), Value::String(role.to_string()));
    message.insert("content".to_string(), content);
    Value::Object(message)
}

fn text_block(block: Value) -> Value {
    match block {
        Value::String(text) => json!({"type": "text", "text": text}),
        Value::Object(ref obj)
            if obj.get("text").is_some_and(is_truthy) && truthy(obj.get("type")).is_none() =>
        {
            json!({"type": "text", "text": obj.get("text").cloned().unwrap_or(Value::Null)})
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(inbound: Value) -> JsonObject {
        normalize_body(
            RawBody::Json(inbound.as_object().unwrap().clone()),
            &ProviderSettings::default(),
            &Catalog::default(),
            false,
        )
    }

    #[test]
    fn bogus_role_and_string_content() {
        let body = normalize(json!({"messages": [{"role": "bogus", "content": "hi"}]}));
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], json!("system"));
        assert_eq!(messages[1], json!({"role": "user", "content": [{"type": "text", "text": "hi"}]}));
    }

    #[test]
    fn roles_are_lowercased_before_allow_list() {
        assert_eq!(normalize_role(Some(&json!("ASSISTANT"))), "assistant");
        assert_eq!(normalize_role(Some(&json!("Tool"))), "tool");
        assert_eq!(normalize_role(Some(&json!("developer"))), "user");
        assert_eq!(normalize_role(Some(&json!(3))), "user");
        assert_eq!(normalize_role(None), "user");
    }

    #[test]
    fn content_shapes_are_coerced() {
        let message = normalize_message(json!({
            "role": "tool",
            "tool_call_id": "call_1",
            "content": ["a", {"text": "b", "extra": 1}, {"type": "document", "document": {}}, {"text": ""}]
        }));
        assert_eq!(
            message,
            json!({
                "role": "tool",
                "tool_call_id": "call_1",
                "content": [
                    {"type": "text", "text": "a"},
                    {"type": "text", "text": "b"},
                    {"type": "document", "document": {}},
                    {"text": ""}
                ]
            })
        );
        assert_eq!(
            normalize_message(json!({"role": "user"}))["content"],
            json!([{"type": "text", "text": ""}])
        );
        assert_eq!(
            normalize_message(json!({"role": "user", "content": 7}))["content"],
            json!([7])
        );
    }

    #[test]
    fn existing_system_message_is_not_duplicated() {
        let body = normalize(json!({"messages": [{"role": "SYSTEM", "content": "be terse"}, {"role": "user", "content": "q"}]}));
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], json!([{"type": "text", "text": "be terse"}]));
    }

    #[test]
    fn thinking_is_removed_and_tools_flattened() {
        let body = normalize(json!({"thinking": {"type": "enabled"}, "stream": false}));
        assert!(body.get("thinking").is_none());
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["tools"].as_array().unwrap().len(), 13);
    }

    #[test]
    fn debug_header_values() {
        let headers = |value: &str| vec![("X-Debug-Json".to_string(), value.to_string())];
        assert!(debug_json_requested(&headers("1")));
        assert!(debug_json_requested(&headers("true")));
        assert!(!debug_json_requested(&headers("yes")));
        assert!(!debug_json_requested(&Vec::new()));
    }
}
