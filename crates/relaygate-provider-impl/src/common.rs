use bytes::Bytes;
use relaygate_protocol::json::truthy;
use relaygate_provider_core::{ProviderError, ProviderResult, ProviderSettings, SelectedCredential};
use relaygate_transform::JsonObject;
use serde_json::{Value, json};

pub const SSE_ACCEPT: &str = "text/event-stream";

/// Configured base URL, or `default`. Overrides must be http(s).
pub fn resolve_base_url<'a>(
    settings: &'a ProviderSettings,
    default: &'a str,
) -> ProviderResult<&'a str> {
    let base = settings.base_url_or(default);
    if base.starts_with("https://") || base.starts_with("http://") {
        Ok(base)
    } else {
        Err(ProviderError::InvalidConfig(format!(
            "base_url must be an http(s) URL, got {base:?}"
        )))
    }
}

pub fn require_api_key<'a>(
    provider: &'static str,
    credential: &'a SelectedCredential,
) -> ProviderResult<&'a str> {
    match credential.api_key().trim() {
        "" => Err(ProviderError::MissingCredential(provider)),
        key => Ok(key),
    }
}

pub fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut path = path.trim_start_matches('/');
    if base.ends_with("/v1") && (path == "v1" || path.starts_with("v1/")) {
        path = path.trim_start_matches("v1/").trim_start_matches("v1");
    }
    format!("{base}/{path}")
}

/// Body for a plain-text request: one user message holding the text.
pub fn user_text_body(text: String) -> JsonObject {
    let mut body = JsonObject::new();
    body.insert(
        "messages".to_string(),
        json!([{"role": "user", "content": text}]),
    );
    body
}

pub fn empty_user_messages() -> Value {
    json!([{"role": "user", "content": ""}])
}

pub fn has_field(body: &JsonObject, key: &str) -> bool {
    truthy(body.get(key)).is_some()
}

pub fn encode_body(body: &JsonObject) -> ProviderResult<Bytes> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|err| ProviderError::Other(err.to_string()))
}

/// Copy of `body` fit for logs: messages reduced to role plus content, with
/// string content cut to `limit` characters.
pub fn sanitize_for_log(body: &JsonObject, limit: usize) -> Value {
    let mut clone = body.clone();
    if let Some(Value::Array(messages)) = clone.get_mut("messages") {
        for message in messages.iter_mut() {
            let role = message.get("role").cloned().unwrap_or(Value::Null);
            let content = match message.get("content") {
                Some(Value::String(text)) => Value::String(text.chars().take(limit).collect()),
                Some(other) => other.clone(),
                None => Value::Null,
            };
            *message = json!({"role": role, "content": content});
        }
    }
    Value::Object(clone)
}
