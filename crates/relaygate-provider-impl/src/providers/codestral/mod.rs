use relaygate_provider_core::{
    ChunkLog, DownstreamRequest, ProviderResult, ProviderSettings, RelayMode,
    SelectedCredential, UpstreamCtx, UpstreamHttpRequest, UpstreamPlan, UpstreamProvider,
    filter_request_headers,
};
use relaygate_transform::{JsonObject, RawBody, to_function_tools};
use serde_json::Value;

use crate::auth_extractor;
use crate::common::{
    SSE_ACCEPT, build_url, empty_user_messages, encode_body, has_field, require_api_key,
    resolve_base_url, sanitize_for_log, user_text_body,
};

const PROVIDER_NAME: &str = "codestral";
const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
const DEFAULT_MODEL: &str = "codestral-latest";
const LOG_CONTENT_CHARS: usize = 500;
const RESERVED_HEADERS: [&str; 3] = ["authorization", "accept", "content-type"];

/// Mistral Codestral chat completions, always streamed.
#[derive(Debug, Default)]
pub struct CodestralProvider;

impl CodestralProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for CodestralProvider {
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
        let url = build_url(
            resolve_base_url(settings, DEFAULT_BASE_URL)?,
            "/v1/chat/completions",
        );

        let mut headers = filter_request_headers(&req.headers, &RESERVED_HEADERS);
        auth_extractor::set_content_type_json(&mut headers);
        let api_key = require_api_key(PROVIDER_NAME, credential)?;
        auth_extractor::set_bearer(&mut headers, api_key);
        auth_extractor::set_accept(&mut headers, SSE_ACCEPT);

        let body = normalize_body(req.body, settings, &ctx.catalog.tools);

        Ok(UpstreamPlan {
            request: UpstreamHttpRequest {
                url,
                headers,
                body: Some(encode_body(&body)?),
                is_stream: true,
            },
            relay: RelayMode::Passthrough,
            chunk_log: ChunkLog::Off,
            log_body: sanitize_for_log(&body, LOG_CONTENT_CHARS),
        })
    }
}

fn normalize_body(raw: RawBody, settings: &ProviderSettings, default_tools: &Value) -> JsonObject {
    let mut body = raw.into_object(user_text_body);

    body.insert(
        "model".to_string(),
        Value::String(settings.model_or(DEFAULT_MODEL).to_string()),
    );
    if !has_field(&body, "messages") {
        body.insert("messages".to_string(), empty_user_messages());
    }
    if !has_field(&body, "tools") && settings.inject_defaults {
        body.insert(
            "tools".to_string(),
            Value::Array(to_function_tools(default_tools)),
        );
    }
    body.insert("stream".to_string(), Value::Bool(true));
    body
}

#[cfg(test)]
mod tests {
    use relaygate_transform::default_tools;
    use serde_json::json;

    use super::*;

    #[test]
    fn forces_model_and_stream() {
        let inbound = json!({"model": "other", "stream": false, "messages": [{"role": "user", "content": "x"}]});
        let body = normalize_body(
            RawBody::Json(inbound.as_object().unwrap().clone()),
            &ProviderSettings::default(),
            &default_tools(),
        );
        assert_eq!(body["model"], json!("codestral-latest"));
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["messages"], json!([{"role": "user", "content": "x"}]));
    }

    #[test]
    fn default_tools_are_flattened() {
        let body = normalize_body(RawBody::default(), &ProviderSettings::default(), &default_tools());
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 13);
        assert_eq!(tools[0]["type"], json!("function"));
        assert_eq!(tools[0]["function"]["name"], json!("read_file"));
    }

    #[test]
    fn configured_model_wins() {
        let settings = ProviderSettings {
            model: Some("codestral-2501".to_string()),
            ..ProviderSettings::default()
        };
        let body = normalize_body(RawBody::default(), &settings, &default_tools());
        assert_eq!(body["model"], json!("codestral-2501"));
    }
}
