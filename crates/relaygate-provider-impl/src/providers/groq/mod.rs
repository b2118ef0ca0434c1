use relaygate_provider_core::{
    ChunkLog, DownstreamRequest, ProviderResult, ProviderSettings, RelayMode,
    SelectedCredential, UpstreamCtx, UpstreamHttpRequest, UpstreamPlan, UpstreamProvider,
    filter_request_headers,
};
use relaygate_protocol::json::truthy;
use relaygate_transform::{JsonObject, RawBody, to_function_tools};
use serde_json::Value;

use crate::auth_extractor;
use crate::common::{
    SSE_ACCEPT, build_url, empty_user_messages, encode_body, require_api_key,
    resolve_base_url, sanitize_for_log, user_text_body,
};

const PROVIDER_NAME: &str = "groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
const LOG_CONTENT_CHARS: usize = 200;
const RESERVED_HEADERS: [&str; 3] = ["authorization", "accept", "content-type"];

#[derive(Debug, Default)]
pub struct GroqProvider;

impl GroqProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for GroqProvider {
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
        auth_extractor::set_header(&mut headers, "Cache-Control", "no-cache");

        let body = normalize_body(req.body, settings, &ctx.catalog.tools);
        let is_stream = body.get("stream").and_then(Value::as_bool).unwrap_or(true);

        Ok(UpstreamPlan {
            request: UpstreamHttpRequest {
                url,
                headers,
                body: Some(encode_body(&body)?),
                is_stream,
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
    if !body.get("messages").is_some_and(Value::is_array) {
        body.insert("messages".to_string(), empty_user_messages());
    }

    let tools = match truthy(body.get("tools")) {
        Some(tools) => to_function_tools(tools),
        None if settings.inject_defaults => to_function_tools(default_tools),
        None => Vec::new(),
    };
    if tools.is_empty() {
        body.remove("tools");
    } else {
        body.insert("tools".to_string(), Value::Array(tools));
    }

    if !body.get("stream").is_some_and(Value::is_boolean) {
        body.insert("stream".to_string(), Value::Bool(true));
    }
    body
}
