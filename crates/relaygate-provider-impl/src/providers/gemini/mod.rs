use relaygate_provider_core::{
    ChunkLog, DownstreamRequest, ProviderError, ProviderResult, ProviderSettings, RelayMode,
    SelectedCredential, UpstreamCtx, UpstreamHttpRequest, UpstreamPlan, UpstreamProvider,
    filter_request_headers,
};
use relaygate_transform::{JsonObject, RawBody, is_flat_dialect, to_function_declarations};
use serde_json::{Value, json};

use crate::auth_extractor;
use crate::common::{build_url, encode_body, has_field, require_api_key, resolve_base_url};

const PROVIDER_NAME: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const KEY_PARAM: &str = "key";
const RESERVED_HEADERS: [&str; 3] = ["authorization", "x-goog-api-key", "content-type"];

/// Gemini `streamGenerateContent`: credential in the `key` query parameter,
/// native `contents` schema and wrapped tool declarations.
#[derive(Debug, Default)]
pub struct GeminiProvider;

impl GeminiProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for GeminiProvider {
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
        let model = req
            .model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| settings.model_or(DEFAULT_MODEL));

        let api_key = require_api_key(PROVIDER_NAME, credential)?;
        let query = query_with_key(&req.query, api_key)?;
        let url = build_url(
            resolve_base_url(settings, DEFAULT_BASE_URL)?,
            &format!("/v1beta/models/{model}:streamGenerateContent?{query}"),
        );

        let mut headers = filter_request_headers(&req.headers, &RESERVED_HEADERS);
        auth_extractor::set_content_type_json(&mut headers);

        let payload = normalize_body(req.body, settings, &ctx.catalog.tools);

        Ok(UpstreamPlan {
            request: UpstreamHttpRequest {
                url,
                headers,
                body: Some(encode_body(&payload)?),
                is_stream: true,
            },
            relay: RelayMode::Passthrough,
            chunk_log: ChunkLog::All,
            log_body: Value::Object(payload),
        })
    }
}

/// Inbound query with `key` set to the rotated credential, keeping the
/// position of an existing `key` parameter.
fn query_with_key(query: &[(String, String)], api_key: &str) -> ProviderResult<String> {
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(query.len() + 1);
    let mut replaced = false;
    for (name, value) in query {
        if name == KEY_PARAM {
            if !replaced {
                pairs.push((KEY_PARAM, api_key));
                replaced = true;
            }
            continue;
        }
        pairs.push((name.as_str(), value.as_str()));
    }
    if !replaced {
        pairs.push((KEY_PARAM, api_key));
    }
    serde_urlencoded::to_string(&pairs).map_err(|err| ProviderError::Other(err.to_string()))
}

fn normalize_body(raw: RawBody, settings: &ProviderSettings, default_tools: &Value) -> JsonObject {
    let mut body = if raw.is_blank() {
        JsonObject::new()
    } else {
        raw.into_object(|text| {
            let mut body = JsonObject::new();
            body.insert(
                "contents".to_string(),
                json!([{"role": "user", "parts": [{"text": text}]}]),
            );
            body
        })
    };

    if !has_field(&body, "contents") {
        body.insert(
            "contents".to_string(),
            json!([{"role": "user", "parts": [{"text": ""}]}]),
        );
    }

    let flat_tools = body
        .get("tools")
        .and_then(Value::as_array)
        .is_some_and(|tools| !tools.is_empty() && is_flat_dialect(tools));
    if flat_tools {
        let wrapped = body
            .get("tools")
            .map(to_function_declarations)
            .unwrap_or_default();
        body.insert("tools".to_string(), Value::Array(wrapped));
    } else if !has_field(&body, "tools") && settings.inject_defaults {
        body.insert("tools".to_string(), default_tools.clone());
    }

    body
}

#[cfg(test)]
mod tests {
    use relaygate_transform::default_tools;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn key_is_appended_or_replaced_in_place() {
        assert_eq!(
            query_with_key(&query(&[("alt", "sse")]), "k1").unwrap(),
            "alt=sse&key=k1"
        );
        assert_eq!(
            query_with_key(&query(&[("key", "client"), ("alt", "sse"), ("key", "again")]), "k 2")
                .unwrap(),
            "key=k+2&alt=sse"
        );
    }

    #[test]
    fn blank_body_gets_default_contents_and_tools() {
        let body = normalize_body(
            RawBody::Text("   ".to_string()),
            &ProviderSettings::default(),
            &default_tools(),
        );
        assert_eq!(body["contents"], json!([{"role": "user", "parts": [{"text": ""}]}]));
        assert_eq!(body["tools"], default_tools());
    }

    #[test]
    fn plain_text_becomes_user_part() {
        let body = normalize_body(
            RawBody::Text("hello".to_string()),
            &ProviderSettings::default(),
            &default_tools(),
        );
        assert_eq!(body["contents"], json!([{"role": "user", "parts": [{"text": "hello"}]}]));
    }

    #[test]
    fn caller_tools_are_kept_or_wrapped() {
        let native = json!({"contents": [], "tools": [{"googleSearch": {}}]});
        let body = normalize_body(
            RawBody::Json(native.as_object().unwrap().clone()),
            &ProviderSettings::default(),
            &default_tools(),
        );
        assert_eq!(body["tools"], json!([{"googleSearch": {}}]));

        let flat = json!({"tools": [{"type": "function", "function": {"name": "f"}}]});
        let body = normalize_body(
            RawBody::Json(flat.as_object().unwrap().clone()),
            &ProviderSettings::default(),
            &default_tools(),
        );
        assert_eq!(
            body["tools"],
            json!([{"functionDeclarations": [{"name": "f", "description": "", "parameters": {"type": "object", "properties": {}}}]}])
        );
    }

    #[test]
    fn defaults_can_be_disabled() {
        let settings = ProviderSettings {
            inject_defaults: false,
            ..ProviderSettings::default()
        };
        let body = normalize_body(RawBody::default(), &settings, &default_tools());
        assert!(body.get("tools").is_none());
    }
}
