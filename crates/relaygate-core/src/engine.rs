use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use relaygate_provider_core::{
    CredentialRotator, DownstreamRequest, Headers, ProviderSettings, RelayMode,
    SelectedCredential, UpstreamCtx, UpstreamHttpResponse, UpstreamProvider,
    filter_response_headers, header_get, header_set,
};
use relaygate_transform::Catalog;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProxyError;
use crate::redact::{redact_headers, redact_url, truncate_for_log};
use crate::relay::{
    DownstreamBody, DownstreamResponse, RelayOptions, RelayState, client_channel, collect_body,
    run_session,
};
use crate::upstream_client::UpstreamClient;

const UPSTREAM_ERROR_FALLBACK: &str = "Upstream error";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const JSON_UTF8: &str = "application/json; charset=utf-8";
const LOG_ERROR_BODY_CHARS: usize = 1000;

/// One configured provider: its request builder, credential pool and
/// settings.
pub struct ProviderRuntime {
    pub provider: Arc<dyn UpstreamProvider>,
    pub rotator: CredentialRotator,
    pub settings: ProviderSettings,
}

impl ProviderRuntime {
    pub fn new(
        provider: Arc<dyn UpstreamProvider>,
        keys: impl IntoIterator<Item = String>,
        settings: ProviderSettings,
    ) -> Self {
        let rotator = CredentialRotator::new(provider.name(), keys, settings.selection);
        Self {
            provider,
            rotator,
            settings,
        }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    /// Moves the pool off `failed` when the failure policy asks for it.
    fn rotate_after_failure(&self, trace_id: &str, failed: &SelectedCredential, reason: &str) {
        if self.rotator.advance_past(failed.index) {
            info!(
                event = "credential_rotated",
                trace_id = %trace_id,
                provider = %self.name(),
                failed_index = failed.index,
                cursor = self.rotator.cursor(),
                reason = %reason
            );
        }
    }
}

/// Provider Adapter composition: select credential, build the upstream
/// request, send it and hand the body to a relay session.
pub struct ProxyEngine {
    providers: HashMap<String, Arc<ProviderRuntime>>,
    client: Arc<dyn UpstreamClient>,
    catalog: Arc<Catalog>,
    redact: bool,
}

impl ProxyEngine {
    pub fn new(client: Arc<dyn UpstreamClient>, catalog: Arc<Catalog>, redact: bool) -> Self {
        Self {
            providers: HashMap::new(),
            client,
            catalog,
            redact,
        }
    }

    pub fn insert(&mut self, runtime: ProviderRuntime) {
        self.providers
            .insert(runtime.name().to_string(), Arc::new(runtime));
    }

    pub fn with_provider(mut self, runtime: ProviderRuntime) -> Self {
        self.insert(runtime);
        self
    }

    pub fn runtime(&self, name: &str) -> Option<&Arc<ProviderRuntime>> {
        self.providers.get(name)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn handle(&self, provider: &str, req: DownstreamRequest) -> DownstreamResponse {
        let trace_id = Uuid::new_v4().to_string();
        info!(
            event = "downstream_received",
            trace_id = %trace_id,
            provider = %provider,
            model = ?req.model,
            blank_body = req.body.is_blank()
        );

        let Some(runtime) = self.providers.get(provider).cloned() else {
            return ProxyError::not_found("unknown provider").into_response(trace_id);
        };

        let credential = match runtime.rotator.next() {
            Ok(credential) => credential,
            Err(err) => {
                warn!(
                    event = "credential_unavailable",
                    trace_id = %trace_id,
                    provider = %provider,
                    error = %err
                );
                return ProxyError::configuration(err.to_string()).into_response(trace_id);
            }
        };

        let ctx = UpstreamCtx {
            trace_id: trace_id.clone(),
            provider: provider.to_string(),
            catalog: self.catalog.clone(),
        };
        let plan = match runtime
            .provider
            .build_request(&ctx, &runtime.settings, &credential, req)
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(
                    event = "build_request_failed",
                    trace_id = %trace_id,
                    provider = %provider,
                    error = %err
                );
                return ProxyError::internal().into_response(trace_id);
            }
        };

        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            provider = %provider,
            credential_index = credential.index,
            url = %redact_url(&plan.request.url, self.redact),
            headers = ?redact_headers(&plan.request.headers, self.redact),
            is_stream = plan.request.is_stream,
            body = %plan.log_body
        );

        let policy = runtime.settings.failure_rotation;
        let response = match self.client.send(plan.request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    event = "upstream_send_failed",
                    trace_id = %trace_id,
                    provider = %provider,
                    kind = err.kind.as_str(),
                    error = %err.message
                );
                if policy.on_transport() {
                    runtime.rotate_after_failure(&trace_id, &credential, err.kind.as_str());
                }
                return ProxyError::internal().into_response(trace_id);
            }
        };

        if !(200..300).contains(&response.status) {
            if policy.on_status(response.status) {
                runtime.rotate_after_failure(&trace_id, &credential, "status");
            }
            return upstream_error_response(&trace_id, provider, response).await;
        }

        match plan.relay {
            RelayMode::BufferedJson => {
                let status = response.status;
                let (body, failure) = collect_body(response.body).await;
                if let Some(err) = failure {
                    warn!(
                        event = "upstream_stream_error",
                        trace_id = %trace_id,
                        provider = %provider,
                        kind = err.kind.as_str(),
                        error = %err.message
                    );
                    if policy.on_transport() {
                        runtime.rotate_after_failure(&trace_id, &credential, err.kind.as_str());
                    }
                    return ProxyError::internal().into_response(trace_id);
                }
                DownstreamResponse {
                    status,
                    headers: vec![("content-type".to_string(), JSON_UTF8.to_string())],
                    body: DownstreamBody::Bytes(json_or_raw(&body)),
                    request_id: trace_id,
                }
            }
            mode => {
                let UpstreamHttpResponse {
                    status,
                    headers,
                    body,
                } = response;
                let headers = relay_headers(&headers);
                let (sink, stream) = client_channel();
                let opts = RelayOptions {
                    trace_id: trace_id.clone(),
                    provider: provider.to_string(),
                    mode,
                    chunk_log: plan.chunk_log,
                };
                tokio::spawn(async move {
                    let summary = run_session(body, sink, &opts).await;
                    if summary.trigger == RelayState::UpstreamErrored && policy.on_transport() {
                        runtime.rotate_after_failure(&opts.trace_id, &credential, "stream");
                    }
                });
                DownstreamResponse {
                    status,
                    headers,
                    body: DownstreamBody::Stream(stream),
                    request_id: trace_id,
                }
            }
        }
    }
}

/// Forwards a non-success upstream status with its body as plain text.
async fn upstream_error_response(
    trace_id: &str,
    provider: &str,
    response: UpstreamHttpResponse,
) -> DownstreamResponse {
    let status = response.status;
    let (body, failure) = collect_body(response.body).await;
    let text = String::from_utf8_lossy(&body).into_owned();
    warn!(
        event = "upstream_error_status",
        trace_id = %trace_id,
        provider = %provider,
        status,
        body = %truncate_for_log(&text, LOG_ERROR_BODY_CHARS),
        read_error = ?failure.map(|err| err.message)
    );
    let body = if body.is_empty() {
        Bytes::from_static(UPSTREAM_ERROR_FALLBACK.as_bytes())
    } else {
        body
    };
    DownstreamResponse {
        status,
        headers: vec![("content-type".to_string(), TEXT_PLAIN_UTF8.to_string())],
        body: DownstreamBody::Bytes(body),
        request_id: trace_id.to_string(),
    }
}

fn relay_headers(upstream: &Headers) -> Headers {
    let mut headers = filter_response_headers(upstream);
    let is_sse = header_get(&headers, "content-type")
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("text/event-stream"));
    if is_sse && header_get(&headers, "x-accel-buffering").is_none() {
        header_set(&mut headers, "x-accel-buffering", "no");
    }
    headers
}

fn json_or_raw(body: &[u8]) -> Bytes {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Bytes::from(value.to_string()),
        Err(_) => Bytes::from(json!({"raw": String::from_utf8_lossy(body)}).to_string()),
    }
}
