use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use relaygate_core::{DownstreamBody, DownstreamResponse, ProxyEngine};
use relaygate_provider_core::{DownstreamRequest, Headers, is_hop_by_hop};
use relaygate_transform::RawBody;
use tracing::debug;

pub const REQUEST_ID_HEADER: &str = "x-relaygate-request-id";

const GEMINI_STREAM_ACTION: &str = "streamGenerateContent";

#[derive(Clone)]
pub struct ProxyState {
    pub engine: Arc<ProxyEngine>,
}

pub fn proxy_router(engine: Arc<ProxyEngine>, max_body_bytes: usize) -> Router {
    let state = ProxyState { engine };

    Router::new()
        // Gemini: model and action travel in the path.
        .route("/v1/models/{*target}", post(gemini_post))
        .route("/v1beta/models/{*target}", post(gemini_post))
        // OpenAI-chat compatible vendors
        .route("/codestral/v1/chat/completions", post(codestral_chat))
        .route("/groq/v1/chat/completions", post(groq_chat))
        // Cohere native v2 chat
        .route("/cohere/v2/chat", post(cohere_chat))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn gemini_post(
    State(state): State<ProxyState>,
    Path(target): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = target.trim_start_matches('/');
    let Some((model, action)) = target.split_once(':') else {
        return (StatusCode::NOT_FOUND, "unknown_gemini_action").into_response();
    };
    if action.trim() != GEMINI_STREAM_ACTION {
        debug!(event = "route_rejected", provider = "gemini", action = %action);
        return (StatusCode::NOT_FOUND, "unknown_gemini_action").into_response();
    }

    let mut req = downstream_request(&headers, body);
    req.model = Some(model.trim().to_string()).filter(|model| !model.is_empty());
    req.query = parse_query(query.as_deref());
    to_axum_response(state.engine.handle("gemini", req).await)
}

async fn codestral_chat(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = downstream_request(&headers, body);
    to_axum_response(state.engine.handle("codestral", req).await)
}

async fn groq_chat(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    let req = downstream_request(&headers, body);
    to_axum_response(state.engine.handle("groq", req).await)
}

async fn cohere_chat(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    let req = downstream_request(&headers, body);
    to_axum_response(state.engine.handle("cohere", req).await)
}

/// The body is resolved once, whatever the declared content type: a JSON
/// object becomes `Json`, anything else stays text.
fn downstream_request(headers: &HeaderMap, body: Bytes) -> DownstreamRequest {
    DownstreamRequest::post(headers_to_vec(headers), RawBody::from_bytes(&body))
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default()
}

fn to_axum_response(resp: DownstreamResponse) -> Response {
    let mut builder = Response::builder().status(resp.status);
    if let Some(h) = builder.headers_mut() {
        for (k, v) in &resp.headers {
            // Hyper sets framing itself.
            if is_hop_by_hop(k) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                h.append(name, value);
            }
        }
        if let Ok(value) = HeaderValue::from_str(&resp.request_id) {
            h.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
    }

    let body = match resp.body {
        DownstreamBody::Bytes(bytes) => Body::from(bytes),
        DownstreamBody::Stream(stream) => Body::from_stream(stream),
    };

    builder.body(body).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response()
    })
}

fn headers_to_vec(headers: &HeaderMap) -> Headers {
    let mut out: Headers = Vec::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            out.push((name.as_str().to_string(), v.to_string()));
        }
    }
    out
}
