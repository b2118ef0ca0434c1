use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use relaygate_protocol::EventPatch;
use relaygate_transform::{Catalog, RawBody};
use serde_json::Value;

use crate::credential::SelectedCredential;
use crate::headers::Headers;
use crate::settings::ProviderSettings;
use crate::ProviderResult;

/// Upstream response body. Dropping it closes the upstream connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamFailure>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamTransportErrorKind {
    Timeout,
    Connect,
    Dns,
    Tls,
    /// The body stream broke after the status line was received.
    Body,
    Other,
}

impl UpstreamTransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamTransportErrorKind::Timeout => "timeout",
            UpstreamTransportErrorKind::Connect => "connect",
            UpstreamTransportErrorKind::Dns => "dns",
            UpstreamTransportErrorKind::Tls => "tls",
            UpstreamTransportErrorKind::Body => "body",
            UpstreamTransportErrorKind::Other => "other",
        }
    }
}

/// Transport-level failure (no usable HTTP response, or a broken body).
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    pub kind: UpstreamTransportErrorKind,
    pub message: String,
}

impl UpstreamFailure {
    pub fn new(kind: UpstreamTransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream {} error: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for UpstreamFailure {}

/// Vendor calls are always `POST`.
#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub is_stream: bool,
}

pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: ByteStream,
}

impl fmt::Debug for UpstreamHttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamHttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// How a successful upstream body is handed to the client.
#[derive(Clone, Copy)]
pub enum RelayMode {
    /// Bytes are written exactly as received.
    Passthrough,
    /// Bytes are split into SSE frames, each `data:` payload patched.
    Reframe(EventPatch),
    /// The whole body is read and returned as one JSON document.
    BufferedJson,
}

impl fmt::Debug for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMode::Passthrough => f.write_str("Passthrough"),
            RelayMode::Reframe(_) => f.write_str("Reframe"),
            RelayMode::BufferedJson => f.write_str("BufferedJson"),
        }
    }
}

/// Debug logging of relayed chunks (or frames, in reframe mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLog {
    Off,
    First(usize),
    All,
}

impl ChunkLog {
    pub fn wants(&self, seen: usize) -> bool {
        match self {
            ChunkLog::Off => false,
            ChunkLog::First(limit) => seen < *limit,
            ChunkLog::All => true,
        }
    }
}

/// Everything the core needs to perform one vendor call.
#[derive(Debug, Clone)]
pub struct UpstreamPlan {
    pub request: UpstreamHttpRequest,
    pub relay: RelayMode,
    pub chunk_log: ChunkLog,
    /// Outgoing body with message content truncated, for logs only.
    pub log_body: Value,
}

/// Inbound `POST` as resolved by the router.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    /// Model named by the route path, when the route carries one.
    pub model: Option<String>,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: RawBody,
}

impl DownstreamRequest {
    pub fn post(headers: Headers, body: RawBody) -> Self {
        Self {
            model: None,
            query: Vec::new(),
            headers,
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamCtx {
    pub trace_id: String,
    pub provider: String,
    pub catalog: Arc<Catalog>,
}

#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Builds the vendor request for one inbound request.
    ///
    /// Takes the request by value: the body is moved into the vendor body.
    async fn build_request(
        &self,
        ctx: &UpstreamCtx,
        settings: &ProviderSettings,
        credential: &SelectedCredential,
        req: DownstreamRequest,
    ) -> ProviderResult<UpstreamPlan>;
}
