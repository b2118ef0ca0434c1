use bytes::Bytes;
use serde_json::json;

use crate::relay::{DownstreamBody, DownstreamResponse};

pub const PROXY_ERROR_MESSAGE: &str = "Proxy error";

/// Locally generated failure, rendered as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyError {
    pub status: u16,
    pub message: String,
}

impl ProxyError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }

    /// Misconfiguration detected before any upstream call.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: 500,
            message: PROXY_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn body(&self) -> Bytes {
        Bytes::from(json!({"error": self.message}).to_string())
    }

    pub fn into_response(self, request_id: String) -> DownstreamResponse {
        DownstreamResponse {
            status: self.status,
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: DownstreamBody::Bytes(self.body()),
            request_id,
        }
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ProxyError {}
