use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use wreq::{Client, Proxy};

use relaygate_common::GlobalConfig;
use relaygate_provider_core::{
    ByteStream, Headers, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};

/// Performs one vendor call. The response body is always a live stream;
/// dropping it closes the connection.
pub trait UpstreamClient: Send + Sync {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>;
}

/// Only connection establishment is bounded; a relay session runs until the
/// stream ends, errors or the client leaves.
#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
}

impl UpstreamClientConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            proxy: normalize_proxy(global.proxy.clone()),
            connect_timeout: Duration::from_secs(global.connect_timeout_secs),
        }
    }
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self::from_global(&GlobalConfig::default())
    }
}

#[derive(Clone)]
pub struct WreqUpstreamClient {
    client: Client,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(proxy) = normalize_proxy(config.proxy) {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

fn normalize_proxy(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut builder = self.client.post(&req.url);

            for (k, v) in &req.headers {
                builder = builder.header(k, v);
            }

            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await.map_err(map_wreq_error)?;
            let status = resp.status().as_u16();
            let headers = headers_from_wreq(resp.headers());
            let body: ByteStream = Box::pin(resp.bytes_stream().map(|item| {
                item.map_err(|err| {
                    UpstreamFailure::new(UpstreamTransportErrorKind::Body, err.to_string())
                })
            }));
            Ok(UpstreamHttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn headers_from_wreq(map: &wreq::header::HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|s| (k.as_str().to_string(), s.to_string()))
        })
        .collect()
}

fn map_wreq_error(err: wreq::Error) -> UpstreamFailure {
    UpstreamFailure::new(classify_wreq_error(&err), err.to_string())
}

fn classify_wreq_error(err: &wreq::Error) -> UpstreamTransportErrorKind {
    let message = err.to_string().to_ascii_lowercase();
    if err.is_timeout() {
        return UpstreamTransportErrorKind::Timeout;
    }
    if err.is_connect() {
        if message.contains("dns") || message.contains("resolve") {
            return UpstreamTransportErrorKind::Dns;
        }
        if message.contains("tls") || message.contains("ssl") {
            return UpstreamTransportErrorKind::Tls;
        }
        return UpstreamTransportErrorKind::Connect;
    }
    if err.is_connection_reset() {
        return UpstreamTransportErrorKind::Connect;
    }
    if message.contains("tls") || message.contains("ssl") {
        return UpstreamTransportErrorKind::Tls;
    }
    UpstreamTransportErrorKind::Other
}
