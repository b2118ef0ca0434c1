//! Provider abstractions for relaygate.
//!
//! This crate does not depend on axum or on a concrete HTTP client. Providers
//! turn a `DownstreamRequest` into an `UpstreamPlan`; the core crate performs
//! the IO and relays the response.

pub mod credential;
pub mod errors;
pub mod headers;
pub mod provider;
pub mod registry;
pub mod settings;

pub use credential::{ApiKeyCredential, CredentialRotator, RotatorError, SelectedCredential};
pub use errors::{ProviderError, ProviderResult};
pub use headers::{
    HOP_BY_HOP_HEADERS, Headers, filter_request_headers, filter_response_headers, header_get,
    header_set, is_hop_by_hop,
};
pub use provider::{
    ByteStream, ChunkLog, DownstreamRequest, RelayMode, UpstreamCtx,
    UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse, UpstreamPlan, UpstreamProvider,
    UpstreamTransportErrorKind,
};
pub use registry::ProviderRegistry;
pub use settings::{FailureRotation, ProviderSettings, SelectionMode};
