pub mod engine;
pub mod error;
pub mod redact;
pub mod relay;
pub mod upstream_client;

pub use engine::{ProviderRuntime, ProxyEngine};
pub use error::ProxyError;
pub use relay::{
    ClientStream, DownstreamBody, DownstreamResponse, RelayOptions, RelaySink, RelayState,
    RelaySummary, client_channel, collect_body, run_session,
};
pub use upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};
