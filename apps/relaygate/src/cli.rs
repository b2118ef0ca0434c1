use std::path::PathBuf;

use clap::Parser;

/// Every flag also reads its `RELAYGATE_*` environment variable; flags win.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "relaygate",
    version,
    about = "Streaming multi-provider LLM gateway"
)]
pub(crate) struct CliArgs {
    /// TOML config file with `[global]`, `[providers.<name>]` and `[catalog]`.
    #[arg(long, env = "RELAYGATE_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Bind host.
    #[arg(long, env = "RELAYGATE_HOST")]
    pub(crate) host: Option<String>,

    /// Bind port.
    #[arg(long, env = "RELAYGATE_PORT")]
    pub(crate) port: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "RELAYGATE_PROXY")]
    pub(crate) proxy: Option<String>,

    #[arg(long, env = "RELAYGATE_CONNECT_TIMEOUT_SECS")]
    pub(crate) connect_timeout_secs: Option<String>,

    #[arg(long, env = "RELAYGATE_MAX_BODY_BYTES")]
    pub(crate) max_body_bytes: Option<String>,

    /// Redact credentials in logged upstream requests.
    #[arg(long, env = "RELAYGATE_REDACT_SENSITIVE")]
    pub(crate) redact_sensitive: Option<String>,
}
