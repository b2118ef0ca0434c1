use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },
}

/// Final, merged global configuration used by the running process.
///
/// Merge order: CLI > ENV > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Optional outbound proxy (for upstream egress).
    pub proxy: Option<String>,
    /// Connection establishment only. Streams themselves never time out.
    pub connect_timeout_secs: u64,
    pub max_body_bytes: usize,
    /// Whether to redact credentials in logged requests.
    pub redact_sensitive: bool,
}

impl GlobalConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfigPatch::default().into_config()
    }
}

/// Optional layer used for merging global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GlobalConfigPatch {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
    #[serde(default)]
    pub redact_sensitive: Option<bool>,
}

impl GlobalConfigPatch {
    /// Values present in `other` win.
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.max_body_bytes.is_some() {
            self.max_body_bytes = other.max_body_bytes;
        }
        if other.redact_sensitive.is_some() {
            self.redact_sensitive = other.redact_sensitive;
        }
    }

    pub fn into_config(self) -> GlobalConfig {
        GlobalConfig {
            host: self
                .host
                .filter(|host| !host.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            proxy: self
                .proxy
                .map(|proxy| proxy.trim().to_string())
                .filter(|proxy| !proxy.is_empty()),
            connect_timeout_secs: self
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_body_bytes: self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            redact_sensitive: self.redact_sensitive.unwrap_or(true),
        }
    }
}

impl From<GlobalConfig> for GlobalConfigPatch {
    fn from(value: GlobalConfig) -> Self {
        Self {
            host: Some(value.host),
            port: Some(value.port),
            proxy: value.proxy,
            connect_timeout_secs: Some(value.connect_timeout_secs),
            max_body_bytes: Some(value.max_body_bytes),
            redact_sensitive: Some(value.redact_sensitive),
        }
    }
}

/// Parses loose boolean spellings used in env vars (`1`, `true`, `yes`, `on`).
pub fn parse_bool_loose(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
