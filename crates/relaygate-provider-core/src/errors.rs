use std::error::Error;
use std::fmt;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure while turning an inbound request into a vendor call. Every variant
/// is local: the engine answers `500 {"error":"Proxy error"}` and nothing is
/// sent upstream.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// A `[providers.<name>]` setting cannot be used, e.g. a non-http `base_url`.
    InvalidConfig(String),
    /// The selected pool entry holds no usable key.
    MissingCredential(&'static str),
    /// The vendor body or query could not be encoded.
    Other(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::InvalidConfig(msg) => write!(f, "invalid provider config: {msg}"),
            ProviderError::MissingCredential(provider) => {
                write!(f, "blank api key selected for {provider}")
            }
            ProviderError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl Error for ProviderError {}
