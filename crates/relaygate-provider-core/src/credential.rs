use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::settings::SelectionMode;

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyCredential {
    pub api_key: String,
}

impl fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("api_key", &"[redacted]")
            .finish()
    }
}

/// A credential handed out for one request, with its pool position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCredential {
    pub index: usize,
    pub credential: ApiKeyCredential,
}

impl SelectedCredential {
    pub fn api_key(&self) -> &str {
        &self.credential.api_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotatorError {
    Empty { provider: String },
}

impl fmt::Display for RotatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotatorError::Empty { provider } => {
                write!(f, "no credentials configured for provider {provider}")
            }
        }
    }
}

impl Error for RotatorError {}

/// Per-provider credential pool with a shared cursor.
///
/// The cursor is only ever replaced through a compare-and-swap, so it is
/// always a valid index and concurrent callers never observe the same
/// pre-advance value.
#[derive(Debug)]
pub struct CredentialRotator {
    provider: String,
    keys: Vec<ApiKeyCredential>,
    cursor: AtomicUsize,
    mode: SelectionMode,
}

impl CredentialRotator {
    pub fn new(
        provider: impl Into<String>,
        keys: impl IntoIterator<Item = String>,
        mode: SelectionMode,
    ) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|api_key| ApiKeyCredential { api_key })
            .collect();
        Self {
            provider: provider.into(),
            keys,
            cursor: AtomicUsize::new(0),
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Credential for the next request.
    pub fn next(&self) -> Result<SelectedCredential, RotatorError> {
        let len = self.keys.len();
        if len == 0 {
            return Err(RotatorError::Empty {
                provider: self.provider.clone(),
            });
        }
        let index = match self.mode {
            SelectionMode::Sticky => self.cursor.load(Ordering::Acquire),
            SelectionMode::RoundRobin => {
                match self
                    .cursor
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                        Some((cur + 1) % len)
                    }) {
                    Ok(prev) | Err(prev) => prev,
                }
            }
        };
        Ok(SelectedCredential {
            index,
            credential: self.keys[index].clone(),
        })
    }

    /// Moves the cursor off a credential that just failed.
    ///
    /// Only advances when the cursor still points at `failed`, so concurrent
    /// failures of the same credential move it once and a round-robin cursor
    /// that already moved on is left alone. Returns whether it advanced.
    pub fn advance_past(&self, failed: usize) -> bool {
        let len = self.keys.len();
        if len < 2 {
            return false;
        }
        self.cursor
            .compare_exchange(
                failed,
                (failed + 1) % len,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
