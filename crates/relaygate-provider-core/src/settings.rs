use serde::{Deserialize, Serialize};

/// How a provider picks the credential for each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Advance the cursor on every request.
    #[default]
    RoundRobin,
    /// Keep the current credential; only failures move the cursor.
    Sticky,
}

/// When a failure moves the credential cursor for later requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureRotation {
    /// Failed outbound call or mid-stream upstream error.
    #[default]
    Transport,
    /// As `Transport`, plus any forwarded non-success status.
    TransportAndStatus,
    Never,
}

impl FailureRotation {
    pub fn on_transport(self) -> bool {
        !matches!(self, FailureRotation::Never)
    }

    pub fn on_status(self, status: u16) -> bool {
        matches!(self, FailureRotation::TransportAndStatus) && !(200..300).contains(&status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub selection: SelectionMode,
    pub failure_rotation: FailureRotation,
    /// Inject the default tool catalog and system message when absent.
    pub inject_defaults: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            selection: SelectionMode::default(),
            failure_rotation: FailureRotation::default(),
            inject_defaults: true,
        }
    }
}

impl ProviderSettings {
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(default)
    }

    pub fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(default)
    }

    /// A round-robin cursor has already moved past the failed credential by
    /// the time the failure is seen, so `failure_rotation` has nothing to do.
    pub fn failure_rotation_is_inert(&self) -> bool {
        self.selection == SelectionMode::RoundRobin
            && self.failure_rotation != FailureRotation::Never
    }
}
