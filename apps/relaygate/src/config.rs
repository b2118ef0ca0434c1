use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use relaygate_common::GlobalConfigPatch;
use relaygate_provider_core::ProviderSettings;
use relaygate_transform::Catalog;
use serde::Deserialize;
use serde_json::Value;

/// On-disk configuration. Every table is optional.
///
/// ```toml
/// [global]
/// port = 3000
///
/// [providers.cohere]
/// api_keys = ["co-1", "co-2"]
/// selection = "round_robin"
///
/// [catalog]
/// tools_file = "tools.json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    pub(crate) global: GlobalConfigPatch,
    pub(crate) providers: BTreeMap<String, ProviderFileConfig>,
    pub(crate) catalog: CatalogFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProviderFileConfig {
    #[serde(default)]
    pub(crate) api_keys: Vec<String>,
    #[serde(flatten)]
    pub(crate) settings: ProviderSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CatalogFileConfig {
    pub(crate) system_message: Option<String>,
    /// JSON tool list in the wrapped `functionDeclarations` dialect.
    pub(crate) tools_file: Option<PathBuf>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config file {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

impl CatalogFileConfig {
    /// `base_dir` anchors a relative `tools_file`.
    pub(crate) fn build(&self, base_dir: Option<&Path>) -> anyhow::Result<Catalog> {
        let tools = match &self.tools_file {
            Some(path) => {
                let path = match base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("read tools file {}", path.display()))?;
                let tools: Value = serde_json::from_str(&text)
                    .with_context(|| format!("parse tools file {}", path.display()))?;
                if !tools.is_array() {
                    anyhow::bail!("tools file {} must hold a JSON list", path.display());
                }
                Some(tools)
            }
            None => None,
        };
        Ok(Catalog::with_overrides(self.system_message.clone(), tools))
    }
}

pub(crate) fn api_keys_env_name(provider: &str) -> String {
    format!("RELAYGATE_{}_API_KEYS", provider.to_ascii_uppercase())
}

/// A comma separated env list replaces the file list.
pub(crate) fn resolve_api_keys(
    file_keys: &[String],
    env_value: Option<String>,
) -> Vec<String> {
    match env_value.filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect(),
        None => file_keys.to_vec(),
    }
}
