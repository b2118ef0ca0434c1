use std::sync::Arc;

use anyhow::Context;
use relaygate_common::{GlobalConfig, GlobalConfigPatch, parse_bool_loose};
use relaygate_core::{
    ProviderRuntime, ProxyEngine, UpstreamClient, UpstreamClientConfig, WreqUpstreamClient,
};
use relaygate_provider_core::{FailureRotation, ProviderRegistry, ProviderSettings};
use relaygate_provider_impl::register_builtin_providers;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{FileConfig, api_keys_env_name, resolve_api_keys};

pub(crate) struct Bootstrap {
    pub(crate) global: GlobalConfig,
    pub(crate) engine: Arc<ProxyEngine>,
}

pub(crate) fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let file = match args.config.as_deref() {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    // clap already applies CLI > ENV per field; overlay that on the file.
    let mut merged = file.global.clone();
    merged.overlay(cli_patch(&args)?);
    let global = merged.into_config();
    info!(
        event = "config_loaded",
        host = %global.host,
        port = global.port,
        proxy = %global.proxy.as_deref().unwrap_or(""),
        connect_timeout_secs = global.connect_timeout_secs,
        max_body_bytes = global.max_body_bytes,
        redact_sensitive = global.redact_sensitive
    );

    let base_dir = args.config.as_deref().and_then(|path| path.parent());
    let catalog = file.catalog.build(base_dir).context("load tool catalog")?;
    info!(event = "catalog_loaded", tools = catalog.tool_names().len());

    let client: Arc<dyn UpstreamClient> = Arc::new(
        WreqUpstreamClient::new(UpstreamClientConfig::from_global(&global))
            .context("build upstream http client")?,
    );

    let mut registry = ProviderRegistry::new();
    register_builtin_providers(&mut registry);
    if let Some(unknown) = file
        .providers
        .keys()
        .find(|name| registry.get(name).is_none())
    {
        anyhow::bail!(
            "unknown provider [providers.{unknown}]; expected one of {}",
            registry.names().join(", ")
        );
    }

    let mut engine = ProxyEngine::new(client, Arc::new(catalog), global.redact_sensitive);
    for name in registry.names() {
        let Some(provider) = registry.get(name) else {
            continue;
        };
        let section = file.providers.get(name).cloned().unwrap_or_default();
        let keys = resolve_api_keys(
            &section.api_keys,
            std::env::var(api_keys_env_name(name)).ok(),
        );
        let runtime = ProviderRuntime::new(provider, keys, section.settings);
        if runtime.rotator.is_empty() {
            warn!(
                event = "pool_empty",
                provider = %name,
                env = %api_keys_env_name(name),
                "requests to this provider will fail until credentials are configured"
            );
        } else {
            info!(
                event = "pool_ready",
                provider = %name,
                credentials = runtime.rotator.len(),
                selection = ?runtime.rotator.mode(),
                failure_rotation = ?runtime.settings.failure_rotation,
                failure_rotation_active = !runtime.settings.failure_rotation_is_inert()
            );
        }
        if warn_inert_rotation(&runtime.settings) {
            warn!(
                event = "failure_rotation_inert",
                provider = %name,
                "transport_and_status has no effect with round_robin selection; use selection = \"sticky\""
            );
        }
        engine.insert(runtime);
    }

    Ok(Bootstrap {
        global,
        engine: Arc::new(engine),
    })
}

/// Only an explicit opt-in is worth a warning; the default pairing is
/// reported through `pool_ready`.
fn warn_inert_rotation(settings: &ProviderSettings) -> bool {
    settings.failure_rotation_is_inert()
        && settings.failure_rotation == FailureRotation::TransportAndStatus
}

fn cli_patch(args: &CliArgs) -> anyhow::Result<GlobalConfigPatch> {
    Ok(GlobalConfigPatch {
        host: sanitize_optional_env_value(args.host.clone()),
        port: parse_env_number(args.port.clone(), "RELAYGATE_PORT")?,
        proxy: sanitize_optional_env_value(args.proxy.clone()),
        connect_timeout_secs: parse_env_number(
            args.connect_timeout_secs.clone(),
            "RELAYGATE_CONNECT_TIMEOUT_SECS",
        )?,
        max_body_bytes: parse_env_number(args.max_body_bytes.clone(), "RELAYGATE_MAX_BODY_BYTES")?,
        redact_sensitive: sanitize_optional_env_value(args.redact_sensitive.clone())
            .map(|raw| parse_bool_loose("RELAYGATE_REDACT_SENSITIVE", &raw))
            .transpose()?,
    })
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Unresolved `${VAR}` placeholders count as unset.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

fn parse_env_number<T>(value: Option<String>, env_name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<T>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            config: None,
            host: None,
            port: None,
            proxy: None,
            connect_timeout_secs: None,
            max_body_bytes: None,
            redact_sensitive: None,
        }
    }

    #[test]
    fn placeholders_count_as_unset() {
        assert_eq!(sanitize_optional_env_value(Some("${PORT}".to_string())), None);
        assert_eq!(sanitize_optional_env_value(Some("  ".to_string())), None);
        assert_eq!(
            sanitize_optional_env_value(Some(" 8080 ".to_string())).as_deref(),
            Some("8080")
        );
    }

    #[test]
    fn cli_values_are_parsed() {
        let patch = cli_patch(&CliArgs {
            port: Some("4000".to_string()),
            connect_timeout_secs: Some("5".to_string()),
            redact_sensitive: Some("off".to_string()),
            ..args()
        })
        .unwrap();
        assert_eq!(patch.port, Some(4000));
        assert_eq!(patch.connect_timeout_secs, Some(5));
        assert_eq!(patch.redact_sensitive, Some(false));
        assert_eq!(patch.host, None);
    }

    #[test]
    fn bad_port_is_reported() {
        let err = cli_patch(&CliArgs {
            port: Some("99999".to_string()),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("RELAYGATE_PORT"));
    }

    #[test]
    fn status_rotation_with_round_robin_is_flagged() {
        let mut settings = ProviderSettings::default();
        assert!(!warn_inert_rotation(&settings));

        settings.failure_rotation = FailureRotation::TransportAndStatus;
        assert!(warn_inert_rotation(&settings));

        settings.selection = relaygate_provider_core::SelectionMode::Sticky;
        assert!(!warn_inert_rotation(&settings));
    }

    #[test]
    fn cli_overrides_file_values() {
        let file = FileConfig::parse("[global]\nport = 5000\nhost = \"0.0.0.0\"\n").unwrap();
        let mut merged = file.global;
        merged.overlay(
            cli_patch(&CliArgs {
                port: Some("6000".to_string()),
                ..args()
            })
            .unwrap(),
        );
        let global = merged.into_config();
        assert_eq!(global.port, 6000);
        assert_eq!(global.host, "0.0.0.0");
    }
}
