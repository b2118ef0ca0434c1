use anyhow::Context;
use clap::Parser;
use relaygate_router::proxy_router;
use tracing::info;

mod bootstrap;
mod cli;
mod config;

use crate::bootstrap::bootstrap;
use crate::cli::CliArgs;

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("relaygate failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let boot = bootstrap(CliArgs::parse())?;
    let app = proxy_router(boot.engine.clone(), boot.global.max_body_bytes);

    let bind = boot.global.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(
        event = "listening",
        addr = %bind,
        providers = ?boot.engine.provider_names()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    info!(event = "shutdown");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("relaygate=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(event = "shutdown_requested");
}
