use std::sync::Arc;

use anyhow::Context;
use auth_token::{http, shutdown, AppState, Config};
use rust_common::{init_tracing, TracingConfig};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    let tracing_config = TracingConfig::default()
        .with_service_name("auth-token-service")
        .with_log_level(config.log_level.clone())
        .with_json_output(config.log_json);
    init_tracing(&tracing_config).context("failed to initialise tracing")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        access_ttl = ?config.access_token_ttl,
        refresh_ttl = ?config.refresh_token_ttl,
        legacy_scheme = config.accept_legacy_scheme,
        "Starting Token Service"
    );

    let state = AppState::new(config.clone());
    if let Err(e) = state.keys().preload() {
        error!(error = %e, "Signing keys unavailable, refusing to start");
        return Err(e.into());
    }

    let app = http::router(Arc::new(state));
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    info!(address = %config.bind_address(), "Token Service listening");

    shutdown::serve_with_graceful_shutdown(listener, app, config.shutdown_timeout).await?;
    Ok(())
}
