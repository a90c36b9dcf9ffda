//! Observatory server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `OBSERVATORY_CONFIG` or
//!    `observatory-config.yaml` (defaults if neither exists)
//! 2. Initialize structured logging (tracing)
//! 3. Create the `PostgreSQL` pool (lazily connected)
//! 4. Build shared state and start the refresher and HTTP server
//! 5. Serve until `Ctrl-C`, then drain and exit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use observatory_core::config::{LogFormat, LoggingConfig, ObservatoryConfig};
use observatory_db::{DataSource, PostgresConfig, PostgresPool};
use observatory_server::refresher::spawn_refresher;
use observatory_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    info!(
        host = config.server.host,
        port = config.server.port,
        interval_ms = config.polling.interval_ms,
        llm_backend = ?config.llm.backend,
        "observatory starting"
    );

    let pool = PostgresPool::connect_lazy(&PostgresConfig::from_config(&config.database))
        .context("failed to configure database pool")?;
    let state = Arc::new(AppState::new(DataSource::Postgres(pool), &config));
    if state.admin.password.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("admin password is not configured; admin login is disabled");
    }

    let refresher = spawn_refresher(Arc::clone(&state));
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server_config, state, shutdown_signal())
        .await
        .context("server failed")?;

    refresher.abort();
    info!("observatory shutdown complete");
    Ok(())
}

/// Read the YAML config named by `OBSERVATORY_CONFIG`, falling back to
/// `observatory-config.yaml` in the working directory.
fn load_config() -> anyhow::Result<ObservatoryConfig> {
    let path = std::env::var_os("OBSERVATORY_CONFIG")
        .map_or_else(|| PathBuf::from("observatory-config.yaml"), PathBuf::from);
    if path.exists() {
        ObservatoryConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))
    } else {
        ObservatoryConfig::parse("").context("failed to apply environment overrides")
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
