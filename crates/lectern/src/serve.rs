// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lectern serve` command implementation.
//!
//! Opens SQLite storage, builds the payment and video provider clients and
//! the credential issuer, then serves the HTTP surface until SIGINT/SIGTERM.

use std::sync::Arc;

use lectern_access::CredentialIssuer;
use lectern_config::{ConfigError, LecternConfig};
use lectern_core::{LecternError, PluginAdapter, StorageAdapter, Stores};
use lectern_gateway::{AppState, build_router, start_server};
use lectern_payments::StripeClient;
use lectern_storage::SqliteStorage;
use lectern_video::MuxClient;
use tracing::{info, warn};

/// Runs the `lectern serve` command.
pub async fn run_serve(config: LecternConfig) -> Result<(), LecternError> {
    let missing = lectern_config::missing_secrets(&config);
    if !missing.is_empty() {
        let diagnostics: Vec<ConfigError> = missing
            .iter()
            .copied()
            .map(ConfigError::missing_secret)
            .collect();
        lectern_config::render_errors(&diagnostics);
        return Err(LecternError::Config(format!(
            "refusing to start without: {}",
            missing.join(", ")
        )));
    }

    init_tracing(&config.server.log_level);
    info!("starting lectern serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let stores = Stores::from_shared(storage.clone());

    let payments = Arc::new(StripeClient::from_config(&config.payments)?);
    let video = Arc::new(MuxClient::from_config(&config.video)?);
    let issuer = CredentialIssuer::from_config(&config)?;
    info!(
        storage = %storage.name(),
        payments = %payments.name(),
        video = %video.name(),
        "adapters initialized"
    );

    let state = AppState::new(&config, stores, payments, video, issuer)?;
    let router = build_router(state, &config.server.cors_origins);

    start_server(
        &config.server.host,
        config.server.port,
        router,
        shutdown_signal(),
    )
    .await?;

    storage.close().await?;
    info!("lectern serve shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lectern={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
