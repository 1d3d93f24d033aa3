//! Fichajes gateway entry point.

use std::time::Duration;

use anyhow::Context;
use axum::Router;
use fichajes_api::{AppState, router as api_router};
use fichajes_common::Config;
use fichajes_core::ReminderService;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Run a reminder sweep every `period`.
fn spawn_reminder_loop(reminders: ReminderService, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = reminders.sweep().await {
                tracing::error!(error = %e, "Reminder sweep failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fichajes=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fichajes gateway...");

    let config = Config::load().context("failed to load configuration")?;

    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    info!(data_dir = %config.storage.data_dir.display(), "Local stores ready");

    let state = AppState::from_config(&config)?;
    if config.dolibarr.admin_api_key.is_none() {
        tracing::warn!("No admin API key configured; registration and reminders are unavailable");
    }

    if let Some(secs) = config.cron.interval_secs.filter(|s| *s > 0) {
        info!(interval_secs = secs, "Starting in-process reminder sweeps");
        spawn_reminder_loop(state.reminders.clone(), Duration::from_secs(secs));
    }

    let app = Router::new()
        .nest("/api", api_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
