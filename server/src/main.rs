//! Keepalive Server - Main Entry Point
//!
//! Runs the Telegram bot in the background and serves its status over HTTP.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use keepalive_server::{
    api,
    bot::{BotSupervisor, CommandBot, RestartPolicy},
    config::Config,
    keepalive::KeepAlive,
    observability,
};

fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    observability::init(&config);

    // One worker thread is enough for a free-tier instance
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        workers = config.workers,
        worker_connections = config.worker_connections,
        timeout_secs = config.worker_timeout,
        "Starting Keepalive Server"
    );

    // Initialize bot supervisor
    let runner = CommandBot::from_config(&config.bot).context("Invalid BOT_COMMAND")?;
    let supervisor = BotSupervisor::new(
        Arc::new(runner),
        RestartPolicy::from_config(&config.bot),
        Duration::from_secs(config.bot.stop_timeout),
    );

    if config.bot.autostart {
        supervisor.start().await?;
    } else {
        info!("Bot autostart disabled, waiting for POST /start");
    }

    // Initialize keep-alive pinger (optional)
    let shutdown = CancellationToken::new();
    let pinger = match &config.keepalive_url {
        Some(url) => {
            match KeepAlive::new(url, Duration::from_secs(config.keepalive_interval)) {
                Ok(pinger) => Some(pinger.spawn(shutdown.clone())),
                Err(e) => {
                    warn!("Keep-alive client initialization failed: {}. Pinger disabled.", e);
                    None
                }
            }
        }
        None => {
            info!("KEEPALIVE_URL not set, pinger disabled");
            None
        }
    };

    // Build application state and router
    let state = api::AppState::new(config.clone(), supervisor.clone());
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Received shutdown signal, cleaning up...");
    shutdown.cancel();
    if let Some(pinger) = pinger {
        pinger.await.ok();
    }
    supervisor.shutdown().await;

    info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM (sent by the hosting platform).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
