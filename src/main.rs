//! Offline Proxy - An offline-first caching proxy
//!
//! Binary entry point: loads configuration, restores persisted tiers, runs
//! the install/activate lifecycle and serves the proxy.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_proxy::api::create_router;
use offline_proxy::control::lifecycle;
use offline_proxy::{spawn_flush_task, Config, ProxyContext};

/// Main entry point for the offline proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Restore persisted tiers and build the proxy context
/// 4. Install the current generation, activating it when skip-waiting is set
/// 5. Start background snapshot flush task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM with a final flush
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, version={}, port={}, quota={} bytes, flush_interval={}s",
        config.origin_url,
        config.cache_version,
        config.server_port,
        config.quota_bytes,
        config.flush_interval
    );

    let ctx = ProxyContext::open(&config)
        .await
        .context("failed to build proxy context")?;

    let primed = lifecycle::install(&ctx).await;
    info!("Install complete: {} shell resources primed", primed);
    if config.skip_waiting {
        let removed = lifecycle::activate(&ctx).await;
        info!("Activated, {} orphaned tiers removed", removed.len());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flush = config.cache_dir.clone().map(|dir| {
        let handle = spawn_flush_task(ctx.store.clone(), dir, config.flush_interval, shutdown_rx);
        info!("Background snapshot flush task started");
        handle
    });

    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The flush task writes whatever changed since its last run, then exits
    if let Some(handle) = flush {
        if shutdown_tx.send(true).is_err() {
            warn!("Flush task already gone");
        }
        if let Err(e) = handle.await {
            warn!("Flush task failed: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
