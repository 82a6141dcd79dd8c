//! Tick Cache - HTTP host for an in-process TTL cache
//!
//! Runs one cache on a single-threaded tokio runtime and serves it over a
//! small REST API. On shutdown the cache is ended gracefully, letting
//! pending TTLs drain before the process exits.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tick_cache::api::{create_router, AppState};
use tick_cache::{Cache, Config, TokioLoop};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the event loop and the cache, request start
/// 4. Mark the loop running, which completes a deferred start
/// 5. Serve the router until SIGINT/SIGTERM
/// 6. End the cache and wait for its TTLs to drain
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tick_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tick Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: tick_interval={:?}, shutdown={:?}, start={:?}, port={}",
        config.cache.tick_interval, config.cache.shutdown, config.cache.start, config.server_port
    );

    let event_loop = TokioLoop::current();
    let cache = Cache::new(event_loop.clone(), config.cache.clone());
    let starting = cache.start();
    event_loop.mark_running();
    starting.await.context("cache failed to start")?;
    info!("Cache started");

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            cache.report_error(format!("failed to bind {}: {}", addr, err));
            return Err(err).with_context(|| format!("failed to bind {}", addr));
        }
    };
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(
        "Ending cache, waiting for {} TTL(s) to drain",
        cache.active_ttl_count()
    );
    cache.end().await.context("cache failed to end")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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
