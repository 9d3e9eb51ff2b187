mod args;
mod command;
mod http;
mod session;

use args::Args;
use clap::Parser;
use command::{CommandQueue, StaleSweeper};
use session::PresenceRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let presence = Arc::new(PresenceRegistry::new(args.liveness_policy()));
    let queue = Arc::new(CommandQueue::new(presence.clone(), args.max_queue_depth));

    let sweeper = StaleSweeper::new(queue.clone(), presence.clone(), args.sweep_config());
    let sweeper_handle = tokio::spawn(async move { sweeper.run().await });

    let app = http::router(http::AppState {
        queue: queue.clone(),
        presence: presence.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "command relay listening");
    info!(
        threshold_ms = presence.policy().threshold_ms,
        max_queue_depth = ?args.max_queue_depth,
        "liveness and queue limits"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper_handle.abort();

    // Pending commands are not persisted
    let dropped = queue.total_pending().await;
    if dropped > 0 {
        warn!(
            dropped,
            endpoints = queue.endpoint_count().await,
            "discarding undelivered commands"
        );
    }
    info!(known_endpoints = presence.count().await, "command relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    wait_for_ctrl_c().await;

    debug!("shutdown signal received");
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
