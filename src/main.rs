mod command;
mod connection;
mod transport;

use clap::Parser;
use command::CommandExecutor;
use connection::{PollEvent, Poller, PollerConfig};
use homelink_shared::{polling, EndpointId};
use std::sync::Arc;
use std::time::Duration;
use transport::{HttpCommandSource, HttpSourceConfig};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Polls the HomeLink relay and drives local switches and locks.
#[derive(Parser, Debug)]
struct Args {
    /// Relay base URL
    #[arg(long, env = "HOMELINK_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,
    #[arg(long, env = "HOMELINK_USER", default_value = "ritwik")]
    user: String,
    #[arg(long, env = "HOMELINK_DEVICE", default_value = "esp32")]
    device: String,
    /// Delay between polls while nothing is queued
    #[arg(long, env = "HOMELINK_POLL_INTERVAL_MS", default_value_t = polling::POLL_INTERVAL_MS)]
    poll_interval_ms: u64,
}

impl Args {
    fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            // Zero would poll the relay in a tight loop
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let poller_config = args.poller_config();
    let endpoint = EndpointId::new(args.user, args.device);
    if endpoint.user.is_empty() || endpoint.device.is_empty() {
        anyhow::bail!("--user and --device must not be empty");
    }

    info!("Edge device starting: {}", endpoint);
    info!("  Relay: {}", args.server);

    let source = HttpCommandSource::new(HttpSourceConfig {
        server_url: args.server,
        endpoint,
        ..Default::default()
    })?;

    let mut poller = Poller::new(Arc::new(source), poller_config);
    let executor = CommandExecutor::new();

    // Main event loop
    loop {
        tokio::select! {
            event = poller.recv() => match event {
                Some(PollEvent::Connected { source }) => {
                    info!("Connected to relay via {}", source);
                }
                Some(PollEvent::Disconnected { reason }) => {
                    warn!("Lost relay: {}", reason);
                }
                Some(PollEvent::Received(token)) => {
                    executor.execute(&token).await;
                }
                None => {
                    error!("Poller closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    let (completed, rejected) = executor.stats();
    info!(completed, rejected, "Edge device stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval() {
        let args = Args::parse_from(["edge-device"]);
        assert_eq!(
            args.poller_config().poll_interval,
            Duration::from_millis(polling::POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_poll_interval_is_never_zero() {
        let args = Args::parse_from(["edge-device", "--poll-interval-ms", "0"]);
        assert_eq!(args.poller_config().poll_interval, Duration::from_millis(1));
    }
}
