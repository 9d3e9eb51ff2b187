use clap::Parser;
use homelink_shared::{polling, LivenessPolicy};
use tokio::time::Duration;

use crate::command::SweepConfig;

/// Command line arguments for the relay server.
#[derive(Parser, Debug, Clone)]
#[command(name = "server", about = "Queues device commands for polling consumers")]
pub struct Args {
    /// Host interface to bind
    #[arg(long, env = "HOMELINK_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on
    #[arg(long, env = "HOMELINK_PORT", default_value_t = 3000)]
    pub port: u16,
    /// A consumer that has not polled for this long is reported offline
    #[arg(long, env = "HOMELINK_ONLINE_THRESHOLD_MS", default_value_t = polling::ONLINE_THRESHOLD_MS)]
    pub online_threshold_ms: u64,
    /// Maximum pending commands per endpoint (unbounded when unset)
    #[arg(long, env = "HOMELINK_MAX_QUEUE_DEPTH")]
    pub max_queue_depth: Option<usize>,
    /// Warn when an endpoint's oldest command has waited this long
    #[arg(long, env = "HOMELINK_STALE_AFTER_SECS", default_value_t = 60)]
    pub stale_after_secs: u64,
    #[arg(long, env = "HOMELINK_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    pub sweep_interval_secs: u64,
    /// Forget liveness of endpoints silent for this long
    #[arg(long, env = "HOMELINK_PRESENCE_RETENTION_SECS", default_value_t = 86_400)]
    pub presence_retention_secs: u64,
}

impl Args {
    pub fn liveness_policy(&self) -> LivenessPolicy {
        LivenessPolicy::new(self.online_threshold_ms)
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            // interval() panics on a zero period
            interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            stale_after_ms: self.stale_after_secs * 1000,
            presence_retention_ms: self.presence_retention_secs * 1000,
        }
    }
}
