//! Background sweep for stale backlogs and silent consumers

use super::queue::{CommandQueue, StaleEntry};
use crate::session::PresenceRegistry;
use homelink_shared::{now_ms, EndpointId};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

/// Sweep cadence and thresholds
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub interval: Duration,
    /// Warn about endpoints whose oldest command has waited longer than this
    pub stale_after_ms: u64,
    /// Forget presence of endpoints silent for longer than this
    pub presence_retention_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            stale_after_ms: 60_000,
            presence_retention_ms: 24 * 60 * 60 * 1000,
        }
    }
}

/// Result of a single sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    pub stale: Vec<StaleEntry>,
    pub pruned: Vec<EndpointId>,
}

/// Periodically reports stale backlogs and prunes presence records.
/// Never removes or reorders pending commands.
pub struct StaleSweeper {
    queue: Arc<CommandQueue>,
    presence: Arc<PresenceRegistry>,
    config: SweepConfig,
}

impl StaleSweeper {
    pub fn new(
        queue: Arc<CommandQueue>,
        presence: Arc<PresenceRegistry>,
        config: SweepConfig,
    ) -> Self {
        Self {
            queue,
            presence,
            config,
        }
    }

    /// Start the sweep loop
    pub async fn run(&self) {
        let mut ticker = interval(self.config.interval);

        loop {
            ticker.tick().await;
            let report = self.sweep_at(now_ms()).await;
            debug!(
                stale = report.stale.len(),
                pruned = report.pruned.len(),
                "sweep finished"
            );
        }
    }

    /// Run one sweep as of `current_time_ms`
    pub async fn sweep_at(&self, current_time_ms: u64) -> SweepReport {
        let stale = self
            .queue
            .stale_entries(self.config.stale_after_ms, current_time_ms)
            .await;

        for entry in &stale {
            let liveness = self
                .presence
                .liveness_at(&entry.endpoint, current_time_ms)
                .await;
            warn!(
                endpoint = %entry.endpoint,
                pending = entry.pending,
                oldest_age_ms = entry.oldest_age_ms,
                ?liveness,
                "commands waiting for consumer"
            );
        }

        let pruned = self
            .presence
            .prune(current_time_ms, self.config.presence_retention_ms)
            .await;
        if !pruned.is_empty() {
            info!(count = pruned.len(), "forgot silent endpoints");
        }

        SweepReport { stale, pruned }
    }
}
