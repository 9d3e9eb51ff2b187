//! Per-endpoint FIFO command queue with at-most-once delivery

use crate::session::PresenceRegistry;
use homelink_shared::{now_ms, EndpointId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors returned by the command queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Missing user, device, or command")]
    InvalidRequest,

    #[error("Command queue full for {endpoint}")]
    QueueFull { endpoint: EndpointId, depth: usize },
}

/// A command waiting for its consumer to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Process-unique id, for log correlation only
    pub command_id: u64,
    pub token: String,
    pub endpoint: EndpointId,
    pub enqueued_at_ms: u64,
}

impl QueuedCommand {
    /// Time spent waiting in the queue
    pub fn age_ms(&self, current_time_ms: u64) -> u64 {
        current_time_ms.saturating_sub(self.enqueued_at_ms)
    }
}

/// Acknowledgement of a successful enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub command_id: u64,
    /// Pending commands for the endpoint, including this one
    pub depth: usize,
}

/// Snapshot of one endpoint's backlog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingSummary {
    pub pending: usize,
    pub oldest_age_ms: Option<u64>,
}

/// An endpoint whose oldest command has waited too long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleEntry {
    pub endpoint: EndpointId,
    pub pending: usize,
    pub oldest_age_ms: u64,
}

/// Holds pending commands for every endpoint until they are polled
pub struct CommandQueue {
    presence: Arc<PresenceRegistry>,
    command_id: AtomicU64,
    /// Maximum pending commands per endpoint (`None` = unbounded)
    max_depth: Option<usize>,
    /// Pending commands by endpoint. Never holds an empty queue.
    entries: RwLock<HashMap<EndpointId, VecDeque<QueuedCommand>>>,
}

impl CommandQueue {
    /// Create an empty command queue
    pub fn new(presence: Arc<PresenceRegistry>, max_depth: Option<usize>) -> Self {
        Self {
            presence,
            command_id: AtomicU64::new(0),
            max_depth,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the next command ID
    fn next_command_id(&self) -> u64 {
        self.command_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Append `token` to the endpoint's queue
    ///
    /// Either the command is appended or nothing changes.
    pub async fn enqueue(
        &self,
        endpoint: &EndpointId,
        token: impl Into<String>,
    ) -> Result<Enqueued, QueueError> {
        let mut acks = self.enqueue_batch(endpoint, vec![token.into()]).await?;
        acks.pop().ok_or(QueueError::InvalidRequest)
    }

    /// Append every token in order under one lock.
    ///
    /// All or nothing: if any token is empty or the batch would push the
    /// endpoint past the depth cap, nothing is queued.
    pub async fn enqueue_batch(
        &self,
        endpoint: &EndpointId,
        tokens: Vec<String>,
    ) -> Result<Vec<Enqueued>, QueueError> {
        if endpoint.user.is_empty()
            || endpoint.device.is_empty()
            || tokens.is_empty()
            || tokens.iter().any(String::is_empty)
        {
            return Err(QueueError::InvalidRequest);
        }

        let queued = {
            let mut entries = self.entries.write().await;
            let depth = entries.get(endpoint).map_or(0, VecDeque::len);
            if let Some(max) = self.max_depth {
                if depth + tokens.len() > max {
                    return Err(QueueError::QueueFull {
                        endpoint: endpoint.clone(),
                        depth,
                    });
                }
            }

            let enqueued_at_ms = now_ms();
            let queue = entries.entry(endpoint.clone()).or_default();
            let mut queued = Vec::with_capacity(tokens.len());
            for token in tokens {
                let command = QueuedCommand {
                    command_id: self.next_command_id(),
                    token,
                    endpoint: endpoint.clone(),
                    enqueued_at_ms,
                };
                queued.push((
                    Enqueued {
                        command_id: command.command_id,
                        depth: queue.len() + 1,
                    },
                    command.token.clone(),
                ));
                queue.push_back(command);
            }
            queued
        };

        for (ack, token) in &queued {
            info!(
                endpoint = %endpoint,
                command_id = ack.command_id,
                token = %token,
                depth = ack.depth,
                "queued command"
            );
        }

        Ok(queued.into_iter().map(|(ack, _)| ack).collect())
    }

    /// Remove and return the oldest pending command for `endpoint`
    ///
    /// Counts as a poll for liveness whether or not anything is returned.
    /// The command is gone once returned; it is never redelivered.
    pub async fn dequeue_one(&self, endpoint: &EndpointId) -> Option<QueuedCommand> {
        self.presence.record_poll(endpoint).await;

        let command = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(endpoint) {
                Some(queue) => {
                    let command = queue.pop_front();
                    if queue.is_empty() {
                        entries.remove(endpoint);
                    }
                    command
                }
                None => None,
            }
        };

        match &command {
            Some(cmd) => info!(
                endpoint = %cmd.endpoint,
                command_id = cmd.command_id,
                token = %cmd.token,
                waited_ms = cmd.age_ms(now_ms()),
                "delivered command"
            ),
            None => debug!(endpoint = %endpoint, "no command pending"),
        }

        command
    }

    /// Whether the endpoint's consumer has polled within the liveness threshold
    pub async fn is_online(&self, endpoint: &EndpointId) -> bool {
        self.presence.is_online(endpoint).await
    }

    /// Backlog of one endpoint at `current_time_ms`
    pub async fn pending_summary(
        &self,
        endpoint: &EndpointId,
        current_time_ms: u64,
    ) -> PendingSummary {
        let entries = self.entries.read().await;
        match entries.get(endpoint) {
            Some(queue) => PendingSummary {
                pending: queue.len(),
                oldest_age_ms: queue.front().map(|c| c.age_ms(current_time_ms)),
            },
            None => PendingSummary::default(),
        }
    }

    /// Endpoints whose oldest command is older than `max_age_ms`, oldest first
    pub async fn stale_entries(&self, max_age_ms: u64, current_time_ms: u64) -> Vec<StaleEntry> {
        let entries = self.entries.read().await;
        let mut stale: Vec<StaleEntry> = entries
            .iter()
            .filter_map(|(endpoint, queue)| {
                let oldest_age_ms = queue.front()?.age_ms(current_time_ms);
                (oldest_age_ms > max_age_ms).then(|| StaleEntry {
                    endpoint: endpoint.clone(),
                    pending: queue.len(),
                    oldest_age_ms,
                })
            })
            .collect();
        stale.sort_by(|a, b| b.oldest_age_ms.cmp(&a.oldest_age_ms));
        stale
    }

    /// Pending commands across all endpoints
    pub async fn total_pending(&self) -> usize {
        self.entries.read().await.values().map(VecDeque::len).sum()
    }

    /// Number of endpoints with at least one pending command
    pub async fn endpoint_count(&self) -> usize {
        self.entries.read().await.len()
    }
}
