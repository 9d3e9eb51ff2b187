//! Presence registry: last-poll timestamps per endpoint

use homelink_shared::{now_ms, EndpointId, Liveness, LivenessPolicy};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tracks when each consumer last polled
pub struct PresenceRegistry {
    policy: LivenessPolicy,
    /// Map of endpoint -> last poll (ms since epoch)
    last_poll: RwLock<HashMap<EndpointId, u64>>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new(policy: LivenessPolicy) -> Self {
        Self {
            policy,
            last_poll: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.policy
    }

    /// Record a poll from `endpoint` now
    pub async fn record_poll(&self, endpoint: &EndpointId) {
        self.record_poll_at(endpoint, now_ms()).await;
    }

    /// Record a poll from `endpoint` at `timestamp_ms`
    pub async fn record_poll_at(&self, endpoint: &EndpointId, timestamp_ms: u64) {
        let mut last_poll = self.last_poll.write().await;
        match last_poll.get_mut(endpoint) {
            Some(ts) => *ts = (*ts).max(timestamp_ms),
            None => {
                last_poll.insert(endpoint.clone(), timestamp_ms);
            }
        }
    }

    /// Last poll timestamp, if the endpoint has ever polled
    pub async fn last_seen(&self, endpoint: &EndpointId) -> Option<u64> {
        self.last_poll.read().await.get(endpoint).copied()
    }

    /// Liveness of `endpoint` at `current_time_ms`
    pub async fn liveness_at(&self, endpoint: &EndpointId, current_time_ms: u64) -> Liveness {
        let last = self.last_seen(endpoint).await;
        self.policy.classify(last, current_time_ms)
    }

    pub async fn is_online_at(&self, endpoint: &EndpointId, current_time_ms: u64) -> bool {
        self.liveness_at(endpoint, current_time_ms).await.is_online()
    }

    pub async fn is_online(&self, endpoint: &EndpointId) -> bool {
        self.is_online_at(endpoint, now_ms()).await
    }

    /// Endpoints that are online at `current_time_ms`
    pub async fn online_endpoints_at(&self, current_time_ms: u64) -> Vec<EndpointId> {
        let last_poll = self.last_poll.read().await;
        let mut online: Vec<EndpointId> = last_poll
            .iter()
            .filter(|(_, ts)| self.policy.classify(Some(**ts), current_time_ms).is_online())
            .map(|(id, _)| id.clone())
            .collect();
        online.sort();
        online
    }

    /// Forget endpoints that have not polled within `retention_ms` and return them
    pub async fn prune(&self, current_time_ms: u64, retention_ms: u64) -> Vec<EndpointId> {
        let mut last_poll = self.last_poll.write().await;
        let expired: Vec<EndpointId> = last_poll
            .iter()
            .filter(|(_, ts)| current_time_ms.saturating_sub(**ts) > retention_ms)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            last_poll.remove(id);
        }

        expired
    }

    /// Number of endpoints with a liveness record
    pub async fn count(&self) -> usize {
        self.last_poll.read().await.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new(LivenessPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esp32() -> EndpointId {
        EndpointId::new("ritwik", "esp32")
    }

    #[tokio::test]
    async fn test_offline_before_first_poll() {
        let presence = PresenceRegistry::new(LivenessPolicy::new(6000));
        assert!(!presence.is_online_at(&esp32(), 1_000).await);
        assert_eq!(presence.liveness_at(&esp32(), 1_000).await, Liveness::NeverSeen);
    }

    #[tokio::test]
    async fn test_online_after_poll_then_offline() {
        let presence = PresenceRegistry::new(LivenessPolicy::new(6000));
        presence.record_poll_at(&esp32(), 10_000).await;

        assert!(presence.is_online_at(&esp32(), 10_000).await);
        assert!(presence.is_online_at(&esp32(), 15_999).await);
        assert!(!presence.is_online_at(&esp32(), 16_000).await);
    }

    #[tokio::test]
    async fn test_out_of_order_poll_does_not_rewind() {
        let presence = PresenceRegistry::default();
        presence.record_poll_at(&esp32(), 20_000).await;
        presence.record_poll_at(&esp32(), 10_000).await;
        assert_eq!(presence.last_seen(&esp32()).await, Some(20_000));
    }

    #[tokio::test]
    async fn test_online_endpoints() {
        let presence = PresenceRegistry::new(LivenessPolicy::new(6000));
        let lamp = EndpointId::new("ritwik", "lamp");
        presence.record_poll_at(&esp32(), 1_000).await;
        presence.record_poll_at(&lamp, 9_000).await;

        assert_eq!(presence.online_endpoints_at(10_000).await, vec![lamp]);
    }

    #[tokio::test]
    async fn test_prune_forgets_old_records() {
        let presence = PresenceRegistry::default();
        let lamp = EndpointId::new("ritwik", "lamp");
        presence.record_poll_at(&esp32(), 1_000).await;
        presence.record_poll_at(&lamp, 50_000).await;

        let pruned = presence.prune(60_000, 30_000).await;
        assert_eq!(pruned, vec![esp32()]);
        assert_eq!(presence.count().await, 1);
        assert_eq!(presence.last_seen(&esp32()).await, None);
    }
}
