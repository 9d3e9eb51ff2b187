//! Consumer liveness
//!
//! A consumer is online while its last poll is more recent than the policy's
//! threshold. All checks take the current time explicitly.

use crate::polling;

/// Liveness of one endpoint at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Never polled since the server started
    NeverSeen,
    /// Polled within the threshold
    Online { since_last_poll_ms: u64 },
    /// Last poll is older than the threshold
    Offline { since_last_poll_ms: u64 },
}

impl Liveness {
    pub fn is_online(&self) -> bool {
        matches!(self, Liveness::Online { .. })
    }
}

/// Threshold used to classify consumers as online or offline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    pub threshold_ms: u64,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self {
            threshold_ms: polling::ONLINE_THRESHOLD_MS,
        }
    }
}

impl LivenessPolicy {
    pub fn new(threshold_ms: u64) -> Self {
        Self { threshold_ms }
    }

    /// Classify an endpoint given its last poll timestamp and the current time
    pub fn classify(&self, last_poll_ms: Option<u64>, current_time_ms: u64) -> Liveness {
        let Some(last) = last_poll_ms else {
            return Liveness::NeverSeen;
        };
        // A clock step backwards counts as "just polled"
        let elapsed = current_time_ms.saturating_sub(last);
        if elapsed < self.threshold_ms {
            Liveness::Online {
                since_last_poll_ms: elapsed,
            }
        } else {
            Liveness::Offline {
                since_last_poll_ms: elapsed,
            }
        }
    }
}
