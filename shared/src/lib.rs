//! HomeLink Shared Protocol Types
//!
//! This crate provides the wire types, endpoint identity, liveness policy and
//! AI-reply directive parser shared by the relay server and edge devices.

pub mod directive;
pub mod liveness;
pub mod protocol;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use directive::{parse_directives, Directive};
pub use liveness::{Liveness, LivenessPolicy};
pub use protocol::*;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Polling parameters for the system
pub mod polling {
    /// Expected interval between consumer polls
    pub const POLL_INTERVAL_MS: u64 = 2000;

    /// A consumer that has not polled for this long is offline (3 poll intervals)
    pub const ONLINE_THRESHOLD_MS: u64 = 3 * POLL_INTERVAL_MS;

    /// Initial backoff after a failed poll
    pub const RECONNECT_DELAY_MS: u64 = 1000;

    /// Maximum backoff between failed polls
    pub const MAX_RECONNECT_DELAY_MS: u64 = 30_000;
}

/// Identity of one logical command consumer: a (user, device) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointId {
    pub user: String,
    pub device: String,
}

impl EndpointId {
    /// Create an endpoint identity. Emptiness is checked at the protocol boundary.
    pub fn new(user: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            device: device.into(),
        }
    }

    /// Build an identity from optional request fields, rejecting missing or empty ones
    pub fn from_parts(user: Option<&str>, device: Option<&str>) -> Option<Self> {
        match (non_empty(user), non_empty(device)) {
            (Some(user), Some(device)) => Some(Self::new(user, device)),
            _ => None,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.device)
    }
}

/// `Some(s)` only when the field is present and non-empty
pub(crate) fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.is_empty())
}
