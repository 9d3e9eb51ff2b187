//! Consumer presence tracking
//!
//! This module handles:
//! - Recording when each endpoint last polled
//! - Answering online/offline queries against the liveness threshold
//! - Forgetting endpoints that have been silent for a long time

mod presence;

pub use presence::PresenceRegistry;
