//! Connection management for pull-based command delivery
//!
//! This module handles:
//! - Polling the relay on a fixed schedule
//! - Draining a backlog without waiting between commands
//! - Exponential backoff while the relay is unreachable
//! - Reporting connectivity transitions

mod poller;

pub use poller::{PollEvent, Poller, PollerConfig};
