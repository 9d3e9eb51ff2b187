//! Command queueing for polling consumers
//!
//! This module handles:
//! - Queuing commands per (user, device) endpoint in submission order
//! - Handing out each command exactly once when the consumer polls
//! - Reporting backlogs that have waited too long

mod queue;
mod sweeper;

pub use queue::{CommandQueue, QueueError};
pub use sweeper::{StaleSweeper, SweepConfig};
