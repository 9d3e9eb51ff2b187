//! Command execution on the edge device
//!
//! This module handles:
//! - Splitting command tokens into device and action
//! - Dispatching to the switch or lock handler
//! - Tracking simulated device state

mod executor;
pub mod handlers;

pub use executor::{CommandExecutor, CommandResult};
