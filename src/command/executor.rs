//! Command executor - parses tokens and dispatches them to device handlers

use super::handlers::{self, Action, DeviceBank, HandlerContext};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command applied (or the device was already in the requested state)
    Completed { message: String },
    /// Command not understood or not valid for the device
    Rejected { message: String },
}

/// Split `KITCHEN_LIGHT_ON` into (`KITCHEN_LIGHT`, `ON`) at the last underscore
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    let (device, action) = token.rsplit_once('_')?;
    if device.trim().is_empty() || action.is_empty() {
        return None;
    }
    Some((device, action))
}

/// Executes commands pulled from the relay.
///
/// There is no acknowledgement channel; results are only logged.
pub struct CommandExecutor {
    devices: RwLock<DeviceBank>,
    executed: AtomicU64,
    rejected: AtomicU64,
}

impl CommandExecutor {
    /// Create an executor with no known devices
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(DeviceBank::new()),
            executed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Execute one command token
    pub async fn execute(&self, token: &str) -> CommandResult {
        info!("Executing command: {}", token);

        let result = match self.parse(token) {
            Ok(ctx) => {
                let mut bank = self.devices.write().await;
                match ctx.action {
                    Action::On | Action::Off | Action::Toggle => {
                        handlers::handle_switch(&ctx, &mut bank)
                    }
                    Action::Lock | Action::Unlock => handlers::handle_lock(&ctx, &mut bank),
                }
            }
            Err(result) => result,
        };

        match &result {
            CommandResult::Completed { message } => {
                self.executed.fetch_add(1, Ordering::Relaxed);
                info!("  Command completed: {}", message);
            }
            CommandResult::Rejected { message } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("  Command rejected: {}", message);
            }
        }

        result
    }

    fn parse(&self, token: &str) -> Result<HandlerContext, CommandResult> {
        let (device, word) = split_token(token).ok_or_else(|| CommandResult::Rejected {
            message: format!("Malformed command token: {:?}", token),
        })?;
        let action = Action::parse(word).ok_or_else(|| CommandResult::Rejected {
            message: format!("Unknown action {:?} for {}", word, device),
        })?;

        Ok(HandlerContext {
            device: device.to_string(),
            action,
        })
    }

    /// Current state of a device, if it has received a command
    #[cfg(test)]
    pub async fn device_state(&self, device: &str) -> Option<handlers::DeviceState> {
        self.devices.read().await.get(device)
    }

    /// (completed, rejected) counts since start
    pub fn stats(&self) -> (u64, u64) {
        (
            self.executed.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
        )
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
