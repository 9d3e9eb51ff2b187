//! Command source abstraction for pluggable pull transports

use anyhow::Result;
use async_trait::async_trait;

/// Somewhere the device can pull its next command from
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Take the next pending command, `None` when nothing is queued
    async fn poll(&self) -> Result<Option<String>>;

    /// Human-readable name for this source
    fn name(&self) -> &'static str;
}
