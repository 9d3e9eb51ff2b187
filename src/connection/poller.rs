//! Poll loop with reconnection backoff

use crate::transport::CommandSource;
use homelink_shared::polling;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events emitted by the poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// First successful poll, or first after an outage
    Connected { source: &'static str },
    /// A poll failed after previously succeeding
    Disconnected { reason: String },
    /// A command token pulled from the relay
    Received(String),
}

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between polls while the queue is empty
    pub poll_interval: Duration,
    /// Reconnection delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay
    pub max_reconnect_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(polling::POLL_INTERVAL_MS),
            reconnect_delay: Duration::from_millis(polling::RECONNECT_DELAY_MS),
            max_reconnect_delay: Duration::from_millis(polling::MAX_RECONNECT_DELAY_MS),
        }
    }
}

/// Polls a command source in the background and reports what it sees
pub struct Poller {
    event_rx: mpsc::Receiver<PollEvent>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Create a poller and start the poll loop
    pub fn new(source: Arc<dyn CommandSource>, config: PollerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<PollEvent>(100);

        let task = tokio::spawn(async move {
            poll_loop(source, config, event_tx).await;
        });

        Self { event_rx, task }
    }

    /// Receive the next poll event
    pub async fn recv(&mut self) -> Option<PollEvent> {
        self.event_rx.recv().await
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Main poll loop with backoff
async fn poll_loop(
    source: Arc<dyn CommandSource>,
    config: PollerConfig,
    event_tx: mpsc::Sender<PollEvent>,
) {
    let mut connected = false;
    let mut reconnect_delay = config.reconnect_delay;

    loop {
        let wait = match source.poll().await {
            Ok(command) => {
                if !connected {
                    connected = true;
                    reconnect_delay = config.reconnect_delay;
                    let event = PollEvent::Connected {
                        source: source.name(),
                    };
                    if event_tx.send(event).await.is_err() {
                        return;
                    }
                }

                match command {
                    Some(token) => {
                        if event_tx.send(PollEvent::Received(token)).await.is_err() {
                            return;
                        }
                        // More may be queued behind it
                        None
                    }
                    None => Some(config.poll_interval),
                }
            }
            Err(e) => {
                if connected {
                    connected = false;
                    let event = PollEvent::Disconnected {
                        reason: e.to_string(),
                    };
                    if event_tx.send(event).await.is_err() {
                        return;
                    }
                } else {
                    warn!("Poll via {} failed: {}", source.name(), e);
                }

                let wait = reconnect_delay;
                // Exponential backoff
                reconnect_delay = std::cmp::min(reconnect_delay * 2, config.max_reconnect_delay);
                debug!("Retrying in {:?}", wait);
                Some(wait)
            }
        };

        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
        if event_tx.is_closed() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::timeout;

    /// Replays a fixed script of poll outcomes, then reports an empty queue
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Option<String>, String>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<&str>, &str>>) -> Arc<Self> {
            let script = script
                .into_iter()
                .map(|step| step.map(|c| c.map(String::from)).map_err(String::from))
                .collect();
            Arc::new(Self {
                script: Mutex::new(script),
            })
        }
    }

    #[async_trait]
    impl CommandSource for ScriptedSource {
        async fn poll(&self) -> Result<Option<String>> {
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Ok(command)) => Ok(command),
                Some(Err(reason)) => Err(anyhow!(reason)),
                None => Ok(None),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn fast_config() -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_millis(5),
            reconnect_delay: Duration::from_millis(1),
            max_reconnect_delay: Duration::from_millis(4),
        }
    }

    async fn next(poller: &mut Poller) -> PollEvent {
        timeout(Duration::from_secs(2), poller.recv())
            .await
            .expect("timed out waiting for event")
            .expect("poller closed")
    }

    #[tokio::test]
    async fn test_receives_commands_in_order() {
        let source = ScriptedSource::new(vec![
            Ok(Some("KITCHEN_LIGHT_ON")),
            Ok(Some("DOOR_UNLOCK")),
            Ok(None),
        ]);
        let mut poller = Poller::new(source, fast_config());

        assert_eq!(next(&mut poller).await, PollEvent::Connected { source: "scripted" });
        assert_eq!(next(&mut poller).await, PollEvent::Received("KITCHEN_LIGHT_ON".into()));
        assert_eq!(next(&mut poller).await, PollEvent::Received("DOOR_UNLOCK".into()));
    }

    #[tokio::test]
    async fn test_failures_before_first_success_are_silent() {
        let source = ScriptedSource::new(vec![
            Err("connection refused"),
            Err("connection refused"),
            Ok(Some("FAN_ON")),
        ]);
        let mut poller = Poller::new(source, fast_config());

        assert_eq!(next(&mut poller).await, PollEvent::Connected { source: "scripted" });
        assert_eq!(next(&mut poller).await, PollEvent::Received("FAN_ON".into()));
    }

    #[tokio::test]
    async fn test_reports_outage_and_recovery() {
        let source = ScriptedSource::new(vec![
            Ok(None),
            Err("relay down"),
            Err("relay down"),
            Ok(Some("LAMP_OFF")),
        ]);
        let mut poller = Poller::new(source, fast_config());

        assert_eq!(next(&mut poller).await, PollEvent::Connected { source: "scripted" });
        assert_eq!(
            next(&mut poller).await,
            PollEvent::Disconnected {
                reason: "relay down".into()
            }
        );
        assert_eq!(next(&mut poller).await, PollEvent::Connected { source: "scripted" });
        assert_eq!(next(&mut poller).await, PollEvent::Received("LAMP_OFF".into()));
    }
}
