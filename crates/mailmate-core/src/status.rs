//! Readiness client for the status indicator.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use mailmate_protocols::{CapabilityName, Message, MessagePort, TabId};

use crate::coordinator::RetryPolicy;

const LOAD_TIMEOUT_MESSAGE: &str =
    "Mail page is taking too long to load. Try refreshing the page.";

/// What the status indicator shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusIndicator {
    Ready(Vec<CapabilityName>),
    Loading,
    Error(String),
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusIndicator::Ready(capabilities) if capabilities.is_empty() => {
                write!(f, "Ready: no AI capabilities")
            }
            StatusIndicator::Ready(capabilities) => {
                let names: Vec<&str> = capabilities.iter().map(|c| c.as_str()).collect();
                write!(f, "Ready: {}", names.join(", "))
            }
            StatusIndicator::Loading => write!(f, "Loading..."),
            StatusIndicator::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Polls the coordination context for a tab's readiness.
pub struct StatusMonitor {
    port: Arc<dyn MessagePort>,
    policy: RetryPolicy,
}

impl StatusMonitor {
    pub fn new(port: Arc<dyn MessagePort>, policy: RetryPolicy) -> Self {
        Self { port, policy }
    }

    /// One readiness query.
    pub async fn check(&self, tab_id: TabId) -> StatusIndicator {
        match self.port.request(Message::CheckTabReady { tab_id }).await {
            Ok(Message::TabReadyStatus { ready: true, state }) => StatusIndicator::Ready(
                state
                    .and_then(|s| s.capabilities)
                    .map(|c| c.available())
                    .unwrap_or_default(),
            ),
            Ok(Message::TabReadyStatus { ready: false, .. }) => StatusIndicator::Loading,
            Ok(other) => StatusIndicator::Error(format!("Unexpected response: {}", other.kind())),
            Err(e) => StatusIndicator::Error(format!("Failed to reach extension: {}", e)),
        }
    }

    /// Query until ready, retrying while the tab is still loading.
    pub async fn wait_until_ready(&self, tab_id: TabId) -> StatusIndicator {
        let mut retries = 0;
        loop {
            match self.check(tab_id).await {
                StatusIndicator::Loading if retries < self.policy.max_retries => {
                    retries += 1;
                    debug!(tab_id = %tab_id, retry = retries, "Tab not ready yet");
                    tokio::time::sleep(self.policy.delay).await;
                }
                StatusIndicator::Loading => {
                    return StatusIndicator::Error(LOAD_TIMEOUT_MESSAGE.to_string());
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use mailmate_protocols::{CapabilityMap, MessageError, TabState, TabStateUpdate};

    use super::*;

    /// Reports "not ready" for the first `loading_for` queries.
    struct ScriptedPort {
        loading_for: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessagePort for ScriptedPort {
        async fn request(&self, message: Message) -> Result<Message, MessageError> {
            let Message::CheckTabReady { tab_id } = message else {
                return Ok(Message::Ack { success: false });
            };
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.loading_for {
                return Ok(Message::TabReadyStatus {
                    ready: false,
                    state: None,
                });
            }
            let mut state = TabState::new(tab_id);
            state.apply(&TabStateUpdate::initialized(CapabilityMap::with_available(&[
                CapabilityName::Summarizer,
            ])));
            Ok(Message::TabReadyStatus {
                ready: true,
                state: Some(state),
            })
        }

        async fn notify(&self, _message: Message) -> Result<(), MessageError> {
            Ok(())
        }
    }

    struct ClosedPort;

    #[async_trait]
    impl MessagePort for ClosedPort {
        async fn request(&self, _message: Message) -> Result<Message, MessageError> {
            Err(MessageError::NoReceiver("background".to_string()))
        }

        async fn notify(&self, _message: Message) -> Result<(), MessageError> {
            Err(MessageError::NoReceiver("background".to_string()))
        }
    }

    fn monitor(port: impl MessagePort + 'static) -> StatusMonitor {
        StatusMonitor::new(
            Arc::new(port),
            RetryPolicy {
                max_retries: 3,
                delay: Duration::from_secs(2),
            },
        )
    }

    fn scripted(loading_for: usize) -> ScriptedPort {
        ScriptedPort {
            loading_for,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_check_ready() {
        let status = monitor(scripted(0)).check(TabId(1)).await;
        assert_eq!(status, StatusIndicator::Ready(vec![CapabilityName::Summarizer]));
        assert_eq!(status.to_string(), "Ready: summarizer");
    }

    #[tokio::test]
    async fn test_check_loading() {
        let status = monitor(scripted(1)).check(TabId(1)).await;
        assert_eq!(status, StatusIndicator::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_retries() {
        let status = monitor(scripted(2)).wait_until_ready(TabId(1)).await;
        assert!(matches!(status, StatusIndicator::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_gives_up() {
        let status = monitor(scripted(10)).wait_until_ready(TabId(1)).await;
        assert_eq!(status, StatusIndicator::Error(LOAD_TIMEOUT_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_communication_failure_is_error() {
        let status = monitor(ClosedPort).wait_until_ready(TabId(1)).await;
        match status {
            StatusIndicator::Error(message) => assert!(message.contains("background")),
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
