//! Per-context AI initialization state machine.
//!
//! `Uninitialized -> Probing -> {Ready | Unavailable}`, with a bounded
//! retry loop out of `Unavailable` and a navigation reset back to
//! `Uninitialized`. At most one probe sequence runs at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use mailmate_config::InitializationConfig;
use mailmate_protocols::{CapabilityMap, Message, MessageError, MessagePort};

use crate::registry::CapabilityRegistry;

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

/// Initialization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum InitState {
    Uninitialized = 0,
    Probing = 1,
    Ready = 2,
    Unavailable = 3,
}

impl From<u8> for InitState {
    fn from(v: u8) -> Self {
        match v {
            1 => InitState::Probing,
            2 => InitState::Ready,
            3 => InitState::Unavailable,
            _ => InitState::Uninitialized,
        }
    }
}

/// Result of asking the coordinator to start.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Ready(CapabilityMap),
    Unavailable,
    /// Another sequence is running; nothing was started.
    AlreadyInProgress,
}

/// Bounded retry with a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl From<&InitializationConfig> for RetryPolicy {
    fn from(config: &InitializationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&InitializationConfig::default())
    }
}

/// Where the coordinator publishes readiness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatePublisher: Send + Sync {
    async fn publish_ready(&self, capabilities: CapabilityMap) -> Result<(), MessageError>;

    async fn publish_reset(&self) -> Result<(), MessageError>;
}

/// Publishes to the coordination context over a message port.
pub struct PortPublisher {
    port: Arc<dyn MessagePort>,
}

impl PortPublisher {
    pub fn new(port: Arc<dyn MessagePort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl StatePublisher for PortPublisher {
    async fn publish_ready(&self, capabilities: CapabilityMap) -> Result<(), MessageError> {
        expect_ack(self.port.request(Message::AiInitialized { capabilities }).await?)
    }

    async fn publish_reset(&self) -> Result<(), MessageError> {
        expect_ack(self.port.request(Message::ResetAiState).await?)
    }
}

fn expect_ack(response: Message) -> Result<(), MessageError> {
    match response {
        Message::Ack { success: true } => Ok(()),
        Message::Ack { success: false } => Err(MessageError::UnexpectedResponse(
            "request rejected".to_string(),
        )),
        other => Err(MessageError::UnexpectedResponse(other.kind().to_string())),
    }
}

/// Snapshot for status queries and logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStatus {
    pub state: InitState,
    pub in_progress: bool,
    pub retry_count: u32,
    /// Probes run since creation.
    pub attempts: u32,
    pub capabilities: Option<CapabilityMap>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Ties registry readiness to published tab state.
pub struct InitializationCoordinator {
    registry: Arc<CapabilityRegistry>,
    publisher: Arc<dyn StatePublisher>,
    policy: RetryPolicy,
    state: AtomicU8,
    in_flight: AtomicBool,
    retry_count: AtomicU32,
    attempts: AtomicU32,
    generation: AtomicU64,
}

impl InitializationCoordinator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        publisher: Arc<dyn StatePublisher>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            publisher,
            policy,
            state: AtomicU8::new(InitState::Uninitialized as u8),
            in_flight: AtomicBool::new(false),
            retry_count: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> InitState {
        InitState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: InitState) {
        let previous = InitState::from(self.state.swap(state as u8, Ordering::SeqCst));
        if previous != state {
            debug!(from = ?previous, to = ?state, "Initialization state changed");
        }
    }

    pub fn in_progress(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            state: self.state(),
            in_progress: self.in_progress(),
            retry_count: self.retry_count.load(Ordering::SeqCst),
            attempts: self.attempts.load(Ordering::SeqCst),
            capabilities: self.registry.capabilities(),
        }
    }

    /// Answer a readiness query, starting initialization if none has run.
    pub async fn ensure_started(&self) -> StartOutcome {
        match self.state() {
            InitState::Ready => {
                StartOutcome::Ready(self.registry.capabilities().unwrap_or_default())
            }
            InitState::Uninitialized => self.start().await,
            InitState::Unavailable if !self.in_progress() => StartOutcome::Unavailable,
            _ => StartOutcome::AlreadyInProgress,
        }
    }

    /// Run a probe sequence unless one is already in flight.
    pub async fn start(&self) -> StartOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Initialization already in progress");
            return StartOutcome::AlreadyInProgress;
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.run_sequence().await
    }

    /// Reset the retry budget and start again.
    pub async fn refresh(&self) -> StartOutcome {
        info!("Refreshing AI capabilities");
        self.retry_count.store(0, Ordering::SeqCst);
        self.start().await
    }

    /// Drop all AI state after an in-page navigation.
    ///
    /// A sequence in flight notices the new generation and probes again.
    pub async fn reset_for_navigation(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, "Resetting AI state after navigation");

        self.retry_count.store(0, Ordering::SeqCst);
        self.registry.reset().await;
        self.set_state(InitState::Uninitialized);

        if let Err(e) = self.publisher.publish_reset().await {
            warn!(error = %e, "Failed to publish AI reset");
        }
    }

    async fn run_sequence(&self) -> StartOutcome {
        let mut generation = self.generation.load(Ordering::SeqCst);

        loop {
            self.set_state(InitState::Probing);
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(attempt, "Probing AI capabilities");

            let capabilities = self.registry.probe_all().await;

            let current = self.generation.load(Ordering::SeqCst);
            if current != generation {
                debug!(generation = current, "Navigation during probe, discarding result");
                generation = current;
                continue;
            }

            if capabilities.any_available() {
                self.retry_count.store(0, Ordering::SeqCst);
                self.set_state(InitState::Ready);
                info!(available = ?capabilities.available(), "AI capabilities ready");

                if let Err(e) = self.publisher.publish_ready(capabilities.clone()).await {
                    warn!(error = %e, "Failed to publish AI initialization");
                }
                return StartOutcome::Ready(capabilities);
            }

            self.set_state(InitState::Unavailable);
            let retries = self.retry_count.load(Ordering::SeqCst);
            if retries >= self.policy.max_retries {
                warn!(attempts = retries + 1, "No AI capabilities available, giving up");
                return StartOutcome::Unavailable;
            }

            self.retry_count.store(retries + 1, Ordering::SeqCst);
            info!(
                retry = retries + 1,
                max_retries = self.policy.max_retries,
                delay_ms = self.policy.delay.as_millis() as u64,
                "No AI capabilities available, retrying"
            );
            tokio::time::sleep(self.policy.delay).await;
            generation = self.generation.load(Ordering::SeqCst);
        }
    }
}
