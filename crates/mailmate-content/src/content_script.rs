//! The content context of one mail tab.
//!
//! Owns the page, the observer and the dispatcher, answers runtime
//! messages, and resets AI state when the page navigates in place.

use std::sync::Arc;
use std::time::Duration;

use mailmate_config::Config;
use mailmate_core::{
    CapabilityDefaults, CapabilityRegistry, ContextInbox, Envelope, InitState,
    InitializationCoordinator, PortPublisher, RetryPolicy, StartOutcome,
};
use mailmate_protocols::{ActionError, CapabilityProvider, Message, MessagePort, TabId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::actions::ActionId;
use crate::dispatcher::{SurfaceContext, ToolActionDispatcher};
use crate::dom::{NodeId, SharedDocument};
use crate::injector::{TOOL_ID_ATTR, ToolInjector};
use crate::observer::{DomObserverEngine, ScanReport};
use crate::strategy::{ExtractionStrategy, GmailStrategy};

/// How often the run loop drains the document's mutation queue.
pub const MUTATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ContentScript {
    tab_id: TabId,
    document: SharedDocument,
    config: Arc<Config>,
    coordinator: Arc<InitializationCoordinator>,
    observer: DomObserverEngine,
    injector: Arc<ToolInjector>,
    dispatcher: Arc<ToolActionDispatcher>,
    background: Arc<dyn MessagePort>,
    last_url: Mutex<String>,
}

impl ContentScript {
    /// Wire a content context for `tab_id`.
    ///
    /// `background` must send as this tab so the coordinator can attribute
    /// state updates. Without a provider every capability is unavailable.
    pub fn new(
        tab_id: TabId,
        document: SharedDocument,
        config: Arc<Config>,
        provider: Option<Arc<dyn CapabilityProvider>>,
        background: Arc<dyn MessagePort>,
    ) -> Self {
        let strategy: Arc<dyn ExtractionStrategy> = Arc::new(GmailStrategy::new());
        Self::with_strategy(tab_id, document, config, provider, background, strategy)
    }

    pub fn with_strategy(
        tab_id: TabId,
        document: SharedDocument,
        config: Arc<Config>,
        provider: Option<Arc<dyn CapabilityProvider>>,
        background: Arc<dyn MessagePort>,
        strategy: Arc<dyn ExtractionStrategy>,
    ) -> Self {
        let defaults = CapabilityDefaults::new(config.capabilities.clone());
        let registry = Arc::new(match provider {
            Some(provider) => CapabilityRegistry::new(provider, defaults),
            None => CapabilityRegistry::without_provider(defaults),
        });
        let coordinator = Arc::new(InitializationCoordinator::new(
            registry.clone(),
            Arc::new(PortPublisher::new(background.clone())),
            RetryPolicy::from(&config.initialization),
        ));
        let injector = Arc::new(ToolInjector::from_config(&config));
        let observer =
            DomObserverEngine::new(strategy.clone(), injector.clone(), config.observer.throttle());
        let dispatcher = Arc::new(ToolActionDispatcher::new(
            document.clone(),
            registry,
            strategy,
            config.clone(),
        ));
        let last_url = Mutex::new(document.lock().url().to_string());

        Self {
            tab_id,
            document,
            config,
            coordinator,
            observer,
            injector,
            dispatcher,
            background,
            last_url,
        }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn coordinator(&self) -> &Arc<InitializationCoordinator> {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> &Arc<ToolActionDispatcher> {
        &self.dispatcher
    }

    /// First scan of the page, then initialization.
    ///
    /// Controls are injected disabled and enabled once the registry is
    /// usable.
    pub async fn initialize(&self) -> ScanReport {
        let report = {
            let usable = self.coordinator.registry().is_usable();
            let mut doc = self.document.lock();
            self.observer.scan(&mut doc, usable)
        };
        info!(tab_id = %self.tab_id, injected = report.injected, "Content context started");

        self.reinitialize().await;
        report
    }

    /// Initialize on demand and bring control availability up to date.
    pub async fn reinitialize(&self) -> StartOutcome {
        let outcome = self.coordinator.ensure_started().await;
        self.refresh_availability();
        outcome
    }

    /// Enable or disable every injected control to match the registry.
    pub fn refresh_availability(&self) -> usize {
        let usable = self.coordinator.registry().is_usable();
        let mut doc = self.document.lock();
        self.injector.set_availability(&mut doc, usable)
    }

    fn status_message(&self) -> Message {
        let registry = self.coordinator.registry();
        Message::AiStatus {
            available: registry.is_usable(),
            capabilities: registry.capabilities().unwrap_or_default(),
        }
    }

    /// Handle a runtime message. Returns the response, if the message
    /// kind has one.
    pub async fn handle_message(&self, message: Message) -> Option<Message> {
        match message {
            Message::GetAiStatus => {
                let was_ready = self.coordinator.state() == InitState::Ready;
                let outcome = self.reinitialize().await;
                if let (true, StartOutcome::Ready(capabilities)) = (was_ready, outcome) {
                    // The coordinator may have missed the first notification.
                    if let Err(e) = self
                        .background
                        .request(Message::AiInitialized { capabilities })
                        .await
                    {
                        debug!(
                            tab_id = %self.tab_id,
                            error = %e,
                            "Failed to re-notify initialization"
                        );
                    }
                }
                Some(self.status_message())
            }
            Message::TabReady => {
                let state = self.coordinator.state();
                if state != InitState::Ready && !self.coordinator.in_progress() {
                    debug!(
                        tab_id = %self.tab_id,
                        state = ?state,
                        "Tab ready, starting initialization"
                    );
                    self.coordinator.start().await;
                    self.refresh_availability();
                }
                None
            }
            Message::CheckAiStatus => {
                self.coordinator.refresh().await;
                self.refresh_availability();
                Some(self.status_message())
            }
            other => {
                debug!(kind = other.kind(), "Ignoring message");
                None
            }
        }
    }

    /// Drain the mutation queue: reset after an in-page navigation, then
    /// feed the batch to the observer.
    pub async fn process_mutations(&self) -> Option<ScanReport> {
        let navigated = {
            let doc = self.document.lock();
            let mut last = self.last_url.lock();
            (doc.url() != last.as_str()).then(|| {
                let previous = std::mem::replace(&mut *last, doc.url().to_string());
                (previous, last.clone())
            })
        };

        if let Some((from, to)) = navigated {
            info!(tab_id = %self.tab_id, from = %from, to = %to, "In-page navigation");
            self.dispatcher.invalidate_all();
            self.coordinator.reset_for_navigation().await;
            self.refresh_availability();
        }

        let usable = self.coordinator.registry().is_usable();
        let mut doc = self.document.lock();
        let batch = doc.take_mutations();
        if batch.is_empty() {
            return None;
        }
        self.observer.on_mutations(&mut doc, &batch, usable)
    }

    /// A click on an injected control. Returns `None` when `node` is not
    /// an enabled tool control.
    pub async fn activate(&self, node: NodeId) -> Option<Result<String, ActionError>> {
        let (action, ctx) = {
            let doc = self.document.lock();
            if doc.has_attribute(node, "disabled") {
                debug!(node = %node, "Ignoring click on disabled control");
                return None;
            }
            let action: ActionId = doc.attribute(node, TOOL_ID_ATTR)?.parse().ok()?;
            let ctx = SurfaceContext::from_control(&doc, &self.config, node)?;
            (action, ctx)
        };
        Some(self.dispatcher.run_action(action, ctx).await)
    }

    /// A change of the language picker.
    pub fn select_language(&self, picker: NodeId, code: &str) -> bool {
        if !self.config.languages.iter().any(|l| l.code == code) {
            warn!(code, "Unknown language selected");
            return false;
        }
        let mut doc = self.document.lock();
        if !doc.has_class(picker, &self.config.ui.language_select_class) {
            return false;
        }
        doc.set_attribute(picker, "value", code);
        true
    }

    /// Serve messages and watch the page until the inbox closes.
    pub async fn run(self: Arc<Self>, mut inbox: ContextInbox) {
        let mut ticker = tokio::time::interval(MUTATION_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(Envelope { message, responder, .. }) = envelope else {
                        break;
                    };
                    let this = self.clone();
                    tokio::spawn(async move {
                        let response = this.handle_message(message).await;
                        if let (Some(responder), Some(response)) = (responder, response) {
                            responder.send(response);
                        }
                    });
                }
                _ = ticker.tick() => {
                    self.process_mutations().await;
                    if self.coordinator.state() == InitState::Uninitialized
                        && !self.coordinator.in_progress()
                    {
                        let this = self.clone();
                        tokio::spawn(async move {
                            this.reinitialize().await;
                        });
                    }
                }
            }
        }

        info!(tab_id = %self.tab_id, "Content context stopped");
    }
}

#[cfg(test)]
#[path = "content_script_tests.rs"]
mod tests;
