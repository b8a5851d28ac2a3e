//! The coordination context.
//!
//! Owns the [`TabStateStore`], reacts to browser tab events, answers
//! readiness queries and broadcasts every effective state change.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mailmate_config::HostConfig;
use mailmate_protocols::{
    Message, MessageError, MessagePort, MessageSender, TabId, TabState, TabStateUpdate,
};

use crate::channel::{ContextInbox, Envelope};
use crate::tab_store::TabStateStore;

#[cfg(test)]
#[path = "background_tests.rs"]
mod tests;

/// Browser tab events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    /// The page in the tab finished loading.
    Completed { tab_id: TabId, url: String },
    /// The tab's URL changed without a reload.
    UrlChanged { tab_id: TabId, url: String },
    Removed { tab_id: TabId },
}

/// Pushes messages into a tab's content context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), MessageError>;
}

pub struct BackgroundService {
    store: Arc<TabStateStore>,
    messenger: Arc<dyn TabMessenger>,
    host: HostConfig,
    observers: RwLock<Vec<Arc<dyn MessagePort>>>,
}

impl BackgroundService {
    pub fn new(
        store: Arc<TabStateStore>,
        messenger: Arc<dyn TabMessenger>,
        host: HostConfig,
    ) -> Self {
        Self {
            store,
            messenger,
            host,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<TabStateStore> {
        &self.store
    }

    /// Register a context that receives `TAB_STATE_CHANGED`.
    pub fn add_observer(&self, port: Arc<dyn MessagePort>) {
        self.observers.write().push(port);
    }

    pub async fn handle_tab_event(&self, event: TabEvent) {
        match event {
            TabEvent::Completed { tab_id, url } => {
                if !self.host.matches(&url) {
                    return;
                }
                info!(tab_id = %tab_id, "Mail page loaded");
                self.store
                    .update(tab_id, &TabStateUpdate::loaded().with_url(url));

                if let Err(e) = self.messenger.send_to_tab(tab_id, Message::TabReady).await {
                    // The content context may not be listening yet.
                    debug!(tab_id = %tab_id, error = %e, "Failed to notify tab");
                }
            }
            TabEvent::UrlChanged { tab_id, url } => {
                if self.host.matches(&url) {
                    self.store.update(tab_id, &TabStateUpdate::url(url));
                }
            }
            TabEvent::Removed { tab_id } => {
                if self.store.remove(tab_id).is_some() {
                    debug!(tab_id = %tab_id, "Tab closed");
                }
            }
        }
    }

    /// Handle a runtime message. Returns the response, if the message
    /// kind has one.
    pub fn handle_message(&self, message: Message, sender: MessageSender) -> Option<Message> {
        match message {
            Message::CheckTabReady { tab_id } => {
                let state = self.store.get(tab_id);
                let ready = state.as_ref().is_some_and(TabState::is_ready);
                Some(Message::TabReadyStatus { ready, state })
            }
            Message::GetReadyTabs => Some(Message::ReadyTabs {
                tabs: self.store.ready_tabs(),
            }),
            Message::AiInitialized { capabilities } => {
                Some(self.update_sender(sender, TabStateUpdate::initialized(capabilities)))
            }
            Message::ResetAiState => Some(self.update_sender(sender, TabStateUpdate::reset_ai())),
            other => {
                debug!(kind = other.kind(), "Ignoring message");
                None
            }
        }
    }

    fn update_sender(&self, sender: MessageSender, update: TabStateUpdate) -> Message {
        match sender.tab_id {
            Some(tab_id) => {
                self.store.update(tab_id, &update);
                Message::Ack { success: true }
            }
            None => {
                warn!("State update from a sender without a tab");
                Message::Ack { success: false }
            }
        }
    }

    async fn broadcast(&self, state: TabState) {
        let observers = self.observers.read().clone();
        let message = Message::TabStateChanged {
            tab_id: state.tab_id,
            state,
        };
        for observer in observers {
            if let Err(e) = observer.notify(message.clone()).await {
                debug!(error = %e, "Observer not listening");
            }
        }
    }

    /// Serve messages and tab events until the inbox closes.
    pub async fn run(
        self: Arc<Self>,
        mut inbox: ContextInbox,
        mut events: mpsc::Receiver<TabEvent>,
    ) {
        let mut changes = self.store.subscribe();
        let mut events_open = true;
        info!("Coordination context started");

        loop {
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(Envelope { message, sender, responder }) = envelope else {
                        break;
                    };
                    let response = self.handle_message(message, sender);
                    if let (Some(responder), Some(response)) = (responder, response) {
                        responder.send(response);
                    }
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_tab_event(event).await,
                    None => events_open = false,
                },
                change = changes.recv() => match change {
                    Ok(state) => self.broadcast(state).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped tab state broadcasts");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("Coordination context stopped");
    }
}
