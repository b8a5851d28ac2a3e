//! In-process message transport between contexts.
//!
//! Each context owns a [`ContextInbox`] and hands out cloneable
//! [`ContextEndpoint`]s. A request carries a one-shot reply slot; a
//! notification carries none. Nothing is persistent: once the inbox is
//! dropped every send fails with [`MessageError::NoReceiver`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use mailmate_protocols::{Message, MessageError, MessagePort, MessageSender, TabId};

use crate::background::TabMessenger;

/// Reply slot of a request.
pub struct Responder(oneshot::Sender<Message>);

impl Responder {
    pub fn send(self, message: Message) {
        if self.0.send(message).is_err() {
            debug!("Requester went away before the response");
        }
    }
}

/// A message as delivered to a context.
pub struct Envelope {
    pub message: Message,
    pub sender: MessageSender,
    /// Present for requests, absent for notifications.
    pub responder: Option<Responder>,
}

impl Envelope {
    /// Answer a request. Notifications ignore the response.
    pub fn respond(self, message: Message) {
        if let Some(responder) = self.responder {
            responder.send(message);
        }
    }
}

/// Sending side of a context's inbox.
#[derive(Clone)]
pub struct ContextEndpoint {
    target: Arc<str>,
    sender: MessageSender,
    tx: mpsc::Sender<Envelope>,
}

impl ContextEndpoint {
    /// Name of the context this endpoint delivers to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The same endpoint, sending as `sender`.
    pub fn as_sender(&self, sender: MessageSender) -> Self {
        Self {
            sender,
            ..self.clone()
        }
    }

    async fn deliver(&self, envelope: Envelope) -> Result<(), MessageError> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| MessageError::NoReceiver(self.target.to_string()))
    }
}

#[async_trait]
impl MessagePort for ContextEndpoint {
    async fn request(&self, message: Message) -> Result<Message, MessageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        debug!(target_context = %self.target, kind = message.kind(), "Sending request");
        self.deliver(Envelope {
            message,
            sender: self.sender,
            responder: Some(Responder(reply_tx)),
        })
        .await?;
        reply_rx.await.map_err(|_| MessageError::ResponseDropped)
    }

    async fn notify(&self, message: Message) -> Result<(), MessageError> {
        debug!(target_context = %self.target, kind = message.kind(), "Sending notification");
        self.deliver(Envelope {
            message,
            sender: self.sender,
            responder: None,
        })
        .await
    }
}

/// Receiving side of a context.
pub struct ContextInbox {
    rx: mpsc::Receiver<Envelope>,
}

impl ContextInbox {
    /// Next envelope, or `None` once every endpoint is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Next envelope if one is already queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

/// Create an inbox for the context named `target`.
pub fn context_channel(
    target: impl Into<String>,
    buffer: usize,
) -> (ContextEndpoint, ContextInbox) {
    let target: String = target.into();
    let (tx, rx) = mpsc::channel(buffer);
    let endpoint = ContextEndpoint {
        target: Arc::from(target),
        sender: MessageSender::extension(),
        tx,
    };
    (endpoint, ContextInbox { rx })
}

/// Routes coordinator pushes to content contexts by tab.
pub struct ChannelTabMessenger {
    tabs: DashMap<TabId, ContextEndpoint>,
}

impl ChannelTabMessenger {
    pub fn new() -> Self {
        Self {
            tabs: DashMap::new(),
        }
    }

    /// Register the content context of a tab.
    pub fn attach(&self, tab_id: TabId, endpoint: ContextEndpoint) {
        self.tabs.insert(tab_id, endpoint);
    }

    pub fn detach(&self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }
}

impl Default for ChannelTabMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabMessenger for ChannelTabMessenger {
    async fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), MessageError> {
        let endpoint = self
            .tabs
            .get(&tab_id)
            .map(|e| e.clone())
            .ok_or_else(|| MessageError::NoReceiver(format!("tab {}", tab_id)))?;
        endpoint.notify(message).await
    }
}
