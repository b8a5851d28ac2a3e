//! Cross-context message protocol.
//!
//! Every exchange is either a one-shot request/response or a
//! fire-and-forget notification. Delivery order across message kinds is
//! not guaranteed, so receivers must treat stale or duplicate messages as
//! no-ops.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityMap;
use crate::error::MessageError;
use crate::tab::{TabId, TabState};

/// A message exchanged between the coordination context, content
/// contexts and the status UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Status UI → content: report AI availability.
    GetAiStatus,

    /// Content → status UI: response to [`Message::GetAiStatus`].
    AiStatus {
        available: bool,
        capabilities: CapabilityMap,
    },

    /// Content → coordinator: AI finished initializing in the sending tab.
    AiInitialized { capabilities: CapabilityMap },

    /// Content → coordinator: clear AI state for the sending tab.
    ResetAiState,

    /// Status UI → coordinator: is the tab ready?
    #[serde(rename_all = "camelCase")]
    CheckTabReady { tab_id: TabId },

    /// Coordinator → status UI: response to [`Message::CheckTabReady`].
    TabReadyStatus {
        ready: bool,
        state: Option<TabState>,
    },

    /// Status UI → coordinator: list tabs that are loaded and initialized.
    GetReadyTabs,

    /// Coordinator → status UI: response to [`Message::GetReadyTabs`].
    ReadyTabs { tabs: Vec<TabId> },

    /// Coordinator → content: the page finished loading.
    TabReady,

    /// Status UI → content: re-check availability and refresh controls.
    CheckAiStatus,

    /// Coordinator → everyone: a tab's state changed.
    #[serde(rename_all = "camelCase")]
    TabStateChanged { tab_id: TabId, state: TabState },

    /// Generic acknowledgement.
    Ack { success: bool },
}

impl Message {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::GetAiStatus => "GET_AI_STATUS",
            Message::AiStatus { .. } => "AI_STATUS",
            Message::AiInitialized { .. } => "AI_INITIALIZED",
            Message::ResetAiState => "RESET_AI_STATE",
            Message::CheckTabReady { .. } => "CHECK_TAB_READY",
            Message::TabReadyStatus { .. } => "TAB_READY_STATUS",
            Message::GetReadyTabs => "GET_READY_TABS",
            Message::ReadyTabs { .. } => "READY_TABS",
            Message::TabReady => "TAB_READY",
            Message::CheckAiStatus => "CHECK_AI_STATUS",
            Message::TabStateChanged { .. } => "TAB_STATE_CHANGED",
            Message::Ack { .. } => "ACK",
        }
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Who sent a message. Content contexts carry their tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageSender {
    pub tab_id: Option<TabId>,
}

impl MessageSender {
    pub fn tab(tab_id: TabId) -> Self {
        Self {
            tab_id: Some(tab_id),
        }
    }

    /// A sender without a tab (status UI, coordinator).
    pub fn extension() -> Self {
        Self::default()
    }
}

/// Outgoing side of a connection to another context.
#[async_trait]
pub trait MessagePort: Send + Sync {
    /// Send a request and wait for its single response.
    async fn request(&self, message: Message) -> Result<Message, MessageError>;

    /// Send without waiting for a response.
    async fn notify(&self, message: Message) -> Result<(), MessageError>;
}
