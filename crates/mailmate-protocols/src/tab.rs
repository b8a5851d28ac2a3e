//! Per-tab state record and its merge semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityMap;

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State the coordination context keeps for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabState {
    pub tab_id: TabId,
    pub loaded: bool,
    pub ai_initialized: bool,
    pub capabilities: Option<CapabilityMap>,
    #[serde(default)]
    pub url: String,
}

impl TabState {
    pub fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            loaded: false,
            ai_initialized: false,
            capabilities: None,
            url: String::new(),
        }
    }

    /// Loaded and AI initialized.
    pub fn is_ready(&self) -> bool {
        self.loaded && self.ai_initialized
    }

    /// Merge a partial update. Fields absent from the update keep their
    /// current value. Returns whether anything changed.
    pub fn apply(&mut self, update: &TabStateUpdate) -> bool {
        let before = self.clone();

        if let Some(loaded) = update.loaded {
            self.loaded = loaded;
        }
        if let Some(initialized) = update.ai_initialized {
            self.ai_initialized = initialized;
        }
        if let Some(capabilities) = &update.capabilities {
            self.capabilities = capabilities.clone();
        }
        if let Some(url) = &update.url {
            self.url = url.clone();
        }

        *self != before
    }
}

/// Partial update to a [`TabState`].
///
/// `capabilities` is doubly optional: `None` leaves the map untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabStateUpdate {
    pub loaded: Option<bool>,
    pub ai_initialized: Option<bool>,
    pub capabilities: Option<Option<CapabilityMap>>,
    pub url: Option<String>,
}

impl TabStateUpdate {
    /// Page finished loading.
    pub fn loaded() -> Self {
        Self {
            loaded: Some(true),
            ..Default::default()
        }
    }

    /// URL changed within the page.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// AI finished initializing in the tab.
    pub fn initialized(capabilities: CapabilityMap) -> Self {
        Self {
            loaded: Some(true),
            ai_initialized: Some(true),
            capabilities: Some(Some(capabilities)),
            ..Default::default()
        }
    }

    /// Explicit AI reset.
    pub fn reset_ai() -> Self {
        Self {
            ai_initialized: Some(false),
            capabilities: Some(None),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
