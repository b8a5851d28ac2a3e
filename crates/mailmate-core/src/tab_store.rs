//! Per-tab state owned by the coordination context.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use mailmate_protocols::{TabId, TabState, TabStateUpdate};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Keyed store of [`TabState`] records.
///
/// Records are only changed through merge updates. Subscribers receive a
/// snapshot after every update that actually changed a record, so a
/// duplicate update never produces a second notification.
pub struct TabStateStore {
    tabs: DashMap<TabId, TabState>,
    changes: broadcast::Sender<TabState>,
}

impl TabStateStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tabs: DashMap::new(),
            changes,
        }
    }

    /// Merge an update into a tab's record, creating it if needed.
    ///
    /// Returns the resulting state and whether it changed.
    pub fn update(&self, tab_id: TabId, update: &TabStateUpdate) -> (TabState, bool) {
        let (state, changed) = {
            let mut entry = self
                .tabs
                .entry(tab_id)
                .or_insert_with(|| TabState::new(tab_id));
            let changed = entry.apply(update);
            (entry.clone(), changed)
        };

        if changed {
            debug!(tab_id = %tab_id, ?update, "Tab state changed");
            // No subscribers is fine.
            let _ = self.changes.send(state.clone());
        }
        (state, changed)
    }

    pub fn get(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.get(&tab_id).map(|s| s.clone())
    }

    /// Loaded and AI initialized.
    pub fn is_ready(&self, tab_id: TabId) -> bool {
        self.tabs.get(&tab_id).is_some_and(|s| s.is_ready())
    }

    /// Tabs that are ready, in id order.
    pub fn ready_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<TabId> = self
            .tabs
            .iter()
            .filter(|s| s.is_ready())
            .map(|s| *s.key())
            .collect();
        tabs.sort();
        tabs
    }

    /// Drop a closed tab's record.
    pub fn remove(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.remove(&tab_id).map(|(_, state)| state)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TabState> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

impl Default for TabStateStore {
    fn default() -> Self {
        Self::new()
    }
}
