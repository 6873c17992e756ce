//! Sync event system.
//!
//! The engine publishes what it did on a broadcast channel so hosts (the
//! widget host, a CLI `watch` loop, logs) can react without polling the
//! snapshot.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the sync engine.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SyncEvent {
    /// A refresh pass began.
    RefreshStarted { background: bool },
    /// The zone catalog could not be fetched.
    CatalogFailed { background: bool, error: String },
    /// One zone's reading could not be fetched this cycle.
    ZoneFailed { zone_id: String, error: String },
    /// A refresh pass finished merging.
    RefreshCompleted {
        background: bool,
        zones: usize,
        readings: usize,
        failed: usize,
    },
    /// A pin was added or removed.
    PinToggled { zone_id: String, pinned: bool },
    /// The widget should re-render from fresh data.
    WidgetRefreshRequested,
}

/// Sender for sync events.
pub type EventSender = broadcast::Sender<SyncEvent>;

/// Receiver for sync events.
pub type EventReceiver = broadcast::Receiver<SyncEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SyncEvent) {
        // no receivers is fine
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
