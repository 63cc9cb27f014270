//! Engine event publishing
//!
//! An explicit publish/subscribe object owned by the application root and
//! injected into the sync engines. Front ends subscribe for UI updates;
//! nothing registers listeners through module-level state.

use crate::session::{ChatMessage, ClientMode};
use tokio::sync::broadcast;

/// Why local session state was reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// The backend reported the session ended
    Ended,
    /// The session no longer exists server-side
    NotFound,
}

/// Events published by the sync engines
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The client mode changed
    ModeChanged {
        /// Mode before the observation
        from: ClientMode,
        /// Mode after the observation
        to: ClientMode,
    },
    /// The local message list changed (new, merged, or replaced messages)
    MessagesUpdated,
    /// A newly observed agent message
    AgentMessage {
        /// The agent message
        message: ChatMessage,
    },
    /// The offline flag flipped
    OfflineChanged {
        /// Current offline state
        offline: bool,
    },
    /// Local session state was cleared
    SessionReset {
        /// What triggered the reset
        reason: ResetReason,
    },
    /// One-time informational message to surface to the user
    Info(String),
}

/// Broadcast channel wrapper the engines publish into
///
/// Cloning shares the underlying channel. Publishing with no subscribers
/// is not an error; events are simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a bus with the given buffered capacity per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: EngineEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
