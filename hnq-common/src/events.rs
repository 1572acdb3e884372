//! Event types for the HNQ event system
//!
//! Game sessions report their transitions through the [`EventBus`]; the game
//! server forwards them to SSE subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::item::StoryId;

/// HNQ event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A session finished acquisition and is ready for its first guess
    SessionStarted {
        session_id: Uuid,
        /// Number of rounds in the session
        total_items: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Acquisition failed; the session never became playable
    AcquisitionFailed {
        session_id: Uuid,
        /// Rendered `FetchFailure`
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A guess was scored and the round revealed
    GuessScored {
        session_id: Uuid,
        /// Round position within the session
        cursor: usize,
        item_id: StoryId,
        /// Points awarded for this round
        points: u32,
        /// Session total after this round
        cumulative_score: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session moved on to its next round
    RoundAdvanced {
        session_id: Uuid,
        /// New round position
        cursor: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The last round was completed
    SessionFinished {
        session_id: Uuid,
        final_score: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GameEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::SessionStarted { .. } => "SessionStarted",
            GameEvent::AcquisitionFailed { .. } => "AcquisitionFailed",
            GameEvent::GuessScored { .. } => "GuessScored",
            GameEvent::RoundAdvanced { .. } => "RoundAdvanced",
            GameEvent::SessionFinished { .. } => "SessionFinished",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            GameEvent::SessionStarted { session_id, .. }
            | GameEvent::AcquisitionFailed { session_id, .. }
            | GameEvent::GuessScored { session_id, .. }
            | GameEvent::RoundAdvanced { session_id, .. }
            | GameEvent::SessionFinished { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast channel for [`GameEvent`]s
///
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use hnq_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GameEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
