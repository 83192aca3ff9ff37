//! Event types for the Cadenza event system
//!
//! Provides shared event definitions and the EventBus used to publish
//! session outcomes that do not have a direct caller, such as the
//! auto-advance that follows a track ending.

mod playback_types;
mod queue_types;

pub use playback_types::PlaybackState;
pub use queue_types::QueueChangeTrigger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Cadenza event types
///
/// Every event carries the session key it belongs to and a timestamp.
/// Events are broadcast via EventBus and can be serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CadenzaEvent {
    /// A session was created for a channel key
    SessionCreated {
        session: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was torn down (leave)
    SessionDestroyed {
        session: String,
        timestamp: DateTime<Utc>,
    },

    /// Playback state changed (Idle / Playing / Paused)
    PlaybackStateChanged {
        session: String,
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// A stream started for a resolved track
    ///
    /// Triggers:
    /// - Command layer: post a "Now Playing" message
    TrackStarted {
        session: String,
        title: String,
        url: String,
        thumbnail: Option<String>,
        /// True when the loop flag replayed the same track
        replay: bool,
        timestamp: DateTime<Utc>,
    },

    /// Queue contents changed
    QueueChanged {
        session: String,
        /// Queue length after the change
        length: usize,
        /// Why queue changed
        trigger: QueueChangeTrigger,
        timestamp: DateTime<Utc>,
    },

    /// Advance found nothing left to play
    QueueExhausted {
        session: String,
        timestamp: DateTime<Utc>,
    },

    /// A query could not be turned into a playable track
    ResolutionFailed {
        session: String,
        query: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The audio backend reported a transport failure mid-stream.
    ///
    /// Playback still advances to the next track afterwards.
    StreamFailed {
        session: String,
        title: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl CadenzaEvent {
    /// Session key this event belongs to
    pub fn session(&self) -> &str {
        match self {
            CadenzaEvent::SessionCreated { session, .. }
            | CadenzaEvent::SessionDestroyed { session, .. }
            | CadenzaEvent::PlaybackStateChanged { session, .. }
            | CadenzaEvent::TrackStarted { session, .. }
            | CadenzaEvent::QueueChanged { session, .. }
            | CadenzaEvent::QueueExhausted { session, .. }
            | CadenzaEvent::ResolutionFailed { session, .. }
            | CadenzaEvent::StreamFailed { session, .. } => session,
        }
    }

    /// Event type name, matching the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CadenzaEvent::SessionCreated { .. } => "SessionCreated",
            CadenzaEvent::SessionDestroyed { .. } => "SessionDestroyed",
            CadenzaEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            CadenzaEvent::TrackStarted { .. } => "TrackStarted",
            CadenzaEvent::QueueChanged { .. } => "QueueChanged",
            CadenzaEvent::QueueExhausted { .. } => "QueueExhausted",
            CadenzaEvent::ResolutionFailed { .. } => "ResolutionFailed",
            CadenzaEvent::StreamFailed { .. } => "StreamFailed",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use cadenza_common::events::{CadenzaEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(CadenzaEvent::QueueExhausted {
///     session: "guild-1".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "QueueExhausted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CadenzaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CadenzaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CadenzaEvent,
    ) -> Result<usize, broadcast::error::SendError<CadenzaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CadenzaEvent) {
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

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
