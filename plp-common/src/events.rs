//! Event types for the PLP notification system
//!
//! Provides the outbound notification definitions and the EventBus that
//! broadcasts them to any number of observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::track::Track;

/// Player state enumeration
///
/// Exactly one of these holds at any time. `Unloaded` is the initial state
/// and the only one in which the playlist may be empty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// No playlist loaded yet
    Unloaded,
    /// Playlist loaded, nothing rendering, position discarded
    Stopped,
    /// Rendering the selected track
    Playing,
    /// Rendering halted, position preserved
    Paused,
}

impl PlayerState {
    /// Lowercase state name as used in notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Unloaded => "unloaded",
            PlayerState::Stopped => "stopped",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        }
    }

    /// Whether a playlist has been loaded
    pub fn is_loaded(&self) -> bool {
        !matches!(self, PlayerState::Unloaded)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound notifications
///
/// Broadcast to every subscriber in emission order. Subscribers only see
/// events emitted after they subscribed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A transition completed
    ///
    /// Emitted exactly once per completed transition, including
    /// self-transitions (song jump, seek) and auto-advance.
    StateChanged {
        /// State after the transition
        state: PlayerState,
        /// Full playlist
        tracks: Vec<Track>,
        /// Index of the selected track
        selected_index: usize,
        /// When the transition completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Rendering position advanced
    ///
    /// Only emitted while playing, once per position-advanced signal.
    TimeUpdate {
        /// Current position in seconds
        position: f64,
        /// Total duration of the current track in seconds (0.0 if unknown)
        duration: f64,
        /// When the signal was handled
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Build a state notification stamped with the current time
    pub fn state_changed(state: PlayerState, tracks: Vec<Track>, selected_index: usize) -> Self {
        PlayerEvent::StateChanged {
            state,
            tracks,
            selected_index,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Build a time notification stamped with the current time
    pub fn time_update(position: f64, duration: f64) -> Self {
        PlayerEvent::TimeUpdate {
            position,
            duration,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::StateChanged { .. } => "StateChanged",
            PlayerEvent::TimeUpdate { .. } => "TimeUpdate",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central distribution bus for player notifications
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use plp_common::events::{EventBus, PlayerEvent, PlayerState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::state_changed(PlayerState::Stopped, Vec::new(), 0));
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "StateChanged");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
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
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_names() {
        assert_eq!(PlayerState::Unloaded.to_string(), "unloaded");
        assert_eq!(PlayerState::Stopped.to_string(), "stopped");
        assert_eq!(PlayerState::Playing.to_string(), "playing");
        assert_eq!(PlayerState::Paused.to_string(), "paused");
    }

    #[test]
    fn test_player_state_is_loaded() {
        assert!(!PlayerState::Unloaded.is_loaded());
        assert!(PlayerState::Stopped.is_loaded());
        assert!(PlayerState::Playing.is_loaded());
        assert!(PlayerState::Paused.is_loaded());
    }

    #[test]
    fn test_state_changed_serialization() {
        let event = PlayerEvent::state_changed(
            PlayerState::Playing,
            vec![Track::new("A", "a.mp3")],
            0,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StateChanged");
        assert_eq!(json["state"], "playing");
        assert_eq!(json["selected_index"], 0);
        assert_eq!(json["tracks"][0]["location"], "a.mp3");
    }

    #[test]
    fn test_time_update_serialization() {
        let event = PlayerEvent::time_update(12.5, 180.0);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimeUpdate");
        assert_eq!(json["position"], 12.5);
        assert_eq!(json["duration"], 180.0);
    }

    #[tokio::test]
    async fn test_event_bus_delivers_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(PlayerEvent::time_update(1.0, 10.0)).unwrap();
        bus.emit(PlayerEvent::time_update(2.0, 10.0)).unwrap();

        for expected in [1.0, 2.0] {
            match rx.recv().await.unwrap() {
                PlayerEvent::TimeUpdate { position, .. } => assert_eq!(position, expected),
                other => panic!("Expected TimeUpdate, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_event_bus_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(10);
        bus.emit_lossy(PlayerEvent::time_update(1.0, 10.0));

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_bus_emit_without_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(PlayerEvent::time_update(0.0, 0.0)).is_err());

        // Lossy variant never fails
        bus.emit_lossy(PlayerEvent::time_update(0.0, 0.0));
        assert_eq!(bus.capacity(), 10);
    }
}
