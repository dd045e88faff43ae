//! Controller event system for presentation-layer notifications.
//!
//! The controller never touches a UI directly; everything the presentation
//! layer needs arrives as a [`ControllerEvent`] on a broadcast channel.
//! Payloads are plain data and serializable for logging, persistence, and IPC.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use airlink_types::SensorReading;

/// Connection status of a single device, as shown to the user.
///
/// `Error` is deliberately distinct from `Disconnected`: a failed attempt and
/// a closed link render differently and the user retries from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// A connection attempt is in flight.
    Connecting,
    /// The link is established.
    Connected,
    /// No link (never connected, or the link closed).
    Disconnected,
    /// The last connection attempt failed.
    Error,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Connecting => write!(f, "connecting"),
            LinkStatus::Connected => write!(f, "connected"),
            LinkStatus::Disconnected => write!(f, "disconnected"),
            LinkStatus::Error => write!(f, "error"),
        }
    }
}

/// Events emitted by the controller for the presentation layer.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ControllerEvent {
    /// A device was seen for the first time this session.
    DeviceDiscovered {
        id: String,
        name: Option<String>,
        rssi: Option<i16>,
    },
    /// A known device was sighted again; only its signal strength changed.
    DeviceSignalUpdated { id: String, rssi: Option<i16> },
    /// A device's connection status changed.
    ConnectionStatusChanged { id: String, status: LinkStatus },
    /// A device's notification stream was started or stopped.
    SubscriptionChanged { id: String, active: bool },
    /// A fresh sensor reading arrived via notification or manual read.
    ReadingUpdated { id: String, reading: SensorReading },
    /// Fire-and-forget diagnostic line for logging/telemetry.
    Diagnostic { message: String },
}

/// Sender for controller events.
pub type EventSender = broadcast::Sender<ControllerEvent>;

/// Receiver for controller events.
pub type EventReceiver = broadcast::Receiver<ControllerEvent>;

/// Event dispatcher fanning controller events out to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: ControllerEvent) {
        // Ignore error if no receivers
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LinkStatus::Connecting).unwrap(),
            "\"connecting\""
        );
        assert_eq!(
            serde_json::to_string(&LinkStatus::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = ControllerEvent::ConnectionStatusChanged {
            id: "dev-1".to_string(),
            status: LinkStatus::Connected,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"connection_status_changed\""));
        assert!(json.contains("\"status\":\"connected\""));

        let event = ControllerEvent::ReadingUpdated {
            id: "dev-1".to_string(),
            reading: SensorReading {
                temperature: 21.0,
                co2: 420,
                tvoc: 7,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"co2\":420"));
    }

    #[test]
    fn test_dispatcher_fanout() {
        let dispatcher = EventDispatcher::new(8);
        let mut rx_a = dispatcher.subscribe();
        let mut rx_b = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 2);

        dispatcher.send(ControllerEvent::Diagnostic {
            message: "hello".to_string(),
        });

        assert!(matches!(
            rx_a.try_recv().unwrap(),
            ControllerEvent::Diagnostic { .. }
        ));
        assert!(matches!(
            rx_b.try_recv().unwrap(),
            ControllerEvent::Diagnostic { .. }
        ));
    }

    #[test]
    fn test_dispatcher_send_without_receivers() {
        let dispatcher = EventDispatcher::new(8);
        // Must not panic or error when nobody is listening.
        dispatcher.send(ControllerEvent::Diagnostic {
            message: "into the void".to_string(),
        });
    }
}
