//! # Event Bus System
//!
//! Typed event delivery from the cast core to the host application, built on
//! a `broadcast` channel.
//!
//! ## Overview
//!
//! The host plugin layer subscribes once and forwards every [`CoreEvent`] to
//! JavaScript under the event names the web SDK expects (`SESSION_STARTED`,
//! `MEDIA_UPDATE`, `RECEIVER_MESSAGE`, ...; see [`CoreEvent::wire_name`]).
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐   subscribe   ┌──────────────┐
//! │ SessionController├──────────>│           ├──────────────>│ Plugin layer │
//! └──────────────────┘           │ EventBus  │               └──────────────┘
//! ┌──────────────────┐   emit    │           │   subscribe   ┌──────────────┐
//! │ CastService      ├──────────>│           ├──────────────>│ Tests / logs │
//! └──────────────────┘           └───────────┘               └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ReceiverEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Receiver(ReceiverEvent::AvailabilityChanged { available: true }))
//!     .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.wire_name(), "RECEIVER_LISTENER");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   a media snapshot is self-contained so the next one repairs state.
//! - **`RecvError::Closed`**: the service was dropped.
//!
//! `emit` fails when nobody is subscribed. Callers treat that as a no-op.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{MediaSnapshot, SessionDescription};

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Session(SessionEvent),
    Media(MediaEvent),
    Receiver(ReceiverEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Media(e) => e.description(),
            CoreEvent::Receiver(e) => e.description(),
        }
    }

    /// Event name used by the host plugin protocol.
    pub fn wire_name(&self) -> &'static str {
        match self {
            CoreEvent::Session(SessionEvent::Setup { .. }) => "SETUP",
            CoreEvent::Session(SessionEvent::Started { .. }) => "SESSION_STARTED",
            CoreEvent::Session(SessionEvent::Resumed { .. }) => "SESSION_RESUMED",
            CoreEvent::Session(SessionEvent::Ended { .. }) => "SESSION_ENDED",
            CoreEvent::Session(SessionEvent::StartFailed { .. }) => "SESSION_START_FAILED",
            CoreEvent::Session(SessionEvent::Rejoined { .. }) => "SESSION_LISTENER",
            CoreEvent::Session(SessionEvent::Updated { .. }) => "SESSION_UPDATE",
            // The web SDK reports receiver-side teardown as a session update
            // whose status is "stopped".
            CoreEvent::Session(SessionEvent::Stopped { .. }) => "SESSION_UPDATE",
            CoreEvent::Media(MediaEvent::Loaded { .. }) => "MEDIA_LOAD",
            CoreEvent::Media(MediaEvent::Updated { .. }) => "MEDIA_UPDATE",
            CoreEvent::Receiver(ReceiverEvent::MessageReceived { .. }) => "RECEIVER_MESSAGE",
            CoreEvent::Receiver(ReceiverEvent::AvailabilityChanged { .. }) => "RECEIVER_LISTENER",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::StartFailed { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::Ended {
                error_code: Some(_),
                ..
            }) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::Started { .. })
            | CoreEvent::Session(SessionEvent::Ended { .. })
            | CoreEvent::Session(SessionEvent::Stopped { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Session lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The bridge finished initializing for this receiver application.
    Setup { receiver_app_id: String },
    Started {
        session_id: String,
        is_connected: bool,
    },
    Resumed {
        session_id: String,
        was_suspended: bool,
    },
    Ended {
        session_id: String,
        /// SDK status code when the session ended abnormally.
        error_code: Option<i32>,
    },
    StartFailed { error_code: i32 },
    /// An already-running session was adopted during initialization.
    Rejoined { description: SessionDescription },
    /// Application status, metadata, input, standby or volume changed.
    Updated { description: SessionDescription },
    /// The receiver application disconnected.
    Stopped { description: SessionDescription },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Setup { .. } => "Cast bridge initialized",
            SessionEvent::Started { .. } => "Session started",
            SessionEvent::Resumed { .. } => "Session resumed",
            SessionEvent::Ended { .. } => "Session ended",
            SessionEvent::StartFailed { .. } => "Session failed to start",
            SessionEvent::Rejoined { .. } => "Rejoined existing session",
            SessionEvent::Updated { .. } => "Session updated",
            SessionEvent::Stopped { .. } => "Receiver application stopped",
        }
    }
}

// ============================================================================
// Media Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum MediaEvent {
    /// Media was loaded by a party other than this bridge.
    Loaded { snapshot: MediaSnapshot },
    Updated { snapshot: MediaSnapshot },
}

impl MediaEvent {
    fn description(&self) -> &str {
        match self {
            MediaEvent::Loaded { .. } => "Media loaded",
            MediaEvent::Updated { .. } => "Media status updated",
        }
    }
}

// ============================================================================
// Receiver Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ReceiverEvent {
    MessageReceived {
        /// Receiver device label.
        device_id: String,
        namespace: String,
        message: String,
    },
    AvailabilityChanged { available: bool },
}

impl ReceiverEvent {
    fn description(&self) -> &str {
        match self {
            ReceiverEvent::MessageReceived { .. } => "Message received from receiver",
            ReceiverEvent::AvailabilityChanged { .. } => "Receiver availability changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let media_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Media(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` when nothing
    /// matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SessionDescription, SessionStatus};

    fn description() -> SessionDescription {
        SessionDescription {
            session_id: "session-1".to_string(),
            app_id: "CC1AD845".to_string(),
            display_name: Some("Default Media Receiver".to_string()),
            status_text: None,
            status: SessionStatus::Connected,
            receiver: Default::default(),
            media: None,
        }
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Session(SessionEvent::StartFailed { error_code: 2005 });

        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = CoreEvent::Session(SessionEvent::Started {
            session_id: "session-1".to_string(),
            is_connected: true,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Receiver(_)));

        bus.emit(CoreEvent::Session(SessionEvent::Updated {
            description: description(),
        }))
        .ok();
        let wanted = CoreEvent::Receiver(ReceiverEvent::MessageReceived {
            device_id: "living-room".to_string(),
            namespace: "urn:x-cast:com.example".to_string(),
            message: "{\"ping\":1}".to_string(),
        });
        bus.emit(wanted.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), wanted);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for available in [true, false, true, false, true] {
            bus.emit(CoreEvent::Receiver(ReceiverEvent::AvailabilityChanged { available }))
                .ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_wire_names() {
        let stopped = CoreEvent::Session(SessionEvent::Stopped {
            description: description(),
        });
        let updated = CoreEvent::Session(SessionEvent::Updated {
            description: description(),
        });
        assert_eq!(stopped.wire_name(), "SESSION_UPDATE");
        assert_eq!(updated.wire_name(), "SESSION_UPDATE");
        assert_eq!(
            CoreEvent::Session(SessionEvent::Rejoined {
                description: description()
            })
            .wire_name(),
            "SESSION_LISTENER"
        );
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Session(SessionEvent::StartFailed { error_code: 2475 });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let abnormal_end = CoreEvent::Session(SessionEvent::Ended {
            session_id: "s".to_string(),
            error_code: Some(7),
        });
        assert_eq!(abnormal_end.severity(), EventSeverity::Warning);

        let clean_end = CoreEvent::Session(SessionEvent::Ended {
            session_id: "s".to_string(),
            error_code: None,
        });
        assert_eq!(clean_end.severity(), EventSeverity::Info);

        let message = CoreEvent::Receiver(ReceiverEvent::AvailabilityChanged { available: true });
        assert_eq!(message.severity(), EventSeverity::Debug);
        assert_eq!(message.description(), "Receiver availability changed");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Session(SessionEvent::Started {
            session_id: "abc".to_string(),
            is_connected: true,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Session");
        assert_eq!(value["payload"]["event"], "Started");
        assert_eq!(value["payload"]["session_id"], "abc");

        let back: CoreEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
