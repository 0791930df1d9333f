//! Outbound notifications of the session controller.

use std::sync::Arc;

use bridge_traits::platform::PlatformSendSync;
use core_runtime::events::{CoreEvent, EventBus, MediaEvent, ReceiverEvent, SessionEvent};
use core_runtime::model::{MediaSnapshot, SessionDescription};
use tracing::trace;

/// Receives every state change the controller reports.
///
/// Called on the main-thread executor, outside the controller's state lock,
/// so implementations may call back into the controller.
pub trait CastListener: PlatformSendSync {
    /// Media was loaded by another sender or by the receiver itself.
    fn on_media_loaded(&self, snapshot: Arc<MediaSnapshot>);

    fn on_media_update(&self, snapshot: Arc<MediaSnapshot>);

    fn on_session_update(&self, description: SessionDescription);

    /// The receiver application went away. `description.status` is `Stopped`.
    fn on_session_end(&self, description: SessionDescription);

    fn on_message_received(&self, device_id: &str, namespace: &str, message: &str);
}

/// Publishes controller notifications as [`CoreEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBusListener {
    bus: EventBus,
}

impl EventBusListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn publish(&self, event: CoreEvent) {
        let name = event.wire_name();
        // No subscriber is not an error.
        if self.bus.emit(event).is_err() {
            trace!(event = name, "No subscribers for event");
        }
    }
}

impl CastListener for EventBusListener {
    fn on_media_loaded(&self, snapshot: Arc<MediaSnapshot>) {
        self.publish(CoreEvent::Media(MediaEvent::Loaded {
            snapshot: (*snapshot).clone(),
        }));
    }

    fn on_media_update(&self, snapshot: Arc<MediaSnapshot>) {
        self.publish(CoreEvent::Media(MediaEvent::Updated {
            snapshot: (*snapshot).clone(),
        }));
    }

    fn on_session_update(&self, description: SessionDescription) {
        self.publish(CoreEvent::Session(SessionEvent::Updated { description }));
    }

    fn on_session_end(&self, description: SessionDescription) {
        self.publish(CoreEvent::Session(SessionEvent::Stopped { description }));
    }

    fn on_message_received(&self, device_id: &str, namespace: &str, message: &str) {
        self.publish(CoreEvent::Receiver(ReceiverEvent::MessageReceived {
            device_id: device_id.to_string(),
            namespace: namespace.to_string(),
            message: message.to_string(),
        }));
    }
}
