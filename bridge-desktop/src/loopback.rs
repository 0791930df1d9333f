//! In-memory Cast receiver.
//!
//! Implements the `bridge_traits::cast` contracts without any network. The
//! receiver's behaviour that matters to the core is reproduced faithfully:
//!
//! - queue items are cached lazily; a lookup with `fetch_if_missing` marks
//!   the index as pending and nothing is delivered until the host (or test)
//!   calls [`LoopbackQueue::deliver_pending`] or [`LoopbackQueue::deliver`]
//! - a load replaces the queue and reports `ItemsReloaded` plus a status
//!   update before the load result
//! - listeners stop receiving once their [`Registration`] is cancelled
//!
//! Notifications are delivered synchronously on the thread that triggers
//! them.

use bridge_traits::cast::{
    ApplicationEvent, ApplicationListener, CastContext, CastSession, ClientEvent, ClientListener,
    ContextEvent, ContextListener, LoadRequest, MediaQueue, MediaStatus, MessageListener,
    PlayerState, ProviderStatus, QueueEvent, QueueItem, QueueListener, ReceiverInfo,
    Registration, RemoteMediaClient, SessionInfo, SessionRequestCallback, SessionRequestOutcome,
    StatusCallback, Volume,
};
use bridge_traits::error::Result;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// Listener bookkeeping
// ============================================================================

struct Listeners<E> {
    entries: Mutex<Vec<(Registration, Arc<dyn Fn(E) + Send + Sync>)>>,
}

impl<E: Clone> Listeners<E> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, listener: Arc<dyn Fn(E) + Send + Sync>) -> Registration {
        let registration = Registration::new();
        self.entries.lock().push((registration.clone(), listener));
        registration
    }

    fn notify(&self, event: E) {
        let live: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.retain(|(registration, _)| !registration.is_cancelled());
            entries.iter().map(|(_, listener)| listener.clone()).collect()
        };
        for listener in live {
            listener(event.clone());
        }
    }

    fn active(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(registration, _)| !registration.is_cancelled())
            .count()
    }
}

// ============================================================================
// Queue
// ============================================================================

#[derive(Default)]
struct QueueState {
    items: Vec<QueueItem>,
    cached: BTreeSet<usize>,
    pending: BTreeSet<usize>,
}

/// Media queue with an explicitly driven item cache.
pub struct LoopbackQueue {
    state: Mutex<QueueState>,
    listeners: Listeners<QueueEvent>,
    next_item_id: AtomicI32,
}

impl LoopbackQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            listeners: Listeners::new(),
            next_item_id: AtomicI32::new(1),
        }
    }

    /// Assign a fresh receiver item id.
    pub fn allocate_item_id(&self) -> i32 {
        self.next_item_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Replace the whole queue. Nothing is cached afterwards.
    pub fn reload(&self, items: Vec<QueueItem>) {
        {
            let mut state = self.state.lock();
            state.items = items;
            state.cached.clear();
            state.pending.clear();
        }
        self.listeners.notify(QueueEvent::ItemsReloaded);
    }

    /// Insert items at `start`, shifting later indexes.
    pub fn insert(&self, start: usize, items: Vec<QueueItem>) {
        let count = items.len();
        {
            let mut state = self.state.lock();
            let start = start.min(state.items.len());
            state.items.splice(start..start, items);
            state.cached = shift_up(&state.cached, start, count);
            state.pending = shift_up(&state.pending, start, count);
        }
        self.listeners
            .notify(QueueEvent::ItemsInsertedInRange { start, count });
    }

    /// Remove the items at `indexes`.
    pub fn remove(&self, indexes: Vec<usize>) {
        {
            let mut state = self.state.lock();
            let mut sorted = indexes.clone();
            sorted.sort_unstable();
            sorted.dedup();
            for index in sorted.iter().rev() {
                if *index < state.items.len() {
                    state.items.remove(*index);
                }
            }
            // Remaining entries keep their data but indexes moved.
            state.cached.clear();
            state.pending.clear();
        }
        self.listeners
            .notify(QueueEvent::ItemsRemovedAtIndexes(indexes));
    }

    /// Complete every outstanding fetch. Returns the delivered indexes.
    pub fn deliver_pending(&self) -> Vec<usize> {
        let delivered: Vec<usize> = {
            let mut state = self.state.lock();
            let pending = std::mem::take(&mut state.pending);
            state.cached.extend(pending.iter().copied());
            pending.into_iter().collect()
        };
        if !delivered.is_empty() {
            self.listeners
                .notify(QueueEvent::ItemsUpdatedAtIndexes(delivered.clone()));
        }
        delivered
    }

    /// Complete the fetch of specific indexes, whether or not they were
    /// requested.
    pub fn deliver(&self, indexes: Vec<usize>) {
        {
            let mut state = self.state.lock();
            let len = state.items.len();
            for index in indexes.iter().copied().filter(|i| *i < len) {
                state.pending.remove(&index);
                state.cached.insert(index);
            }
        }
        self.listeners
            .notify(QueueEvent::ItemsUpdatedAtIndexes(indexes));
    }

    /// Mark every item cached without notifying.
    pub fn preload_all(&self) {
        let mut state = self.state.lock();
        let len = state.items.len();
        state.cached = (0..len).collect();
        state.pending.clear();
    }

    pub fn pending_fetches(&self) -> Vec<usize> {
        self.state.lock().pending.iter().copied().collect()
    }

    pub fn item_id_at(&self, index: usize) -> Option<i32> {
        self.state.lock().items.get(index).map(|item| item.item_id)
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }
}

fn shift_up(set: &BTreeSet<usize>, start: usize, count: usize) -> BTreeSet<usize> {
    set.iter()
        .map(|&i| if i >= start { i + count } else { i })
        .collect()
}

impl MediaQueue for LoopbackQueue {
    fn item_ids(&self) -> Vec<i32> {
        self.state.lock().items.iter().map(|i| i.item_id).collect()
    }

    fn item_count(&self) -> usize {
        self.state.lock().items.len()
    }

    fn index_of_item_id(&self, item_id: i32) -> Option<usize> {
        self.state
            .lock()
            .items
            .iter()
            .position(|item| item.item_id == item_id)
    }

    fn item_at_index(&self, index: usize, fetch_if_missing: bool) -> Option<QueueItem> {
        let mut state = self.state.lock();
        if index >= state.items.len() {
            return None;
        }
        if state.cached.contains(&index) {
            return state.items.get(index).cloned();
        }
        if fetch_if_missing {
            state.pending.insert(index);
        }
        None
    }

    fn register_callback(&self, listener: QueueListener) -> Registration {
        self.listeners.add(listener)
    }
}

// ============================================================================
// Remote media client
// ============================================================================

/// Remote media client backed by a [`LoopbackQueue`].
pub struct LoopbackMediaClient {
    status: Mutex<Option<MediaStatus>>,
    queue: Arc<LoopbackQueue>,
    listeners: Listeners<ClientEvent>,
    next_load_failure: Mutex<Option<ProviderStatus>>,
    next_media_session_id: AtomicI64,
    loads: Mutex<Vec<LoadRequest>>,
    commands: Mutex<Vec<String>>,
}

impl LoopbackMediaClient {
    fn new() -> Self {
        Self {
            status: Mutex::new(None),
            queue: Arc::new(LoopbackQueue::new()),
            listeners: Listeners::new(),
            next_load_failure: Mutex::new(None),
            next_media_session_id: AtomicI64::new(1),
            loads: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self) -> Arc<LoopbackQueue> {
        self.queue.clone()
    }

    /// Make the next `load` fail with `status`.
    pub fn fail_next_load(&self, status: ProviderStatus) {
        *self.next_load_failure.lock() = Some(status);
    }

    /// Replace the status without notifying.
    pub fn set_status(&self, status: Option<MediaStatus>) {
        *self.status.lock() = status;
    }

    /// Apply `update` to the current status (creating one if absent) and
    /// report `StatusUpdated`.
    pub fn update_status(&self, update: impl FnOnce(&mut MediaStatus)) {
        {
            let mut status = self.status.lock();
            let status = status.get_or_insert_with(MediaStatus::default);
            update(status);
        }
        self.listeners.notify(ClientEvent::StatusUpdated);
    }

    pub fn emit(&self, event: ClientEvent) {
        self.listeners.notify(event);
    }

    pub fn loads(&self) -> Vec<LoadRequest> {
        self.loads.lock().clone()
    }

    /// Playback commands received so far (`play`, `pause`, `seek:<ms>`, `next`).
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }
}

impl RemoteMediaClient for LoopbackMediaClient {
    fn media_status(&self) -> Option<MediaStatus> {
        self.status.lock().clone()
    }

    fn media_queue(&self) -> Arc<dyn MediaQueue> {
        self.queue.clone()
    }

    fn register_callback(&self, listener: ClientListener) -> Registration {
        self.listeners.add(listener)
    }

    fn load(&self, request: LoadRequest, done: StatusCallback) {
        self.loads.lock().push(request.clone());

        if let Some(failure) = self.next_load_failure.lock().take() {
            debug!(code = failure.code, "Loopback load rejected");
            done(failure);
            return;
        }

        let item_id = self.queue.allocate_item_id();
        let media_session_id = self.next_media_session_id.fetch_add(1, Ordering::SeqCst);
        self.queue.reload(vec![QueueItem {
            item_id,
            media: Some(request.media.clone()),
            autoplay: request.autoplay,
            start_time: request.current_time_ms as f64 / 1000.0,
            custom_data: request.custom_data.clone(),
        }]);

        self.update_status(|status| {
            status.media_session_id = media_session_id;
            status.player_state = if request.autoplay {
                PlayerState::Playing
            } else {
                PlayerState::Paused
            };
            status.idle_reason = None;
            status.current_item_id = Some(item_id);
            status.stream_position_ms = request.current_time_ms;
            status.playback_rate = 1.0;
            status.media = Some(request.media.clone());
            status.custom_data = request.custom_data.clone();
        });

        done(ProviderStatus::success());
    }

    fn play(&self) {
        self.commands.lock().push("play".to_string());
        self.update_status(|status| status.player_state = PlayerState::Playing);
    }

    fn pause(&self) {
        self.commands.lock().push("pause".to_string());
        self.update_status(|status| status.player_state = PlayerState::Paused);
    }

    fn seek(&self, position_ms: i64) {
        self.commands.lock().push(format!("seek:{position_ms}"));
        self.update_status(|status| status.stream_position_ms = position_ms);
    }

    fn queue_next(&self) {
        self.commands.lock().push("next".to_string());

        let current = self.status.lock().as_ref().and_then(|s| s.current_item_id);
        let next = current
            .and_then(|id| self.queue.index_of_item_id(id))
            .and_then(|index| self.queue.item_id_at(index + 1));

        if let Some(next_id) = next {
            self.update_status(|status| {
                status.player_state = PlayerState::Loading;
                status.current_item_id = Some(next_id);
            });
            self.update_status(|status| status.player_state = PlayerState::Playing);
        }
        self.listeners.notify(ClientEvent::QueueStatusUpdated);
    }
}

// ============================================================================
// Session
// ============================================================================

/// One loopback session.
pub struct LoopbackSession {
    info: Mutex<SessionInfo>,
    connected: AtomicBool,
    client: Option<Arc<LoopbackMediaClient>>,
    app_listeners: Listeners<ApplicationEvent>,
    message_listeners: Mutex<HashMap<String, (Registration, MessageListener)>>,
    sent: Mutex<Vec<(String, String)>>,
    next_send_failure: Mutex<Option<ProviderStatus>>,
}

impl LoopbackSession {
    /// New connected session. `with_media` controls whether the receiver app
    /// exposes a remote media client.
    pub fn new(app_id: &str, device_name: &str, with_media: bool) -> Self {
        Self {
            info: Mutex::new(SessionInfo {
                session_id: Uuid::new_v4().to_string(),
                app_id: app_id.to_string(),
                display_name: Some("Loopback Receiver".to_string()),
                status_text: Some("Ready To Cast".to_string()),
                receiver: ReceiverInfo {
                    friendly_name: device_name.to_string(),
                    label: format!("loopback-{}", device_name.to_lowercase().replace(' ', "-")),
                    volume: Volume::default(),
                },
            }),
            connected: AtomicBool::new(true),
            client: with_media.then(|| Arc::new(LoopbackMediaClient::new())),
            app_listeners: Listeners::new(),
            message_listeners: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            next_send_failure: Mutex::new(None),
        }
    }

    /// Concrete client handle for driving the receiver.
    pub fn client(&self) -> Option<Arc<LoopbackMediaClient>> {
        self.client.clone()
    }

    /// Deliver an application callback to the registered listeners.
    pub fn emit_application(&self, event: ApplicationEvent) {
        if let ApplicationEvent::Disconnected { .. } = event {
            self.connected.store(false, Ordering::SeqCst);
        }
        self.app_listeners.notify(event);
    }

    pub fn set_status_text(&self, text: &str) {
        self.info.lock().status_text = Some(text.to_string());
    }

    pub fn set_volume(&self, level: f64, muted: bool) {
        self.info.lock().receiver.volume = Volume { level, muted };
    }

    /// Simulate a message from the receiver application.
    pub fn receive_message(&self, namespace: &str, message: &str) -> bool {
        let listener = self
            .message_listeners
            .lock()
            .get(namespace)
            .filter(|(registration, _)| !registration.is_cancelled())
            .map(|(_, listener)| listener.clone());

        match listener {
            Some(listener) => {
                listener(namespace, message);
                true
            }
            None => false,
        }
    }

    /// Make the next `send_message` fail with `status`.
    pub fn fail_next_send(&self, status: ProviderStatus) {
        *self.next_send_failure.lock() = Some(status);
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.app_listeners.active()
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl CastSession for LoopbackSession {
    fn session_id(&self) -> String {
        self.info.lock().session_id.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn info(&self) -> SessionInfo {
        self.info.lock().clone()
    }

    fn remote_media_client(&self) -> Option<Arc<dyn RemoteMediaClient>> {
        self.client
            .clone()
            .map(|client| client as Arc<dyn RemoteMediaClient>)
    }

    fn add_application_listener(&self, listener: ApplicationListener) -> Registration {
        self.app_listeners.add(listener)
    }

    fn send_message(&self, namespace: &str, message: &str, done: StatusCallback) {
        if let Some(failure) = self.next_send_failure.lock().take() {
            done(failure);
            return;
        }
        self.sent
            .lock()
            .push((namespace.to_string(), message.to_string()));
        done(ProviderStatus::success());
    }

    fn set_message_received_callback(
        &self,
        namespace: &str,
        listener: MessageListener,
    ) -> Result<Registration> {
        let registration = Registration::new();
        let previous = self
            .message_listeners
            .lock()
            .insert(namespace.to_string(), (registration.clone(), listener));
        if let Some((old, _)) = previous {
            old.cancel();
        }
        Ok(registration)
    }
}

// ============================================================================
// Context
// ============================================================================

/// What the route chooser does on the next `request_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestScript {
    /// Join a new media-capable session.
    #[default]
    Join,
    Cancel,
    Fail(i32),
}

/// Session manager for loopback sessions.
pub struct LoopbackCastContext {
    device_name: String,
    app_id: Mutex<String>,
    current: Mutex<Option<Arc<LoopbackSession>>>,
    listeners: Listeners<ContextEvent>,
    script: Mutex<RequestScript>,
}

impl LoopbackCastContext {
    pub fn new(device_name: &str) -> Self {
        Self {
            device_name: device_name.to_string(),
            app_id: Mutex::new("CC1AD845".to_string()),
            current: Mutex::new(None),
            listeners: Listeners::new(),
            script: Mutex::new(RequestScript::Join),
        }
    }

    pub fn set_app_id(&self, app_id: &str) {
        *self.app_id.lock() = app_id.to_string();
    }

    pub fn script_next_request(&self, script: RequestScript) {
        *self.script.lock() = script;
    }

    /// Start a session as if another sender (or a previous app run) joined
    /// the receiver, and report `SessionStarted`.
    pub fn start_session(&self) -> Arc<LoopbackSession> {
        let session = Arc::new(LoopbackSession::new(
            &self.app_id.lock(),
            &self.device_name,
            true,
        ));
        *self.current.lock() = Some(session.clone());
        self.listeners
            .notify(ContextEvent::SessionStarted(session.clone()));
        session
    }

    /// Install a session without reporting it.
    pub fn adopt_session(&self, session: Arc<LoopbackSession>) {
        *self.current.lock() = Some(session);
    }

    /// Report a suspension of the current session (e.g. Wi-Fi loss).
    pub fn suspend_session(&self, reason: i32) {
        if let Some(session) = self.current.lock().clone() {
            self.listeners.notify(ContextEvent::SessionSuspended {
                session_id: session.session_id(),
                reason,
            });
        }
    }

    /// Report that the suspended session came back.
    pub fn resume_session(&self) {
        if let Some(session) = self.current.lock().clone() {
            self.listeners.notify(ContextEvent::SessionResumed {
                session,
                was_suspended: true,
            });
        }
    }

    pub fn set_receiver_availability(&self, available: bool) {
        self.listeners
            .notify(ContextEvent::ReceiverAvailability { available });
    }

    pub fn loopback_session(&self) -> Option<Arc<LoopbackSession>> {
        self.current.lock().clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }
}

impl CastContext for LoopbackCastContext {
    fn current_session(&self) -> Option<Arc<dyn CastSession>> {
        self.current
            .lock()
            .clone()
            .map(|session| session as Arc<dyn CastSession>)
    }

    fn request_session(&self, done: SessionRequestCallback) {
        let script = std::mem::take(&mut *self.script.lock());
        match script {
            RequestScript::Join => {
                let session = self.start_session();
                done(SessionRequestOutcome::Joined(session));
            }
            RequestScript::Cancel => done(SessionRequestOutcome::Cancelled),
            RequestScript::Fail(code) => {
                self.listeners
                    .notify(ContextEvent::SessionStartFailed { error_code: code });
                done(SessionRequestOutcome::Failed(ProviderStatus::failure(
                    code,
                    "Loopback session request failed",
                )));
            }
        }
    }

    fn end_session(&self, stop_casting: bool) {
        let Some(session) = self.current.lock().take() else {
            return;
        };
        debug!(stop_casting, session_id = %session.session_id(), "Ending loopback session");
        session.disconnect();
        self.listeners.notify(ContextEvent::SessionEnded {
            session_id: session.session_id(),
            error_code: 0,
        });
    }

    fn add_context_listener(&self, listener: ContextListener) -> Registration {
        self.listeners.add(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::cast::{MediaInfo, StreamType};

    fn item(id: i32) -> QueueItem {
        QueueItem {
            item_id: id,
            media: None,
            autoplay: true,
            start_time: 0.0,
            custom_data: None,
        }
    }

    fn recording_queue_listener(queue: &LoopbackQueue) -> (Arc<Mutex<Vec<QueueEvent>>>, Registration) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let registration = queue.register_callback(Arc::new(move |event| sink.lock().push(event)));
        (events, registration)
    }

    #[test]
    fn test_queue_lookup_is_lazy() {
        let queue = LoopbackQueue::new();
        queue.reload(vec![item(10), item(11), item(12)]);

        assert_eq!(queue.item_at_index(1, true), None);
        assert_eq!(queue.item_at_index(2, false), None);
        assert_eq!(queue.pending_fetches(), vec![1]);

        assert_eq!(queue.deliver_pending(), vec![1]);
        assert_eq!(queue.item_at_index(1, false).map(|i| i.item_id), Some(11));
        assert_eq!(queue.item_at_index(5, true), None);
    }

    #[test]
    fn test_queue_notifications_and_cancellation() {
        let queue = LoopbackQueue::new();
        let (events, registration) = recording_queue_listener(&queue);

        queue.reload(vec![item(1), item(2)]);
        queue.insert(1, vec![item(3)]);
        queue.remove(vec![0]);
        registration.cancel();
        queue.reload(vec![]);

        assert_eq!(
            *events.lock(),
            vec![
                QueueEvent::ItemsReloaded,
                QueueEvent::ItemsInsertedInRange { start: 1, count: 1 },
                QueueEvent::ItemsRemovedAtIndexes(vec![0]),
            ]
        );
        assert_eq!(queue.item_ids(), Vec::<i32>::new());
        assert_eq!(queue.active_listeners(), 0);
    }

    #[test]
    fn test_insert_shifts_cached_indexes() {
        let queue = LoopbackQueue::new();
        queue.reload(vec![item(1), item(2)]);
        queue.preload_all();

        queue.insert(0, vec![item(9)]);

        assert_eq!(queue.item_at_index(0, false), None);
        assert_eq!(queue.item_at_index(1, false).map(|i| i.item_id), Some(1));
        assert_eq!(queue.index_of_item_id(2), Some(2));
    }

    #[test]
    fn test_load_replaces_queue_and_reports_status() {
        let client = LoopbackMediaClient::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.register_callback(Arc::new(move |event| sink.lock().push(event)));

        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();
        client.load(
            LoadRequest {
                media: MediaInfo {
                    content_id: "https://example.com/a.mp4".into(),
                    content_type: "video/mp4".into(),
                    stream_type: StreamType::Buffered,
                    ..Default::default()
                },
                autoplay: true,
                current_time_ms: 5_000,
                custom_data: None,
            },
            Box::new(move |status| *slot.lock() = Some(status)),
        );

        assert_eq!(*result.lock(), Some(ProviderStatus::success()));
        assert_eq!(*events.lock(), vec![ClientEvent::StatusUpdated]);
        let status = client.media_status().unwrap();
        assert_eq!(status.player_state, PlayerState::Playing);
        assert_eq!(status.stream_position_ms, 5_000);
        assert_eq!(client.queue().item_count(), 1);
    }

    #[test]
    fn test_load_failure_leaves_state_untouched() {
        let client = LoopbackMediaClient::new();
        client.fail_next_load(ProviderStatus::failure(2100, "LOAD_FAILED"));

        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();
        client.load(
            LoadRequest {
                media: MediaInfo::default(),
                autoplay: false,
                current_time_ms: 0,
                custom_data: None,
            },
            Box::new(move |status| *slot.lock() = Some(status)),
        );

        assert_eq!(result.lock().as_ref().map(|s| s.code), Some(2100));
        assert!(client.media_status().is_none());
        assert_eq!(client.loads().len(), 1);
    }

    #[test]
    fn test_session_message_routing() {
        let session = LoopbackSession::new("CC1AD845", "Living Room", true);
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        session
            .set_message_received_callback(
                "urn:x-cast:test",
                Arc::new(move |ns: &str, msg: &str| sink.lock().push((ns.to_string(), msg.to_string()))),
            )
            .unwrap();

        assert!(session.receive_message("urn:x-cast:test", "hello"));
        assert!(!session.receive_message("urn:x-cast:other", "ignored"));
        assert_eq!(
            *received.lock(),
            vec![("urn:x-cast:test".to_string(), "hello".to_string())]
        );
        assert_eq!(session.info().receiver.label, "loopback-living-room");
    }

    #[test]
    fn test_request_session_scripts() {
        let context = LoopbackCastContext::new("TV");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        context.add_context_listener(Arc::new(move |event| sink.lock().push(format!("{:?}", event))));

        context.script_next_request(RequestScript::Cancel);
        context.request_session(Box::new(|outcome| {
            assert!(matches!(outcome, SessionRequestOutcome::Cancelled))
        }));
        assert!(context.current_session().is_none());

        context.request_session(Box::new(|outcome| {
            assert!(matches!(outcome, SessionRequestOutcome::Joined(_)))
        }));
        assert!(context.current_session().is_some());

        context.end_session(true);
        assert!(context.current_session().is_none());

        let events = events.lock();
        assert!(events[0].starts_with("SessionStarted"));
        assert!(events[1].starts_with("SessionEnded"));
    }
}
