//! # Session Lifecycle Controller
//!
//! Owns the single active Cast session and turns the provider's callback
//! storm into a consistent stream of snapshots for the [`CastListener`].
//!
//! ## Execution model
//!
//! ```text
//!  caller ──command──┐
//!                    v
//!  provider ──cb──> MainThreadExecutor ──> SessionCore (one message at a time)
//!                                               │
//!                                               └─effects─> CastListener
//! ```
//!
//! Nothing calls into the controller state re-entrantly: every provider
//! callback and every caller command is converted to a [`ControllerMessage`]
//! and posted to the main-thread executor. The state lock is released before
//! listener notifications run.
//!
//! ## Session scope
//!
//! Each attached session gets its own `CancellationToken`. Callbacks created
//! for the session check it before posting and the core checks it again
//! before handling, so stale deliveries from a replaced session are dropped.
//! Provider registrations are cancelled at the same time.
//!
//! ## Status gating
//!
//! While a load is in flight, or a queue continuation or queue-status
//! acknowledgment is pending, status updates are dropped. The queue settle
//! (or the acknowledgment) produces the next snapshot instead.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use bridge_traits::cast::{
    ApplicationEvent, CastSession, ClientEvent, IdleReason, LoadRequest, MediaStatus,
    PlayerState, ProviderStatus, QueueEvent, Registration,
};
use bridge_traits::{Clock, MainThreadExecutor};
use core_async::sync::{oneshot, CancellationToken};
use core_runtime::model::{MediaSnapshot, SessionDescription, SessionStatus};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::adapter::MediaClientAdapter;
use crate::channel::MessageChannel;
use crate::error::{CastError, Result};
use crate::listener::CastListener;
use crate::queue::{QueueOutcome, QueueReconciler};
use crate::snapshot::{describe_session, SnapshotBuilder};

// ============================================================================
// Replies
// ============================================================================

/// Future resolved once the main thread has answered a command.
#[must_use = "a reply does nothing unless awaited"]
pub struct Reply<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Reply<T> {
    fn channel() -> (oneshot::Sender<Result<T>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    fn ready(result: Result<T>) -> Self {
        let (sender, reply) = Self::channel();
        let _ = sender.send(result);
        reply
    }
}

impl<T> Future for Reply<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(CastError::Bridge(
                    "main-thread job dropped before replying".to_string(),
                ))
            })
        })
    }
}

/// Resolves with the settled snapshot of a `load_media` call.
pub type LoadHandle = Reply<Arc<MediaSnapshot>>;

// ============================================================================
// Messages
// ============================================================================

/// Work item processed on the main-thread executor.
pub(crate) enum ControllerMessage {
    SetSession(Option<Arc<dyn CastSession>>),
    /// Callback from a provider handle of the session owning `scope`.
    Provider {
        scope: CancellationToken,
        event: ProviderMessage,
    },
    Command(Command),
}

pub(crate) enum ProviderMessage {
    StatusUpdated,
    QueueStatusUpdated,
    Queue(QueueEvent),
    Application(ApplicationEvent),
    MessageReceived { namespace: String, message: String },
    LoadFinished { load_id: u64, status: ProviderStatus },
}

pub(crate) enum Command {
    Load {
        request: LoadRequest,
        reply: oneshot::Sender<Result<Arc<MediaSnapshot>>>,
    },
    Play,
    Pause,
    Seek(i64),
    QueueNext {
        ack: Option<oneshot::Sender<Result<()>>>,
    },
    SendMessage {
        namespace: String,
        message: String,
        reply: oneshot::Sender<Result<()>>,
    },
    AddMessageListener {
        namespace: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Describe {
        reply: oneshot::Sender<Result<Option<SessionDescription>>>,
    },
}

/// Post-settle work registered by whoever triggered the queue refresh.
enum Continuation {
    /// A `load_media` caller waiting for its queue.
    LoadResolve {
        load_id: u64,
        reply: oneshot::Sender<Result<Arc<MediaSnapshot>>>,
    },
    /// The queue advanced; remember the new current item once settled.
    AdvancePrevItem(Option<i32>),
    /// Media was loaded by another party.
    ExternalLoad,
}

impl Continuation {
    fn supersede(self) {
        if let Continuation::LoadResolve { reply, .. } = self {
            let _ = reply.send(Err(CastError::SessionReplaced));
        }
    }
}

/// Listener notification produced while the state lock is held.
enum Effect {
    MediaLoaded(Arc<MediaSnapshot>),
    MediaUpdate(Arc<MediaSnapshot>),
    SessionUpdate(SessionDescription),
    SessionEnd(SessionDescription),
    Message {
        device_id: String,
        namespace: String,
        message: String,
    },
}

// ============================================================================
// Posting
// ============================================================================

#[derive(Clone)]
struct Poster {
    shared: Weak<Shared>,
    executor: Arc<dyn MainThreadExecutor>,
}

impl Poster {
    fn post(&self, message: ControllerMessage) -> Result<()> {
        let shared = self.shared.clone();
        self.executor.execute(Box::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.handle(message);
            }
        }))?;
        Ok(())
    }

    fn scoped(&self, scope: &CancellationToken) -> ScopedPoster {
        ScopedPoster {
            poster: self.clone(),
            scope: scope.clone(),
        }
    }
}

/// Poster bound to one session. Silent once the session is replaced.
#[derive(Clone)]
struct ScopedPoster {
    poster: Poster,
    scope: CancellationToken,
}

impl ScopedPoster {
    fn post(&self, event: ProviderMessage) {
        if self.scope.is_cancelled() {
            trace!("Dropping callback of a replaced session");
            return;
        }
        let message = ControllerMessage::Provider {
            scope: self.scope.clone(),
            event,
        };
        if let Err(err) = self.poster.post(message) {
            warn!(error = %err, "Failed to post provider callback");
        }
    }
}

// ============================================================================
// Session state
// ============================================================================

struct ActiveSession {
    session: Arc<dyn CastSession>,
    session_id: String,
    scope: CancellationToken,
    events: ScopedPoster,
    registrations: Vec<Registration>,
    adapter: MediaClientAdapter,
    channel: MessageChannel,
    reconciler: Option<QueueReconciler>,
    snapshots: SnapshotBuilder,
    /// `None` until the first status after attach seeds it.
    prev_item_id: Option<Option<i32>>,
    continuation: Option<Continuation>,
    queue_status_ack: Option<oneshot::Sender<Result<()>>>,
    loads_in_flight: usize,
    next_load_id: u64,
}

impl ActiveSession {
    fn attach(session: Arc<dyn CastSession>, clock: Arc<dyn Clock>, poster: &Poster) -> Self {
        let scope = CancellationToken::new();
        let events = poster.scoped(&scope);
        let client = session.remote_media_client();
        let mut registrations = Vec::new();

        let app_events = events.clone();
        registrations.push(session.add_application_listener(Arc::new(move |event: ApplicationEvent| {
            app_events.post(ProviderMessage::Application(event))
        })));

        let reconciler = client.as_ref().map(|client| {
            let client_events = events.clone();
            registrations.push(client.register_callback(Arc::new(move |event: ClientEvent| {
                client_events.post(match event {
                    ClientEvent::StatusUpdated => ProviderMessage::StatusUpdated,
                    ClientEvent::QueueStatusUpdated => ProviderMessage::QueueStatusUpdated,
                })
            })));

            let queue = client.media_queue();
            let queue_events = events.clone();
            registrations.push(queue.register_callback(Arc::new(move |event: QueueEvent| {
                queue_events.post(ProviderMessage::Queue(event))
            })));
            QueueReconciler::new(queue)
        });

        let session_id = session.session_id();
        info!(
            session_id = %session_id,
            media = client.is_some(),
            "Attached cast session"
        );

        Self {
            session_id,
            scope,
            events,
            registrations,
            adapter: MediaClientAdapter::new(client),
            channel: MessageChannel::new(Some(session.clone())),
            session,
            reconciler,
            snapshots: SnapshotBuilder::new(clock),
            prev_item_id: None,
            continuation: None,
            queue_status_ack: None,
            loads_in_flight: 0,
            next_load_id: 0,
        }
    }

    /// Cancel everything tied to this session.
    fn close(mut self) {
        self.scope.cancel();
        for registration in &self.registrations {
            registration.cancel();
        }
        if let Some(continuation) = self.continuation.take() {
            continuation.supersede();
        }
        if let Some(ack) = self.queue_status_ack.take() {
            let _ = ack.send(Err(CastError::SessionReplaced));
        }
        info!(session_id = %self.session_id, "Detached cast session");
    }

    fn describe(&self, status: SessionStatus) -> SessionDescription {
        describe_session(
            self.session.as_ref(),
            status,
            self.snapshots.last().as_deref(),
        )
    }

    fn set_continuation(&mut self, continuation: Continuation) {
        if let Some(previous) = self.continuation.replace(continuation) {
            debug!("Replacing pending queue continuation");
            previous.supersede();
        }
    }

    fn status_gated(&self) -> bool {
        self.loads_in_flight > 0 || self.continuation.is_some() || self.queue_status_ack.is_some()
    }

    fn settled_items(&self) -> &[core_runtime::model::QueueItemSnapshot] {
        self.reconciler
            .as_ref()
            .map(|reconciler| reconciler.settled_items())
            .unwrap_or_default()
    }

    fn build_snapshot(&mut self, status: Option<&MediaStatus>) -> Arc<MediaSnapshot> {
        let items = self.settled_items().to_vec();
        self.snapshots.build(&self.session_id, status, &items)
    }

    fn build_idle(&mut self, reason: IdleReason, status: Option<&MediaStatus>) -> Arc<MediaSnapshot> {
        let items = self.settled_items().to_vec();
        self.snapshots
            .build_idle(reason, &self.session_id, status, &items)
    }

    // ------------------------------------------------------------------------
    // Provider callbacks
    // ------------------------------------------------------------------------

    fn on_status_updated(&mut self, effects: &mut Vec<Effect>) {
        if self.status_gated() {
            trace!(
                loads_in_flight = self.loads_in_flight,
                continuation = self.continuation.is_some(),
                "Status update gated"
            );
            return;
        }

        let status = self.adapter.media_status();
        if let Some(status) = &status {
            let prev_item_id = *self.prev_item_id.get_or_insert(status.current_item_id);

            if status.player_state == PlayerState::Loading {
                // The queue is moving on; report the previous item as done.
                let snapshot = self.build_idle(IdleReason::Finished, Some(status));
                effects.push(Effect::MediaUpdate(snapshot));
                return;
            }

            if status.current_item_id != prev_item_id && self.advance_queue(status, effects) {
                return;
            }
        }

        let snapshot = self.build_snapshot(status.as_ref());
        effects.push(Effect::MediaUpdate(snapshot));
    }

    /// Refresh the queue window for a new current item. Returns `false` when
    /// the item is not in the queue.
    fn advance_queue(&mut self, status: &MediaStatus, effects: &mut Vec<Effect>) -> bool {
        let Some(reconciler) = self.reconciler.as_ref() else {
            return false;
        };
        if reconciler.index_of(status.current_item_id).is_none() {
            return false;
        }

        debug!(
            from = ?self.prev_item_id.flatten(),
            to = ?status.current_item_id,
            "Queue advanced"
        );
        self.set_continuation(Continuation::AdvancePrevItem(status.current_item_id));
        let outcome = match self.reconciler.as_mut() {
            Some(reconciler) => reconciler.refresh(status.current_item_id),
            None => return false,
        };
        self.apply_queue_outcome(outcome, effects);
        true
    }

    fn on_queue_status_updated(&mut self, effects: &mut Vec<Effect>) {
        let Some(ack) = self.queue_status_ack.take() else {
            return;
        };
        let _ = ack.send(Ok(()));

        // Status updates were gated while waiting; catch up on an advance
        // that happened meanwhile. A receiver still `LOADING` is reported as
        // finished by the status path below.
        let Some(status) = self.adapter.media_status() else {
            return;
        };
        let advanced = matches!(self.prev_item_id, Some(prev) if prev != status.current_item_id);
        if advanced && status.player_state != PlayerState::Loading && !self.status_gated() {
            let snapshot = self.build_idle(IdleReason::Finished, Some(&status));
            effects.push(Effect::MediaUpdate(snapshot));
        }
        self.on_status_updated(effects);
    }

    fn on_queue_event(&mut self, event: QueueEvent, effects: &mut Vec<Effect>) {
        let current_item_id = self
            .adapter
            .media_status()
            .and_then(|status| status.current_item_id);

        let Some(reconciler) = self.reconciler.as_ref() else {
            return;
        };
        let external_load = matches!(event, QueueEvent::ItemsReloaded)
            && reconciler.item_count() > 0
            && self.continuation.is_none();
        if external_load {
            debug!("Queue reloaded without a pending request, treating as external load");
            self.continuation = Some(Continuation::ExternalLoad);
        }

        let outcome = match self.reconciler.as_mut() {
            Some(reconciler) => reconciler.on_event(&event, current_item_id),
            None => return,
        };
        self.apply_queue_outcome(outcome, effects);
    }

    fn apply_queue_outcome(&mut self, outcome: QueueOutcome, effects: &mut Vec<Effect>) {
        let QueueOutcome::Settled(items) = outcome else {
            return;
        };

        let status = self.adapter.media_status();
        let snapshot = self
            .snapshots
            .build(&self.session_id, status.as_ref(), &items);
        debug!(items = items.len(), "Queue settled");

        let queue_populated = self
            .reconciler
            .as_ref()
            .is_some_and(|reconciler| reconciler.item_count() > 0);
        if queue_populated {
            if let Some(continuation) = self.continuation.take() {
                self.run_continuation(continuation, &snapshot, effects);
            }
        }

        effects.push(Effect::MediaUpdate(snapshot));
    }

    fn run_continuation(
        &mut self,
        continuation: Continuation,
        snapshot: &Arc<MediaSnapshot>,
        effects: &mut Vec<Effect>,
    ) {
        match continuation {
            Continuation::LoadResolve { reply, .. } => {
                let _ = reply.send(Ok(snapshot.clone()));
            }
            Continuation::AdvancePrevItem(item_id) => {
                self.prev_item_id = Some(item_id);
            }
            Continuation::ExternalLoad => effects.push(Effect::MediaLoaded(snapshot.clone())),
        }
    }

    fn on_load_finished(&mut self, load_id: u64, status: ProviderStatus) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        if status.is_success() {
            debug!(load_id, "Load accepted by receiver");
            return;
        }

        warn!(load_id, code = status.code, "Load rejected by receiver");
        let ours = matches!(
            self.continuation,
            Some(Continuation::LoadResolve { load_id: pending, .. }) if pending == load_id
        );
        if !ours {
            return;
        }
        if let Some(Continuation::LoadResolve { reply, .. }) = self.continuation.take() {
            let _ = reply.send(Err(CastError::provider(status)));
        }
    }

    fn on_application_event(&mut self, event: ApplicationEvent, effects: &mut Vec<Effect>) {
        match event {
            ApplicationEvent::Disconnected { code } => {
                info!(session_id = %self.session_id, code, "Receiver application disconnected");
                effects.push(Effect::SessionEnd(self.describe(SessionStatus::Stopped)));
            }
            other => {
                trace!(event = ?other, "Application status changed");
                effects.push(Effect::SessionUpdate(self.describe(SessionStatus::Connected)));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn load(&mut self, request: LoadRequest, reply: oneshot::Sender<Result<Arc<MediaSnapshot>>>) {
        if !self.adapter.is_attached() {
            let _ = reply.send(Err(CastError::NoActiveSession));
            return;
        }

        let load_id = self.next_load_id;
        self.next_load_id += 1;
        self.loads_in_flight += 1;
        self.set_continuation(Continuation::LoadResolve { load_id, reply });

        let events = self.events.clone();
        let started = self.adapter.load(
            request,
            Box::new(move |status| events.post(ProviderMessage::LoadFinished { load_id, status })),
        );

        if let Err(err) = started {
            self.loads_in_flight -= 1;
            if let Some(Continuation::LoadResolve { reply, .. }) = self.continuation.take() {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn queue_next(&mut self, ack: Option<oneshot::Sender<Result<()>>>) {
        if let Some(ack) = ack {
            if !self.adapter.is_attached() {
                let _ = ack.send(Err(CastError::NoActiveSession));
                return;
            }
            if let Some(previous) = self.queue_status_ack.replace(ack) {
                let _ = previous.send(Err(CastError::SessionReplaced));
            }
        }

        if let Err(err) = self.adapter.queue_next() {
            debug!(error = %err, "queue next ignored");
        }
    }

    fn add_message_listener(&mut self, namespace: String) -> Result<()> {
        if !self.adapter.is_attached() {
            return Err(CastError::NoActiveSession);
        }

        let events = self.events.clone();
        let registration = self.channel.listen(
            &namespace,
            Arc::new(move |namespace: &str, message: &str| {
                events.post(ProviderMessage::MessageReceived {
                    namespace: namespace.to_string(),
                    message: message.to_string(),
                })
            }),
        )?;
        self.registrations.push(registration);
        Ok(())
    }
}

fn same_session(current: &Arc<dyn CastSession>, candidate: &Arc<dyn CastSession>) -> bool {
    Arc::ptr_eq(current, candidate) || current.session_id() == candidate.session_id()
}

struct SessionCore {
    clock: Arc<dyn Clock>,
    active: Option<ActiveSession>,
}

impl SessionCore {
    fn process(&mut self, message: ControllerMessage, poster: &Poster) -> Vec<Effect> {
        let mut effects = Vec::new();
        match message {
            ControllerMessage::SetSession(session) => self.set_session(session, poster),
            ControllerMessage::Provider { scope, event } => {
                if scope.is_cancelled() {
                    trace!("Dropping queued callback of a replaced session");
                    return effects;
                }
                self.on_provider(event, &mut effects);
            }
            ControllerMessage::Command(command) => self.on_command(command),
        }
        effects
    }

    fn set_session(&mut self, session: Option<Arc<dyn CastSession>>, poster: &Poster) {
        let Some(session) = session else {
            if let Some(previous) = self.active.take() {
                previous.close();
            }
            return;
        };

        if let Some(active) = &self.active {
            if same_session(&active.session, &session) {
                debug!(session_id = %active.session_id, "Session already active");
                return;
            }
        }

        if let Some(previous) = self.active.take() {
            previous.close();
        }
        self.active = Some(ActiveSession::attach(session, self.clock.clone(), poster));
    }

    fn on_provider(&mut self, event: ProviderMessage, effects: &mut Vec<Effect>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        match event {
            ProviderMessage::StatusUpdated => active.on_status_updated(effects),
            ProviderMessage::QueueStatusUpdated => active.on_queue_status_updated(effects),
            ProviderMessage::Queue(event) => active.on_queue_event(event, effects),
            ProviderMessage::LoadFinished { load_id, status } => {
                active.on_load_finished(load_id, status)
            }
            ProviderMessage::MessageReceived { namespace, message } => {
                effects.push(Effect::Message {
                    device_id: active.session.info().receiver.label,
                    namespace,
                    message,
                });
            }
            ProviderMessage::Application(event) => {
                let disconnected = matches!(event, ApplicationEvent::Disconnected { .. });
                active.on_application_event(event, effects);
                if disconnected {
                    if let Some(ended) = self.active.take() {
                        ended.close();
                    }
                }
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        let active = self.active.as_mut();
        match command {
            Command::Load { request, reply } => match active {
                Some(active) => active.load(request, reply),
                None => {
                    let _ = reply.send(Err(CastError::NoActiveSession));
                }
            },
            Command::Play => run_playback(active, "play", MediaClientAdapter::play),
            Command::Pause => run_playback(active, "pause", MediaClientAdapter::pause),
            Command::Seek(position_ms) => {
                run_playback(active, "seek", |adapter| adapter.seek(position_ms))
            }
            Command::QueueNext { ack } => match active {
                Some(active) => active.queue_next(ack),
                None => match ack {
                    Some(ack) => {
                        let _ = ack.send(Err(CastError::NoActiveSession));
                    }
                    None => debug!("queue next ignored, no active session"),
                },
            },
            Command::SendMessage {
                namespace,
                message,
                reply,
            } => {
                let channel = active
                    .filter(|active| active.adapter.is_attached())
                    .map(|active| active.channel.clone())
                    .unwrap_or_default();
                channel.send(&namespace, &message, move |result| {
                    let _ = reply.send(result);
                });
            }
            Command::AddMessageListener { namespace, reply } => {
                let result = match active {
                    Some(active) => active.add_message_listener(namespace),
                    None => Err(CastError::NoActiveSession),
                };
                let _ = reply.send(result);
            }
            Command::Describe { reply } => {
                let description = active.map(|active| {
                    let status = if active.session.is_connected() {
                        SessionStatus::Connected
                    } else {
                        SessionStatus::Stopped
                    };
                    active.describe(status)
                });
                let _ = reply.send(Ok(description));
            }
        }
    }
}

fn run_playback(
    active: Option<&mut ActiveSession>,
    name: &str,
    command: impl FnOnce(&MediaClientAdapter) -> Result<()>,
) {
    let Some(active) = active else {
        debug!(command = name, "Ignored, no active session");
        return;
    };
    if let Err(err) = command(&active.adapter) {
        debug!(command = name, error = %err, "Ignored");
    }
}

// ============================================================================
// Controller
// ============================================================================

struct Shared {
    poster: Poster,
    listener: Arc<dyn CastListener>,
    core: Mutex<SessionCore>,
}

impl Shared {
    fn handle(&self, message: ControllerMessage) {
        let effects = self.core.lock().process(message, &self.poster);
        for effect in effects {
            self.dispatch(effect);
        }
    }

    fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::MediaLoaded(snapshot) => self.listener.on_media_loaded(snapshot),
            Effect::MediaUpdate(snapshot) => self.listener.on_media_update(snapshot),
            Effect::SessionUpdate(description) => self.listener.on_session_update(description),
            Effect::SessionEnd(description) => self.listener.on_session_end(description),
            Effect::Message {
                device_id,
                namespace,
                message,
            } => self
                .listener
                .on_message_received(&device_id, &namespace, &message),
        }
    }
}

/// Handle to the session controller. Cheap to clone.
///
/// Every method returns without blocking. Provider work happens later on the
/// main-thread executor; methods with a result hand back a [`Reply`].
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        executor: Arc<dyn MainThreadExecutor>,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn CastListener>,
    ) -> Self {
        let shared = Arc::new_cyclic(|weak| Shared {
            poster: Poster {
                shared: weak.clone(),
                executor,
            },
            listener,
            core: Mutex::new(SessionCore {
                clock,
                active: None,
            }),
        });
        Self { shared }
    }

    fn post(&self, message: ControllerMessage) -> Result<()> {
        self.shared.poster.post(message)
    }

    fn command<T>(&self, build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Reply<T> {
        let (sender, reply) = Reply::channel();
        if let Err(err) = self.post(ControllerMessage::Command(build(sender))) {
            return Reply::ready(Err(err));
        }
        reply
    }

    /// Make `session` the active session, or clear it with `None`.
    ///
    /// Setting the session that is already active is a no-op.
    pub fn set_session(&self, session: Option<Arc<dyn CastSession>>) -> Result<()> {
        self.post(ControllerMessage::SetSession(session))
    }

    /// Whether a session is attached right now.
    pub fn has_session(&self) -> bool {
        self.shared.core.lock().active.is_some()
    }

    pub fn has_media_client(&self) -> bool {
        self.shared
            .core
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| active.adapter.is_attached())
    }

    pub fn session_id(&self) -> Option<String> {
        self.shared
            .core
            .lock()
            .active
            .as_ref()
            .map(|active| active.session_id.clone())
    }

    /// Last snapshot handed to the listener for the active session.
    pub fn last_snapshot(&self) -> Option<Arc<MediaSnapshot>> {
        self.shared
            .core
            .lock()
            .active
            .as_ref()
            .and_then(|active| active.snapshots.last())
    }

    /// Load media and resolve with the first snapshot after its queue settles.
    ///
    /// Fails immediately with [`CastError::NoActiveSession`] when no media
    /// session is attached, with [`CastError::Provider`] when the receiver
    /// rejects the load, and with [`CastError::SessionReplaced`] when a newer
    /// load or session supersedes this one.
    pub fn load_media(&self, request: LoadRequest) -> LoadHandle {
        if !self.has_media_client() {
            return Reply::ready(Err(CastError::NoActiveSession));
        }
        self.command(|reply| Command::Load { request, reply })
    }

    pub fn play(&self) -> Result<()> {
        self.post(ControllerMessage::Command(Command::Play))
    }

    pub fn pause(&self) -> Result<()> {
        self.post(ControllerMessage::Command(Command::Pause))
    }

    /// Seek to `position_ms` milliseconds.
    pub fn seek(&self, position_ms: i64) -> Result<()> {
        if position_ms < 0 {
            return Err(CastError::InvalidArgument(format!(
                "seek position must not be negative, got {position_ms}"
            )));
        }
        self.post(ControllerMessage::Command(Command::Seek(position_ms)))
    }

    /// Skip to the next queue item without waiting for the receiver.
    pub fn queue_next(&self) -> Result<()> {
        self.post(ControllerMessage::Command(Command::QueueNext { ack: None }))
    }

    /// Skip to the next queue item and resolve once the receiver reports a
    /// queue status change.
    pub fn queue_next_acknowledged(&self) -> Reply<()> {
        if !self.has_media_client() {
            return Reply::ready(Err(CastError::NoActiveSession));
        }
        self.command(|ack| Command::QueueNext { ack: Some(ack) })
    }

    /// Send a message on a custom namespace. Needs a session with a media
    /// client, like every other receiver command.
    pub fn send_message(&self, namespace: &str, message: &str) -> Reply<()> {
        if !self.has_media_client() {
            return Reply::ready(Err(CastError::NoActiveSession));
        }
        let namespace = namespace.to_string();
        let message = message.to_string();
        self.command(|reply| Command::SendMessage {
            namespace,
            message,
            reply,
        })
    }

    /// Forward receiver messages on `namespace` to the listener.
    pub fn add_message_listener(&self, namespace: &str) -> Reply<()> {
        if namespace.trim().is_empty() {
            return Reply::ready(Err(CastError::InvalidArgument(
                "namespace is required".to_string(),
            )));
        }
        let namespace = namespace.to_string();
        self.command(|reply| Command::AddMessageListener { namespace, reply })
    }

    /// Description of the active session, as seen from the main thread.
    pub fn describe(&self) -> Reply<Option<SessionDescription>> {
        self.command(|reply| Command::Describe { reply })
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session_id", &self.session_id())
            .finish()
    }
}
