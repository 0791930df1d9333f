//! # Cast Service
//!
//! Plugin-call façade over the session controller.
//!
//! ## Overview
//!
//! `CastService` is what the host plugin layer talks to. It
//! - listens to the host `CastContext` and keeps the controller's active
//!   session in step with the session manager
//! - turns plugin arguments into provider requests (see [`LoadMediaParams`])
//! - publishes every state change as a [`CoreEvent`] on its [`EventBus`]
//!
//! Calls into the host SDK are posted to the configured
//! `MainThreadExecutor`; nothing here blocks the calling thread.
//!
//! ## Usage
//!
//! ```ignore
//! let service = CastService::new(config, context);
//! let mut events = service.subscribe();
//! service.initialize()?;
//!
//! let session = service.request_session().await?;
//! let snapshot = service
//!     .load_media(LoadMediaParams::new("https://cdn.example.com/movie.mp4"))
//!     .await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use bridge_traits::cast::{
    CastContext, CastSession, ContextEvent, Registration, SessionRequestOutcome,
};
use core_async::sync::oneshot;
use core_cast::snapshot::describe_session;
use core_cast::{CastError, EventBusListener, SessionController};
use core_runtime::config::CastConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver, ReceiverEvent, SessionEvent};
use core_runtime::logging::{init_logging, redact_if_sensitive, redact_url_query, LoggingConfig};
use core_runtime::model::{MediaSnapshot, SessionDescription, SessionStatus};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::params::{LoadMediaParams, SecureHlsParams, SendMessageResult};

pub struct CastService {
    config: CastConfig,
    context: Arc<dyn CastContext>,
    events: EventBus,
    controller: SessionController,
    context_registration: Mutex<Option<Registration>>,
}

impl CastService {
    pub fn new(config: CastConfig, context: Arc<dyn CastContext>) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        let controller = SessionController::new(
            config.main_thread_executor.clone(),
            config.clock.clone(),
            Arc::new(EventBusListener::new(events.clone())),
        );

        Self {
            config,
            context,
            events,
            controller,
            context_registration: Mutex::new(None),
        }
    }

    /// Install the global tracing subscriber, forwarding to the configured
    /// logger sink unless `logging` already names one.
    pub fn init_logging(&self, mut logging: LoggingConfig) -> Result<()> {
        if logging.logger_sink.is_none() {
            logging.logger_sink = self.config.logger_sink.clone();
        }
        init_logging(logging)?;
        Ok(())
    }

    pub fn config(&self) -> &CastConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn is_initialized(&self) -> bool {
        self.context_registration.lock().is_some()
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Start following the host session manager.
    ///
    /// Adopts an already-running session when the auto-join policy allows it
    /// and returns its description. Publishes `Setup` last. Calling again
    /// replaces the previous context listener.
    #[instrument(skip(self), fields(app_id = %self.config.receiver_app_id))]
    pub fn initialize(&self) -> Result<Option<SessionDescription>> {
        let controller = self.controller.clone();
        let events = self.events.clone();
        let registration = self
            .context
            .add_context_listener(Arc::new(move |event: ContextEvent| {
                on_context_event(&controller, &events, event)
            }));
        if let Some(previous) = self.context_registration.lock().replace(registration) {
            debug!("Replacing previous context listener");
            previous.cancel();
        }

        let rejoined = match self.context.current_session() {
            Some(session) if self.config.auto_join_policy.allows_rejoin() => {
                let description = describe_session(session.as_ref(), SessionStatus::Connected, None);
                self.controller.set_session(Some(session))?;
                info!(session_id = %description.session_id, "Rejoined running session");
                self.publish(CoreEvent::Session(SessionEvent::Rejoined {
                    description: description.clone(),
                }));
                Some(description)
            }
            Some(_) => {
                debug!(policy = ?self.config.auto_join_policy, "Not rejoining running session");
                None
            }
            None => None,
        };

        self.publish(CoreEvent::Session(SessionEvent::Setup {
            receiver_app_id: self.config.receiver_app_id.clone(),
        }));
        Ok(rejoined)
    }

    /// Show the host route chooser and wait for the user.
    ///
    /// # Errors
    ///
    /// - [`CastError::Cancelled`] when the user dismissed the chooser
    /// - [`CastError::Provider`] when the session failed to start
    #[instrument(skip(self))]
    pub async fn request_session(&self) -> Result<SessionDescription> {
        self.ensure_initialized()?;

        let (sender, receiver) = oneshot::channel();
        let context = self.context.clone();
        self.config.main_thread_executor.execute(Box::new(move || {
            context.request_session(Box::new(move |outcome: SessionRequestOutcome| {
                let _ = sender.send(outcome);
            }))
        }))?;

        let outcome = receiver.await.map_err(|_| {
            CastError::Bridge("session request dropped without an answer".to_string())
        })?;

        match outcome {
            SessionRequestOutcome::Joined(session) => {
                self.controller.set_session(Some(session.clone()))?;
                // Answered after the session is attached on the main thread.
                let description = match self.controller.describe().await? {
                    Some(description) => description,
                    None => describe_session(session.as_ref(), SessionStatus::Connected, None),
                };
                info!(session_id = %description.session_id, "Session joined");
                Ok(description)
            }
            SessionRequestOutcome::Cancelled => {
                debug!("Route chooser dismissed");
                Err(CastError::Cancelled.into())
            }
            SessionRequestOutcome::Failed(status) => {
                warn!(code = status.code, "Session request failed");
                Err(CastError::provider(status).into())
            }
        }
    }

    /// End the session and stop the receiver application.
    #[instrument(skip(self))]
    pub fn session_stop(&self) -> Result<()> {
        self.end_session(true)
    }

    /// Disconnect from the session, leaving the receiver application running.
    #[instrument(skip(self))]
    pub fn session_leave(&self) -> Result<()> {
        self.end_session(false)
    }

    fn end_session(&self, stop_casting: bool) -> Result<()> {
        let context = self.context.clone();
        self.config
            .main_thread_executor
            .execute(Box::new(move || context.end_session(stop_casting)))?;
        Ok(())
    }

    /// Description of the active session, media included.
    pub async fn describe_session(&self) -> Result<Option<SessionDescription>> {
        Ok(self.controller.describe().await?)
    }

    /// Stop following the session manager and drop the active session.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(registration) = self.context_registration.lock().take() {
            registration.cancel();
        }
        self.controller.set_session(None)?;
        info!("Cast service shut down");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------------

    /// Load media and resolve with the snapshot taken once its queue settled.
    #[instrument(skip(self, params), fields(content_id = %redact_url_query(&params.content_id)))]
    pub async fn load_media(&self, params: LoadMediaParams) -> Result<Arc<MediaSnapshot>> {
        let request = params.into_request()?;
        debug!(
            content_type = %request.media.content_type,
            stream_type = ?request.media.stream_type,
            autoplay = request.autoplay,
            "Loading media"
        );
        Ok(self.controller.load_media(request).await?)
    }

    /// [`load_media`](Self::load_media) with credentials the receiver needs to
    /// fetch the media itself.
    pub async fn load_media_with_headers(
        &self,
        params: LoadMediaParams,
        auth_headers: BTreeMap<String, String>,
        auth_token: Option<String>,
    ) -> Result<Arc<MediaSnapshot>> {
        for (name, value) in &auth_headers {
            debug!(header = %name, value = %redact_if_sensitive(name, value), "Auth header");
        }
        self.load_media(params.with_auth(auth_headers, auth_token))
            .await
    }

    /// Load an HLS stream whose segments are protected by a URL token.
    ///
    /// Defaults to `LIVE` HLS with autoplay on. The token comes from
    /// `auth_token`, else from the `token` query parameter of the URL.
    #[instrument(skip(self, params), fields(content_id = %redact_url_query(&params.content_id)))]
    pub async fn load_secure_hls(&self, params: SecureHlsParams) -> Result<Arc<MediaSnapshot>> {
        let has_token = params.resolved_token().is_some();
        debug!(has_token, "Loading secure HLS stream");
        self.load_media(params.into_load_params()?).await
    }

    /// Play `url` with every default, autoplay on.
    ///
    /// Resolves to `false` instead of failing when no session is active.
    #[instrument(skip(self, url), fields(url = %redact_url_query(url)))]
    pub async fn launch_media(&self, url: &str) -> Result<bool> {
        if !self.controller.has_media_client() {
            warn!("No active session to launch media on");
            return Ok(false);
        }

        let mut params = LoadMediaParams::new(url);
        params.autoplay = true;
        match self.load_media(params).await {
            Ok(_) => Ok(true),
            Err(ServiceError::Cast(CastError::NoActiveSession)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn media_play(&self) -> Result<()> {
        Ok(self.controller.play()?)
    }

    pub fn media_pause(&self) -> Result<()> {
        Ok(self.controller.pause()?)
    }

    /// Seek to `position_ms` milliseconds from the start of the item.
    pub fn media_seek(&self, position_ms: i64) -> Result<()> {
        Ok(self.controller.seek(position_ms)?)
    }

    /// Skip to the next queue item. With `acknowledge`, resolves once the
    /// receiver reports the queue change.
    #[instrument(skip(self))]
    pub async fn media_next(&self, acknowledge: bool) -> Result<()> {
        if acknowledge {
            self.controller.queue_next_acknowledged().await?;
        } else {
            self.controller.queue_next()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Custom channels
    // ------------------------------------------------------------------------

    /// Send `message` on `namespace`. Failures are reported in the result,
    /// never as an error.
    #[instrument(skip(self, message), fields(bytes = message.len()))]
    pub async fn send_message(&self, namespace: &str, message: &str) -> SendMessageResult {
        let result = self.controller.send_message(namespace, message).await;
        if let Err(err) = &result {
            debug!(error = %err, "Message not delivered");
        }
        result.into()
    }

    /// Publish receiver messages on `namespace` as `RECEIVER_MESSAGE` events.
    #[instrument(skip(self))]
    pub async fn add_message_listener(&self, namespace: &str) -> Result<()> {
        Ok(self.controller.add_message_listener(namespace).await?)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ServiceError::NotInitialized)
        }
    }

    fn publish(&self, event: CoreEvent) {
        publish(&self.events, event);
    }
}

impl Drop for CastService {
    fn drop(&mut self) {
        if let Some(registration) = self.context_registration.get_mut().take() {
            registration.cancel();
        }
    }
}

impl std::fmt::Debug for CastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastService")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

fn publish(events: &EventBus, event: CoreEvent) {
    if events.emit(event).is_err() {
        debug!("No subscribers for service event");
    }
}

/// Session manager notification, on the host's main thread.
fn on_context_event(controller: &SessionController, events: &EventBus, event: ContextEvent) {
    debug!(?event, "Session manager event");

    let attach = |session: Option<Arc<dyn CastSession>>| {
        if let Err(err) = controller.set_session(session) {
            warn!(error = %err, "Failed to hand session to controller");
        }
    };

    match event {
        ContextEvent::SessionStarted(session) => {
            let started = SessionEvent::Started {
                session_id: session.session_id(),
                is_connected: session.is_connected(),
            };
            attach(Some(session));
            publish(events, CoreEvent::Session(started));
        }
        ContextEvent::SessionResumed {
            session,
            was_suspended,
        } => {
            let resumed = SessionEvent::Resumed {
                session_id: session.session_id(),
                was_suspended,
            };
            attach(Some(session));
            publish(events, CoreEvent::Session(resumed));
        }
        ContextEvent::SessionSuspended { session_id, reason } => {
            info!(%session_id, reason, "Session suspended");
            attach(None);
        }
        ContextEvent::SessionEnded {
            session_id,
            error_code,
        } => {
            attach(None);
            publish(
                events,
                CoreEvent::Session(SessionEvent::Ended {
                    session_id,
                    error_code: (error_code != 0).then_some(error_code),
                }),
            );
        }
        ContextEvent::SessionStartFailed { error_code } => {
            warn!(error_code, "Session failed to start");
            publish(
                events,
                CoreEvent::Session(SessionEvent::StartFailed { error_code }),
            );
        }
        ContextEvent::ReceiverAvailability { available } => publish(
            events,
            CoreEvent::Receiver(ReceiverEvent::AvailabilityChanged { available }),
        ),
    }
}
