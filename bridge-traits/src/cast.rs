//! Cast Provider Contracts
//!
//! Abstractions over the host's Google Cast SDK. The core never talks to the
//! SDK directly: it receives these handles from the host adapter, invokes
//! them only from the [`MainThreadExecutor`](crate::executor::MainThreadExecutor),
//! and consumes their push notifications through the listener closures passed
//! to the `register_*` / `add_*` methods.
//!
//! ## Handles
//!
//! | Trait | SDK counterpart (Android) |
//! |-------|---------------------------|
//! | [`CastContext`] | `CastContext` + `SessionManager` |
//! | [`CastSession`] | `CastSession` |
//! | [`RemoteMediaClient`] | `RemoteMediaClient` |
//! | [`MediaQueue`] | `MediaQueue` (caching item store) |
//!
//! ## Registrations
//!
//! Every listener registration returns a [`Registration`]. Implementations
//! must stop delivering to a listener once its registration is cancelled.
//! The core cancels all registrations of a session when that session is
//! replaced or ended.
//!
//! ## Completion callbacks
//!
//! Operations with an asynchronous result (load, send-message, session
//! request) take a boxed `FnOnce` completion. Implementations must invoke it
//! exactly once, on the main thread.

use std::fmt;
use std::sync::Arc;

use core_async::sync::CancellationToken;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, platform::PlatformSendSync};

// ============================================================================
// Status & Registration
// ============================================================================

/// Raw provider result, as reported by the SDK's `Status` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub code: i32,
    pub description: Option<String>,
}

impl ProviderStatus {
    pub const SUCCESS: i32 = 0;

    pub fn success() -> Self {
        Self {
            code: Self::SUCCESS,
            description: None,
        }
    }

    pub fn failure(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }
}

/// Completion callback for provider operations with a status result.
pub type StatusCallback = Box<dyn FnOnce(ProviderStatus) + Send + 'static>;

/// Handle for one listener registration.
///
/// Cloning shares the same underlying token. Dropping does not cancel.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    token: CancellationToken,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delivery to the associated listener.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that fires when the registration is cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

// ============================================================================
// Media Model
// ============================================================================

/// Receiver player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    #[default]
    Unknown,
    Idle,
    Playing,
    Paused,
    Buffering,
    Loading,
}

/// Why the player went idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdleReason {
    Cancelled,
    Interrupted,
    Finished,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    None,
    #[default]
    Buffered,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    #[default]
    #[serde(rename = "REPEAT_OFF")]
    Off,
    #[serde(rename = "REPEAT_ALL")]
    All,
    #[serde(rename = "REPEAT_SINGLE")]
    Single,
    #[serde(rename = "REPEAT_ALL_AND_SHUFFLE")]
    AllAndShuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub level: f64,
    pub muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            level: 1.0,
            muted: false,
        }
    }
}

/// Description of one piece of media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub content_id: String,
    pub content_type: String,
    pub stream_type: StreamType,
    /// Duration in milliseconds, `None` when unknown or live.
    pub duration_ms: Option<i64>,
    pub metadata: Option<Value>,
    pub custom_data: Option<Value>,
    pub text_track_style: Option<Value>,
}

/// One entry of the receiver's media queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Stable identifier assigned by the receiver.
    pub item_id: i32,
    pub media: Option<MediaInfo>,
    pub autoplay: bool,
    pub start_time: f64,
    pub custom_data: Option<Value>,
}

/// Live media status of the remote media client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    pub media_session_id: i64,
    pub player_state: PlayerState,
    pub idle_reason: Option<IdleReason>,
    pub current_item_id: Option<i32>,
    pub stream_position_ms: i64,
    pub playback_rate: f64,
    pub volume: Volume,
    pub media: Option<MediaInfo>,
    pub repeat_mode: RepeatMode,
    pub custom_data: Option<Value>,
}

/// Request handed to [`RemoteMediaClient::load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub media: MediaInfo,
    pub autoplay: bool,
    pub current_time_ms: i64,
    pub custom_data: Option<Value>,
}

// ============================================================================
// Session Model
// ============================================================================

/// Receiver device attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverInfo {
    pub friendly_name: String,
    /// Stable device identifier.
    pub label: String,
    pub volume: Volume,
}

/// Application-level description of a session as reported by the SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub app_id: String,
    pub display_name: Option<String>,
    pub status_text: Option<String>,
    pub receiver: ReceiverInfo,
}

/// `Cast.Listener` notifications for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationEvent {
    StatusChanged,
    MetadataChanged,
    ActiveInputStateChanged(i32),
    StandbyStateChanged(i32),
    VolumeChanged,
    /// The receiver application went away. `code` is the SDK status code.
    Disconnected { code: i32 },
}

/// `RemoteMediaClient.Callback` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    StatusUpdated,
    QueueStatusUpdated,
}

/// `MediaQueue.Callback` notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// The whole queue was replaced.
    ItemsReloaded,
    /// The cache delivered data for these indexes.
    ItemsUpdatedAtIndexes(Vec<usize>),
    ItemsInsertedInRange { start: usize, count: usize },
    ItemsRemovedAtIndexes(Vec<usize>),
}

pub type ApplicationListener = Arc<dyn Fn(ApplicationEvent) + Send + Sync>;
pub type ClientListener = Arc<dyn Fn(ClientEvent) + Send + Sync>;
pub type QueueListener = Arc<dyn Fn(QueueEvent) + Send + Sync>;
/// Receives `(namespace, message)` for a custom channel.
pub type MessageListener = Arc<dyn Fn(&str, &str) + Send + Sync>;
pub type ContextListener = Arc<dyn Fn(ContextEvent) + Send + Sync>;

// ============================================================================
// Provider Traits
// ============================================================================

/// Caching item store backing the receiver's queue.
///
/// Indexes are volatile: any insert, remove or reload invalidates them.
/// Item identifiers are stable.
pub trait MediaQueue: PlatformSendSync {
    fn item_ids(&self) -> Vec<i32>;

    fn item_count(&self) -> usize;

    fn index_of_item_id(&self, item_id: i32) -> Option<usize>;

    /// Cached item at `index`. When absent and `fetch_if_missing` is set, the
    /// store starts a background fetch and later reports
    /// [`QueueEvent::ItemsUpdatedAtIndexes`].
    fn item_at_index(&self, index: usize, fetch_if_missing: bool) -> Option<QueueItem>;

    fn register_callback(&self, listener: QueueListener) -> Registration;
}

/// Playback control channel of a session.
pub trait RemoteMediaClient: PlatformSendSync {
    fn media_status(&self) -> Option<MediaStatus>;

    fn media_queue(&self) -> Arc<dyn MediaQueue>;

    fn register_callback(&self, listener: ClientListener) -> Registration;

    fn load(&self, request: LoadRequest, done: StatusCallback);

    fn play(&self);

    fn pause(&self);

    fn seek(&self, position_ms: i64);

    fn queue_next(&self);
}

/// One live connection to a receiver.
pub trait CastSession: PlatformSendSync {
    fn session_id(&self) -> String;

    fn is_connected(&self) -> bool;

    fn info(&self) -> SessionInfo;

    /// `None` for receiver applications without media support.
    fn remote_media_client(&self) -> Option<Arc<dyn RemoteMediaClient>>;

    fn add_application_listener(&self, listener: ApplicationListener) -> Registration;

    fn send_message(&self, namespace: &str, message: &str, done: StatusCallback);

    /// Route incoming messages on `namespace` to `listener`, replacing any
    /// previous listener for that namespace.
    fn set_message_received_callback(
        &self,
        namespace: &str,
        listener: MessageListener,
    ) -> Result<Registration>;
}

impl fmt::Debug for dyn CastSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastSession")
            .field("session_id", &self.session_id())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Result of a user-facing route chooser.
pub enum SessionRequestOutcome {
    Joined(Arc<dyn CastSession>),
    Cancelled,
    Failed(ProviderStatus),
}

pub type SessionRequestCallback = Box<dyn FnOnce(SessionRequestOutcome) + Send + 'static>;

/// `SessionManagerListener` and route-discovery notifications.
#[derive(Clone)]
pub enum ContextEvent {
    SessionStarted(Arc<dyn CastSession>),
    SessionResumed {
        session: Arc<dyn CastSession>,
        was_suspended: bool,
    },
    SessionSuspended {
        session_id: String,
        reason: i32,
    },
    SessionEnded {
        session_id: String,
        error_code: i32,
    },
    SessionStartFailed {
        error_code: i32,
    },
    ReceiverAvailability {
        available: bool,
    },
}

impl fmt::Debug for ContextEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextEvent::SessionStarted(session) => f
                .debug_tuple("SessionStarted")
                .field(&session.session_id())
                .finish(),
            ContextEvent::SessionResumed {
                session,
                was_suspended,
            } => f
                .debug_struct("SessionResumed")
                .field("session_id", &session.session_id())
                .field("was_suspended", was_suspended)
                .finish(),
            ContextEvent::SessionSuspended { session_id, reason } => f
                .debug_struct("SessionSuspended")
                .field("session_id", session_id)
                .field("reason", reason)
                .finish(),
            ContextEvent::SessionEnded {
                session_id,
                error_code,
            } => f
                .debug_struct("SessionEnded")
                .field("session_id", session_id)
                .field("error_code", error_code)
                .finish(),
            ContextEvent::SessionStartFailed { error_code } => f
                .debug_struct("SessionStartFailed")
                .field("error_code", error_code)
                .finish(),
            ContextEvent::ReceiverAvailability { available } => f
                .debug_struct("ReceiverAvailability")
                .field("available", available)
                .finish(),
        }
    }
}

/// Entry point of the host SDK: session manager plus route chooser.
pub trait CastContext: PlatformSendSync {
    fn current_session(&self) -> Option<Arc<dyn CastSession>>;

    /// Show the route chooser and report how the user left it.
    fn request_session(&self, done: SessionRequestCallback);

    /// End the current session. `stop_casting` also stops the receiver app.
    fn end_session(&self, stop_casting: bool);

    fn add_context_listener(&self, listener: ContextListener) -> Registration;
}
