//! # Host Bridge Traits
//!
//! Capability contracts that each host platform implements for the cast
//! bridge core.
//!
//! ## Overview
//!
//! The core owns session and media-state synchronization; the host owns the
//! Google Cast SDK and the UI thread. This crate is the seam between the two.
//!
//! ## Traits
//!
//! ### Cast SDK
//! - [`CastContext`](cast::CastContext) - Session manager, route chooser, discovery
//! - [`CastSession`](cast::CastSession) - One receiver connection and its message channels
//! - [`RemoteMediaClient`](cast::RemoteMediaClient) - Playback control for a session
//! - [`MediaQueue`](cast::MediaQueue) - Lazily populated queue item cache
//!
//! ### Platform Integration
//! - [`MainThreadExecutor`](executor::MainThreadExecutor) - The SDK's UI-affinity thread
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation | Status |
//! |----------|----------------|--------|
//! | Desktop  | `bridge-desktop` (loopback receiver) | ✅ Available |
//! | Android  | Capacitor plugin adapter | 📋 Planned |
//! | iOS      | Capacitor plugin adapter | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! let executor = config.main_thread_executor
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "MainThreadExecutor".to_string(),
//!         message: "Inject the host's main-thread dispatcher.".to_string(),
//!     })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets. Provider handles
//! may be cloned across threads, but their methods are only invoked from the
//! main-thread executor.

pub mod cast;
pub mod error;
pub mod executor;
pub mod platform;
pub mod time;

pub use error::BridgeError;

pub use cast::{
    ApplicationEvent, CastContext, CastSession, ClientEvent, ContextEvent, IdleReason,
    LoadRequest, MediaInfo, MediaQueue, MediaStatus, PlayerState, ProviderStatus, QueueEvent,
    QueueItem, ReceiverInfo, Registration, RemoteMediaClient, RepeatMode, SessionInfo,
    SessionRequestOutcome, StreamType, Volume,
};
pub use executor::{MainThreadExecutor, MainThreadJob};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
