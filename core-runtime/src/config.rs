//! # Cast Configuration Module
//!
//! Builder-based configuration for the cast bridge core.
//!
//! ## Overview
//!
//! [`CastConfig::builder()`] collects the receiver application id, the
//! session auto-join policy and the host bridges the core needs, then
//! validates everything before the service starts. Missing capabilities are
//! reported with [`Error::CapabilityMissing`] so hosts get an actionable
//! message instead of a late panic.
//!
//! ## Required Dependencies
//!
//! - `MainThreadExecutor` - the Cast SDK's UI-affinity thread
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - snapshot timestamps (default: `SystemClock`)
//! - `LoggerSink` - host-native log forwarding (default: none)
//!
//! When the `desktop-shims` feature is enabled, a `DedicatedThreadExecutor`
//! from `bridge-desktop` is spawned if no executor was injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AutoJoinPolicy, CastConfig};
//!
//! let config = CastConfig::builder()
//!     .receiver_app_id("CC1AD845")
//!     .auto_join_policy(AutoJoinPolicy::OriginScoped)
//!     .main_thread_executor(executor)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, LoggerSink, MainThreadExecutor, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application id of Google's Default Media Receiver.
pub const DEFAULT_MEDIA_RECEIVER_APP_ID: &str = "CC1AD845";

const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Whether an already-running session is adopted at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoJoinPolicy {
    #[default]
    TabAndOriginScoped,
    OriginScoped,
    /// Never adopt a running session.
    PageScoped,
}

impl AutoJoinPolicy {
    pub fn allows_rejoin(&self) -> bool {
        !matches!(self, AutoJoinPolicy::PageScoped)
    }
}

/// What the host's cast button does when tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultActionPolicy {
    #[default]
    CreateSession,
    CastThisTab,
}

/// Configuration for the cast bridge core.
#[derive(Clone)]
pub struct CastConfig {
    /// Receiver application the host SDK was configured with.
    pub receiver_app_id: String,

    pub auto_join_policy: AutoJoinPolicy,

    pub default_action_policy: DefaultActionPolicy,

    /// Per-subscriber capacity of the event bus.
    pub event_buffer_size: usize,

    /// Executor bound to the Cast SDK thread (required)
    pub main_thread_executor: Arc<dyn MainThreadExecutor>,

    pub clock: Arc<dyn Clock>,

    /// Forwarded to `logging::LoggingConfig` by the service.
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CastConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastConfig")
            .field("receiver_app_id", &self.receiver_app_id)
            .field("auto_join_policy", &self.auto_join_policy)
            .field("default_action_policy", &self.default_action_policy)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("main_thread_executor", &"MainThreadExecutor { ... }")
            .field("clock", &"Clock { ... }")
            .field("logger_sink", &self.logger_sink.as_ref().map(|_| "LoggerSink"))
            .finish()
    }
}

impl CastConfig {
    pub fn builder() -> CastConfigBuilder {
        CastConfigBuilder::default()
    }

    /// Validates field values.
    pub fn validate(&self) -> Result<()> {
        validate_app_id(&self.receiver_app_id)?;

        if self.event_buffer_size == 0 || self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size must be between 1 and {}, got {}",
                MAX_EVENT_BUFFER_SIZE, self.event_buffer_size
            )));
        }

        Ok(())
    }
}

fn validate_app_id(app_id: &str) -> Result<()> {
    if app_id.trim().is_empty() {
        return Err(Error::Config(
            "Receiver application id cannot be empty".to_string(),
        ));
    }

    if !app_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(format!(
            "Receiver application id must be alphanumeric, got '{}'",
            app_id
        )));
    }

    Ok(())
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_executor() -> Result<Arc<dyn MainThreadExecutor>> {
    Err(Error::CapabilityMissing {
        capability: "MainThreadExecutor".to_string(),
        message: "A main-thread executor is required to call into the Cast SDK. \
                 Android: post to Looper.getMainLooper(). \
                 iOS: dispatch to DispatchQueue.main. \
                 Desktop: enable the 'desktop-shims' feature to use DedicatedThreadExecutor."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_executor() -> Result<Arc<dyn MainThreadExecutor>> {
    use bridge_desktop::DedicatedThreadExecutor;

    let executor = DedicatedThreadExecutor::spawn("cast-main").map_err(|e| {
        Error::Internal(format!("Failed to start default main-thread executor: {}", e))
    })?;
    Ok(Arc::new(executor))
}

/// Builder for [`CastConfig`].
#[derive(Default)]
pub struct CastConfigBuilder {
    receiver_app_id: Option<String>,
    auto_join_policy: AutoJoinPolicy,
    default_action_policy: DefaultActionPolicy,
    event_buffer_size: Option<usize>,
    main_thread_executor: Option<Arc<dyn MainThreadExecutor>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CastConfigBuilder {
    /// Sets the receiver application id (required).
    pub fn receiver_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.receiver_app_id = Some(app_id.into());
        self
    }

    pub fn auto_join_policy(mut self, policy: AutoJoinPolicy) -> Self {
        self.auto_join_policy = policy;
        self
    }

    pub fn default_action_policy(mut self, policy: DefaultActionPolicy) -> Self {
        self.default_action_policy = policy;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the main-thread executor (required unless `desktop-shims`).
    pub fn main_thread_executor(mut self, executor: Arc<dyn MainThreadExecutor>) -> Self {
        self.main_thread_executor = Some(executor);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the app id is missing or malformed, or the
    ///   buffer size is out of range
    /// - [`Error::CapabilityMissing`] when no executor is available
    pub fn build(self) -> Result<CastConfig> {
        let receiver_app_id = self.receiver_app_id.ok_or_else(|| {
            Error::Config(
                "Receiver application id is required. Use .receiver_app_id() to set it."
                    .to_string(),
            )
        })?;
        // Reject before a default executor thread gets spawned.
        validate_app_id(&receiver_app_id)?;

        let main_thread_executor = match self.main_thread_executor {
            Some(executor) => executor,
            None => provide_default_executor()?,
        };

        let config = CastConfig {
            receiver_app_id,
            auto_join_policy: self.auto_join_policy,
            default_action_policy: self.default_action_policy,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            main_thread_executor,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
        };

        config.validate()?;

        Ok(config)
    }
}
