//! Plugin-call façade and bootstrap helpers.
//!
//! This crate wires the host's Cast SDK bridges into the session
//! synchronization core and exposes the operations the plugin layer calls:
//! session requests, media loading and control, and custom-namespace
//! messaging. Desktop hosts and tests typically enable the `desktop-shims`
//! feature, which supplies a default main-thread executor and the loopback
//! receiver from `bridge-desktop`.

pub mod content_type;
pub mod error;
pub mod params;
pub mod service;

pub use error::{Result, ServiceError};
pub use params::{LoadMediaParams, SecureHlsParams, SendMessageResult};
pub use service::CastService;

#[cfg(feature = "desktop-shims")]
use std::sync::Arc;

#[cfg(feature = "desktop-shims")]
use bridge_desktop::LoopbackCastContext;
#[cfg(feature = "desktop-shims")]
use core_runtime::config::CastConfig;

/// Service backed by an in-memory receiver named `device_name`, for desktop
/// development and demos.
///
/// ```
/// # #[cfg(feature = "desktop-shims")]
/// # fn example() -> core_service::Result<()> {
/// use core_runtime::config::{CastConfig, DEFAULT_MEDIA_RECEIVER_APP_ID};
///
/// let config = CastConfig::builder()
///     .receiver_app_id(DEFAULT_MEDIA_RECEIVER_APP_ID)
///     .build()?;
/// let (service, receiver) = core_service::bootstrap_loopback(config, "Living Room TV");
/// service.initialize()?;
/// # let _ = receiver;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_loopback(
    config: CastConfig,
    device_name: &str,
) -> (CastService, Arc<LoopbackCastContext>) {
    let context = Arc::new(LoopbackCastContext::new(device_name));
    context.set_app_id(&config.receiver_app_id);
    let service = CastService::new(config, context.clone());
    (service, context)
}
