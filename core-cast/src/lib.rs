//! # Cast Session Core
//!
//! Session and media-state synchronization engine between the host's Google
//! Cast SDK and the application.
//!
//! ## Overview
//!
//! - [`controller`] - owns the active session, gates and routes provider
//!   callbacks, runs caller commands on the main thread
//! - [`queue`] - resolves the items around the current queue position and
//!   reports one settled result per cycle
//! - [`snapshot`] - immutable media snapshots and session descriptions
//! - [`adapter`] / [`channel`] - playback commands and custom-namespace
//!   messaging against whatever session is active
//! - [`listener`] - outbound notifications, with an [`EventBus`] adapter
//!
//! [`EventBus`]: core_runtime::events::EventBus
//!
//! ## Usage
//!
//! ```ignore
//! use core_cast::{EventBusListener, SessionController};
//!
//! let controller = SessionController::new(
//!     config.main_thread_executor.clone(),
//!     config.clock.clone(),
//!     Arc::new(EventBusListener::new(bus.clone())),
//! );
//! controller.set_session(context.current_session())?;
//! let snapshot = controller.load_media(request).await?;
//! ```

pub mod adapter;
pub mod channel;
pub mod controller;
pub mod error;
pub mod listener;
pub mod queue;
pub mod snapshot;

pub use controller::{LoadHandle, Reply, SessionController};
pub use error::{CastError, ProviderErrorCategory, Result};
pub use listener::{CastListener, EventBusListener};
