//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux) and for tests.
//!
//! ## Overview
//!
//! - `MainThreadExecutor` backed by a dedicated OS thread
//!   ([`DedicatedThreadExecutor`])
//! - `MainThreadExecutor` pumped by the caller ([`ManualExecutor`]), for hosts
//!   that integrate with their own event loop and for deterministic tests
//! - An in-memory Cast receiver ([`LoopbackCastContext`]) whose queue cache
//!   deliveries are driven explicitly
//!
//! ## Feature Flags
//!
//! - `loopback`: Enable the in-memory receiver (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DedicatedThreadExecutor, LoopbackCastContext};
//! use std::sync::Arc;
//!
//! let executor = Arc::new(DedicatedThreadExecutor::spawn("cast-main")?);
//! let context = Arc::new(LoopbackCastContext::new("Living Room TV"));
//! ```

mod executor;

#[cfg(feature = "loopback")]
mod loopback;

pub use executor::{DedicatedThreadExecutor, ManualExecutor};

#[cfg(feature = "loopback")]
pub use loopback::{
    LoopbackCastContext, LoopbackMediaClient, LoopbackQueue, LoopbackSession, RequestScript,
};
