//! Async runtime facade for the cast bridge core.
//!
//! All `core-*` and `bridge-*` crates depend on this crate instead of naming
//! Tokio directly, so the executor can be swapped in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep, timeout, durations
//! - `sync`: Channels, cancellation tokens, async locks
//! - `runtime`: Blocking entry points for host threads that have no runtime
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::oneshot;
//!
//! # core_async::runtime::block_on(async {
//! let (tx, rx) = oneshot::channel();
//! core_async::task::spawn(async move {
//!     let _ = tx.send(42);
//! });
//! assert_eq!(rx.await.ok(), Some(42));
//! # });
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
