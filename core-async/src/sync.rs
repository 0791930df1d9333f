//! Synchronization primitives.
//!
//! Re-exports the Tokio channel and lock types used by the core together with
//! `tokio_util`'s [`CancellationToken`], which scopes provider callbacks to the
//! lifetime of one cast session.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//!
//! let session_scope = CancellationToken::new();
//! let callback_scope = session_scope.child_token();
//! session_scope.cancel();
//! assert!(callback_scope.is_cancelled());
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
