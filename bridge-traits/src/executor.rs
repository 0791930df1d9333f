//! Main-Thread Execution
//!
//! The Cast SDKs require every call into the session manager, the remote media
//! client and the media queue to happen on one designated thread (the Android
//! main looper, the iOS main queue). The core never calls a provider API
//! directly from an arbitrary thread; it posts a job through this trait.

use crate::{error::Result, platform::PlatformSendSync};

/// Unit of work posted to the main thread.
pub type MainThreadJob = Box<dyn FnOnce() + Send + 'static>;

/// Executor bound to the provider's UI-affinity thread.
///
/// Implementations:
/// - **Android**: `Handler(Looper.getMainLooper()).post(...)`
/// - **iOS**: `DispatchQueue.main.async { ... }`
/// - **Desktop**: a dedicated thread owned by `bridge-desktop`
///
/// Jobs must run one at a time, in submission order. A job posted from inside
/// another job runs after the current job returns, never re-entrantly.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::executor::MainThreadExecutor;
///
/// fn pause(executor: &dyn MainThreadExecutor, client: Arc<dyn RemoteMediaClient>) {
///     let _ = executor.execute(Box::new(move || client.pause()));
/// }
/// ```
pub trait MainThreadExecutor: PlatformSendSync {
    /// Queue a job for execution on the main thread.
    ///
    /// Returns [`BridgeError::ExecutorClosed`](crate::BridgeError::ExecutorClosed)
    /// once the host has torn the thread down.
    fn execute(&self, job: MainThreadJob) -> Result<()>;

    /// Whether the calling thread is the main thread.
    fn is_main_thread(&self) -> bool;
}
