//! Runtime utilities that abstract over the underlying async executor.
//!
//! Host callbacks (Cast SDK listeners, main-thread jobs) run on threads the
//! core does not own. These helpers let such threads drive a future to
//! completion or hand work back to an existing runtime.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a lightweight current-thread runtime.
///
/// Returns an error when the runtime cannot be constructed, which only happens
/// when the process is out of OS resources.
pub fn try_block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Runs the provided future to completion, reusing the ambient runtime when one
/// is available on this thread.
///
/// Must not be called from inside an async task on a current-thread runtime.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    match Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(future))),
        Err(_) => try_block_on(future),
    }
}
