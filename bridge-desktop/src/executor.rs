//! Main-thread executors for desktop hosts.

use bridge_traits::{
    error::{BridgeError, Result},
    executor::{MainThreadExecutor, MainThreadJob},
};
use core_async::sync::mpsc;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error};

/// Executor that owns one named OS thread and runs jobs on it in FIFO order.
///
/// The thread exits once the executor and all its clones are dropped.
/// A panicking job is logged and does not take the thread down.
#[derive(Clone)]
pub struct DedicatedThreadExecutor {
    sender: mpsc::UnboundedSender<MainThreadJob>,
    thread_id: ThreadId,
    name: Arc<str>,
}

impl DedicatedThreadExecutor {
    /// Start the executor thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<MainThreadJob>();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(thread = %thread_name, "Main-thread executor started");
                while let Some(job) = receiver.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!(thread = %thread_name, "Main-thread job panicked");
                    }
                }
                debug!(thread = %thread_name, "Main-thread executor stopped");
            })?;

        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
            name: Arc::from(name),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for DedicatedThreadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedicatedThreadExecutor")
            .field("name", &self.name)
            .finish()
    }
}

impl MainThreadExecutor for DedicatedThreadExecutor {
    fn execute(&self, job: MainThreadJob) -> Result<()> {
        self.sender
            .send(job)
            .map_err(|_| BridgeError::ExecutorClosed)
    }

    fn is_main_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

thread_local! {
    static PUMPING: Cell<bool> = const { Cell::new(false) };
}

/// Executor whose queue is drained by the caller.
///
/// Jobs posted from inside a running job are appended to the queue and run
/// by the same [`run_until_idle`](Self::run_until_idle) call.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Arc<Mutex<VecDeque<MainThreadJob>>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued job. Returns `false` when the queue was empty.
    pub fn run_next(&self) -> bool {
        // Lock released before the job runs so it can post follow-ups.
        let Some(job) = self.queue.lock().pop_front() else {
            return false;
        };

        let was_pumping = PUMPING.with(|flag| flag.replace(true));
        let outcome = catch_unwind(AssertUnwindSafe(job));
        PUMPING.with(|flag| flag.set(was_pumping));

        if outcome.is_err() {
            error!("Main-thread job panicked");
        }
        true
    }

    /// Run jobs until the queue is empty, returning how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl MainThreadExecutor for ManualExecutor {
    fn execute(&self, job: MainThreadJob) -> Result<()> {
        self.queue.lock().push_back(job);
        Ok(())
    }

    fn is_main_thread(&self) -> bool {
        PUMPING.with(|flag| flag.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::sync::oneshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_dedicated_thread_runs_jobs_in_order() {
        let executor = DedicatedThreadExecutor::spawn("cast-main-test").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            executor
                .execute(Box::new(move || order.lock().push(i)))
                .unwrap();
        }

        let (tx, rx) = oneshot::channel();
        let probe = executor.clone();
        executor
            .execute(Box::new(move || {
                let _ = tx.send(probe.is_main_thread());
            }))
            .unwrap();

        assert!(rx.await.unwrap());
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert!(!executor.is_main_thread());
        assert_eq!(executor.name(), "cast-main-test");
    }

    #[tokio::test]
    async fn test_dedicated_thread_survives_panicking_job() {
        let executor = DedicatedThreadExecutor::spawn("cast-main-panic").unwrap();
        executor.execute(Box::new(|| panic!("boom"))).unwrap();

        let (tx, rx) = oneshot::channel();
        executor
            .execute(Box::new(move || {
                let _ = tx.send(());
            }))
            .unwrap();

        assert!(rx.await.is_ok());
    }

    #[test]
    fn test_manual_executor_runs_nested_posts() {
        let executor = ManualExecutor::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_exec = executor.clone();
        let inner_count = count.clone();
        executor
            .execute(Box::new(move || {
                inner_count.fetch_add(1, Ordering::SeqCst);
                let nested_count = inner_count.clone();
                inner_exec
                    .execute(Box::new(move || {
                        nested_count.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
            }))
            .unwrap();

        assert_eq!(executor.pending(), 1);
        assert_eq!(executor.run_until_idle(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn test_manual_executor_main_thread_flag() {
        let executor = ManualExecutor::new();
        let seen = Arc::new(Mutex::new(None));

        let probe = executor.clone();
        let slot = seen.clone();
        executor
            .execute(Box::new(move || {
                *slot.lock() = Some(probe.is_main_thread());
            }))
            .unwrap();

        assert!(!executor.is_main_thread());
        executor.run_until_idle();
        assert_eq!(*seen.lock(), Some(true));
        assert!(!executor.is_main_thread());
    }
}
