//! Draw executors
//!
//! Fired draw actions leave the tick thread through a [`DrawExecutor`]. The
//! default is a [`DrawWorker`]: one dedicated background thread consuming a
//! channel, so draw actions run one at a time in the order they were fired.
//! [`InlineExecutor`] runs them on the calling thread instead, which keeps
//! single-threaded hosts and tests deterministic.
//!
//! A panicking draw action is caught and logged; it never takes the worker
//! down with it.

use crate::error::{AnimationError, Result};
use crate::step::DrawJob;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default name of the background draw thread
pub const DEFAULT_WORKER_NAME: &str = "apel-draw";

/// Destination for fired draw actions
pub trait DrawExecutor: Send + Sync {
    fn execute(&self, job: DrawJob);

    /// Block until every job submitted so far has run
    fn wait_idle(&self) {}
}

/// Runs draw actions on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl DrawExecutor for InlineExecutor {
    fn execute(&self, job: DrawJob) {
        run_isolated(job);
    }
}

/// Count of submitted but not yet finished jobs
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Single background thread executing draw actions in submission order
pub struct DrawWorker {
    sender: Mutex<Option<Sender<DrawJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<Pending>,
    name: String,
}

impl DrawWorker {
    /// Start a worker thread with the default name
    pub fn spawn() -> Result<Self> {
        Self::spawn_named(DEFAULT_WORKER_NAME)
    }

    /// Start a worker thread with the given name
    pub fn spawn_named(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<DrawJob>();
        let pending = Arc::new(Pending::default());
        let thread_pending = Arc::clone(&pending);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // Ends once every sender is dropped
                for job in receiver {
                    run_isolated(job);
                    thread_pending.finish();
                }
                tracing::debug!("draw worker exiting");
            })
            .map_err(|e| AnimationError::WorkerUnavailable(e.to_string()))?;

        tracing::debug!(worker = %name, "draw worker started");
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            pending,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the worker still accepts jobs
    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stop accepting jobs, let queued jobs finish, and join the thread
    pub fn shutdown(&self) {
        self.sender.lock().take();
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                tracing::error!(worker = %self.name, "draw worker thread panicked");
            }
        }
    }
}

impl DrawExecutor for DrawWorker {
    fn execute(&self, job: DrawJob) {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            tracing::warn!(worker = %self.name, "draw worker stopped, running job inline");
            run_isolated(job);
            return;
        };

        self.pending.begin();
        if let Err(mpsc::SendError(job)) = sender.send(job) {
            self.pending.finish();
            tracing::warn!(worker = %self.name, "draw worker gone, running job inline");
            run_isolated(job);
        }
    }

    fn wait_idle(&self) {
        self.pending.wait();
    }
}

impl Drop for DrawWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DrawWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run_isolated(job: DrawJob) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        tracing::error!(reason = %panic_message(&*payload), "draw action panicked");
    }
}

/// Run `job`, turning a panic into [`AnimationError::Panicked`]
pub(crate) fn run_guarded<T>(job: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let reason = panic_message(&*payload).to_string();
        tracing::error!(reason = %reason, "animation action panicked");
        Err(AnimationError::Panicked(reason))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inline_executor_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        InlineExecutor.execute(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_runs_jobs_in_order() {
        let worker = DrawWorker::spawn_named("apel-draw-test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16 {
            let seen = seen.clone();
            worker.execute(Box::new(move || seen.lock().push(i)));
        }
        worker.wait_idle();
        assert_eq!(*seen.lock(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let worker = DrawWorker::spawn().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        worker.execute(Box::new(|| panic!("bad draw")));
        let counter = hits.clone();
        worker.execute(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        worker.wait_idle();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(worker.is_running());
    }

    #[test]
    fn test_shutdown_drains_queue_then_runs_inline() {
        let worker = DrawWorker::spawn().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let counter = hits.clone();
            worker.execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        worker.shutdown();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert!(!worker.is_running());

        let counter = hits.clone();
        worker.execute(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }
}
