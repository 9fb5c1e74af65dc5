//! Single background thread that runs machine-move computations under a
//! wall-clock limit.
//!
//! Tasks run one at a time in submission order. When a task overruns its
//! limit the caller gets [`ComputeError::TimedOut`] right away, the task's
//! token is cancelled, and whatever it eventually produces is dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;
use web_time::Instant;

use crate::error::ComputeError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cooperative cancellation shared between the caller and a running task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also counts as cancelled once `deadline` has passed.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Lazily started single-thread executor. The thread is joined on drop.
#[derive(Debug, Default)]
pub struct MoveWorker {
    jobs: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl MoveWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` on the worker thread and waits at most `limit` for it.
    ///
    /// A panic inside `task` is reported as [`ComputeError::Failed`] and
    /// leaves the worker usable.
    pub fn run<T, F>(&mut self, limit: Duration, task: F) -> Result<T, ComputeError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> Result<T, ComputeError> + Send + 'static,
    {
        let token = match Instant::now().checked_add(limit) {
            Some(deadline) => CancelToken::with_deadline(deadline),
            None => CancelToken::new(),
        };
        let task_token = token.clone();
        let (tx, rx) = mpsc::sync_channel(1);

        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| task(&task_token)))
                .unwrap_or_else(|payload| Err(ComputeError::Failed(panic_message(&*payload))));
            // the caller may have stopped listening after a timeout
            let _ = tx.send(result);
        });
        self.sender()?
            .send(job)
            .map_err(|_| ComputeError::WorkerGone)?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                token.cancel();
                Err(ComputeError::TimedOut(limit))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ComputeError::WorkerGone),
        }
    }

    fn sender(&mut self) -> Result<&mpsc::Sender<Job>, ComputeError> {
        if self.jobs.is_none() {
            let (tx, rx) = mpsc::channel::<Job>();
            let handle = thread::Builder::new()
                .name("move-worker".into())
                .spawn(move || {
                    for job in rx {
                        job();
                    }
                })
                .map_err(|e| ComputeError::Failed(format!("cannot start worker thread: {e}")))?;
            debug!("move worker started");
            self.jobs = Some(tx);
            self.handle = Some(handle);
        }
        self.jobs.as_ref().ok_or(ComputeError::WorkerGone)
    }
}

impl Drop for MoveWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}
