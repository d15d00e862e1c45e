//! Time-based job facility.
//!
//! A job is registered for an absolute instant and runs once at or after
//! it. The returned handle can cancel a job that has not run yet.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Work to run when a job fires.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a registered job.
pub trait JobHandle: Send {
    /// Stop the job if it has not run yet. Cancelling twice is harmless.
    fn cancel(&self);

    /// Whether the job ran to completion or was cancelled.
    fn is_finished(&self) -> bool;
}

/// Registers jobs to run at a wall-clock instant.
pub trait JobScheduler: Send + Sync {
    type Handle: JobHandle;

    fn register_at(&self, at: DateTime<Utc>, job: Job) -> Self::Handle;
}

/// Runs every job as its own task on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioJobScheduler {
    runtime: Handle,
}

impl TokioJobScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

#[derive(Debug)]
pub struct TokioJobHandle {
    task: AbortHandle,
}

impl JobHandle for TokioJobHandle {
    fn cancel(&self) {
        self.task.abort();
    }

    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl JobScheduler for TokioJobScheduler {
    type Handle = TokioJobHandle;

    fn register_at(&self, at: DateTime<Utc>, job: Job) -> TokioJobHandle {
        // Instants already passed fire immediately.
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });
        TokioJobHandle {
            task: task.abort_handle(),
        }
    }
}
