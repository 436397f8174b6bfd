//! One-shot packaged tasks and their completion handles.
//!
//! [`PackagedTask`] pairs an erased, panic-containing callable with a
//! [`TaskHandle`] that the submitter keeps. The two halves are connected by
//! a bounded single-message channel: the task side runs the user closure
//! under `catch_unwind`, sends the outcome, and only then fires any
//! completion hook. The handle side blocks, polls readiness, or waits with
//! a deadline, without ever touching the pool's own locks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};

use crate::error::TaskError;

type Outcome<R> = thread::Result<R>;

/// A type-erased, run-once unit of work.
///
/// Created together with the [`TaskHandle`] that will observe its result.
/// Running the task never unwinds: panics from the wrapped closure are
/// caught and delivered to the handle as [`TaskError::Panicked`].
pub struct PackagedTask {
    run: Box<dyn FnOnce() + Send + 'static>,
}

impl PackagedTask {
    /// Packages `func`, returning the task and the handle to its result.
    pub fn new<F, R>(func: F) -> (Self, TaskHandle<R>)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        Self::with_completion(func, || {})
    }

    /// Packages `func` with a hook that fires after the result has been
    /// recorded — also when `func` panics. The graph uses this to promote
    /// dependents once a predecessor's outcome is observable.
    pub(crate) fn with_completion<F, R, C>(func: F, on_complete: C) -> (Self, TaskHandle<R>)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let (sender, receiver) = bounded::<Outcome<R>>(1);
        let run = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(func));
            // A dropped handle is fine; the send only fails if nobody waits.
            let _ = sender.send(outcome);
            on_complete();
        });
        (Self { run }, TaskHandle { receiver })
    }

    /// Consumes the task and runs it.
    pub(crate) fn run(self) {
        (self.run)();
    }
}

impl std::fmt::Debug for PackagedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagedTask").finish_non_exhaustive()
    }
}

/// Receiving half of a packaged task: resolves exactly once.
///
/// Dropping the handle is allowed; the task still runs to completion.
#[derive(Debug)]
pub struct TaskHandle<R> {
    receiver: Receiver<Outcome<R>>,
}

impl<R> TaskHandle<R> {
    /// Blocks until the task has run and returns its result.
    ///
    /// # Errors
    ///
    /// [`TaskError::Panicked`] if the task body panicked,
    /// [`TaskError::Abandoned`] if the task was dropped without running.
    pub fn wait(self) -> Result<R, TaskError> {
        match self.receiver.recv() {
            Ok(outcome) => flatten(outcome),
            Err(_) => Err(TaskError::Abandoned),
        }
    }

    /// Like [`TaskHandle::wait`] but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`TaskError::Timeout`] if the deadline elapses first; otherwise as
    /// [`TaskHandle::wait`]. The task keeps running either way.
    pub fn wait_timeout(self, timeout: Duration) -> Result<R, TaskError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => flatten(outcome),
            Err(RecvTimeoutError::Timeout) => Err(TaskError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(TaskError::Abandoned),
        }
    }

    /// Whether the result is already available, without consuming it.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }
}

fn flatten<R>(outcome: Outcome<R>) -> Result<R, TaskError> {
    outcome.map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())))
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_flows_to_handle() {
        let (task, handle) = PackagedTask::new(|| 21 * 2);
        assert!(!handle.is_ready());
        task.run();
        assert!(handle.is_ready());
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn panic_is_contained_and_reported() {
        let (task, handle) = PackagedTask::new(|| -> i32 { panic!("bad input") });
        task.run();
        match handle.wait() {
            Err(TaskError::Panicked(message)) => assert!(message.contains("bad input")),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn completion_hook_fires_after_result_is_recorded() {
        let (probe_tx, probe_rx) = bounded(1);
        let (task, handle) = PackagedTask::with_completion(
            || "done",
            move || {
                let _ = probe_tx.send(());
            },
        );
        task.run();
        // The hook ran, and the result was already observable when it did.
        probe_rx.recv().unwrap();
        assert!(handle.is_ready());
        assert_eq!(handle.wait().unwrap(), "done");
    }

    #[test]
    fn completion_hook_fires_on_panic_too() {
        let (probe_tx, probe_rx) = bounded(1);
        let (task, handle) = PackagedTask::with_completion(
            || -> () { panic!("still completes") },
            move || {
                let _ = probe_tx.send(());
            },
        );
        task.run();
        probe_rx.recv().unwrap();
        assert!(matches!(handle.wait(), Err(TaskError::Panicked(_))));
    }

    #[test]
    fn dropped_task_reports_abandoned() {
        let (task, handle) = PackagedTask::new(|| 1);
        drop(task);
        assert!(matches!(handle.wait(), Err(TaskError::Abandoned)));
    }

    #[test]
    fn timeout_when_task_never_runs() {
        let (_task, handle) = PackagedTask::new(|| 1);
        assert!(matches!(
            handle.wait_timeout(Duration::from_millis(10)),
            Err(TaskError::Timeout)
        ));
    }
}
