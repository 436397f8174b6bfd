//! Shared-queue thread pool with deterministic drain on teardown.
//!
//! A fixed set of worker threads serves one FIFO queue guarded by a single
//! mutex and one condition ("queue non-empty"). Submission from any thread —
//! including from inside a running task — is a push under the lock plus one
//! wakeup. Teardown enqueues one shutdown sentinel per worker *behind* all
//! previously submitted work, so every task accepted before the pool is
//! dropped runs exactly once before the workers exit.
//!
//! Tasks execute strictly outside the queue lock. A task is therefore free
//! to submit more work to the same pool, or to take other locks (such as a
//! task graph's), without deadlocking against the worker that runs it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::sync::{Condvar, Mutex};
use crate::task::{PackagedTask, TaskHandle};

/// A queued unit of work, or the signal for a worker to exit.
enum QueueEntry {
    Run(PackagedTask),
    /// Sentinel: the receiving worker leaves its loop. Enqueued only by the
    /// pool's own teardown, once per worker, behind all real work.
    Shutdown,
}

/// Queue state shared between submitters and workers.
struct PoolShared {
    queue: Mutex<VecDeque<QueueEntry>>,
    work_available: Condvar,
}

impl PoolShared {
    fn enqueue(&self, entry: QueueEntry) {
        self.queue.lock().push_back(entry);
        self.work_available.notify_one();
    }
}

/// A fixed-size worker pool draining a single FIFO task queue.
///
/// Dropping the pool blocks until every task submitted before the drop has
/// run. Tasks are free to enqueue further work while running; work enqueued
/// after teardown has begun is not guaranteed to run.
///
/// # Examples
///
/// ```
/// use workgraph::ThreadPool;
///
/// let pool = ThreadPool::new(2);
/// let handle = pool.add_task(|| 2 + 2);
/// assert_eq!(handle.wait().unwrap(), 4);
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Creates a pool with `worker_count` threads and default naming.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a worker thread.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let config = PoolConfig::new().with_worker_count(worker_count);
        Self::spawn(&config)
    }

    /// Creates a pool from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the configuration fails
    /// validation.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a worker thread.
    pub fn with_config(config: &PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        Ok(Self::spawn(config))
    }

    fn spawn(config: &PoolConfig) -> Self {
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let shared = Arc::clone(&shared);
            let mut builder =
                thread::Builder::new().name(format!("{}-{worker_id}", config.thread_name_prefix));
            if let Some(stack_size) = config.thread_stack_size {
                builder = builder.stack_size(stack_size);
            }
            let worker = builder
                .spawn(move || worker_loop(worker_id, &shared))
                .expect("failed to spawn worker thread");
            workers.push(worker);
        }

        info!(worker_count = config.worker_count, "thread pool started");
        Self { shared, workers }
    }

    /// Packages `func` and queues it, returning the handle to its result.
    ///
    /// Never blocks beyond the brief queue critical section. Callable from
    /// any thread, including pool workers.
    pub fn add_task<F, R>(&self, func: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, handle) = PackagedTask::new(func);
        self.shared.enqueue(QueueEntry::Run(task));
        handle
    }

    /// Queues a pre-packaged task whose completion handle is held elsewhere.
    pub fn add_packaged_task(&self, task: PackagedTask) {
        self.shared.enqueue(QueueEntry::Run(task));
    }

    /// An enqueue-only view of this pool for use by completion callbacks.
    pub(crate) fn handle(&self) -> PoolHandle {
        PoolHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for ThreadPool {
    /// Queues one sentinel per worker behind all submitted work, then joins.
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            for _ in 0..self.workers.len() {
                queue.push_back(QueueEntry::Shutdown);
            }
        }
        self.shared.work_available.notify_all();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                // Task panics are contained by the packaged task, so this
                // only fires for failures outside any task body.
                warn!("worker thread terminated abnormally");
            }
        }
        debug!("thread pool shut down");
    }
}

/// Enqueue-only clone of the pool's shared queue state.
///
/// Lets graph trampolines submit promoted tasks without holding the join
/// side of the pool, so a worker never ends up joining itself.
#[derive(Clone)]
pub(crate) struct PoolHandle {
    shared: Arc<PoolShared>,
}

impl PoolHandle {
    pub(crate) fn add_packaged_task(&self, task: PackagedTask) {
        self.shared.enqueue(QueueEntry::Run(task));
    }
}

/// Drains the shared queue until a shutdown sentinel arrives.
fn worker_loop(worker_id: usize, shared: &PoolShared) {
    debug!(worker_id, "worker started");
    loop {
        let entry = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(entry) = queue.pop_front() {
                    break entry;
                }
                shared.work_available.wait(&mut queue);
            }
        };
        match entry {
            QueueEntry::Run(task) => task.run(),
            QueueEntry::Shutdown => break,
        }
    }
    debug!(worker_id, "worker exiting");
}
