//! Dependency-ordered task scheduling over the shared-queue pool.
//!
//! A [`TaskGraph`] accepts closures together with the handles of tasks they
//! must run after. Each submission becomes a node in a [`SlotMap`]: the
//! node records how many predecessors are still outstanding and which later
//! nodes are waiting on it. Tasks with no outstanding predecessors go to
//! the pool immediately; the rest park their work in the node until the
//! last predecessor's completion callback promotes them.
//!
//! The completion callback runs on a worker thread, strictly outside the
//! pool's queue lock, so a task body may itself call [`TaskGraph::submit`].
//! Locks are always taken in the order {graph, pool}: submission and
//! completion hold the graph mutex while enqueueing into the pool, and a
//! worker never holds the pool mutex while running user code.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::{GraphConfig, DEFAULT_WORKER_COUNT};
use crate::error::{PoolError, TaskError};
use crate::pool::{PoolHandle, ThreadPool};
use crate::slot_map::SlotMap;
use crate::sync::Mutex;
use crate::task::{PackagedTask, TaskHandle};

/// Opaque handle naming a graph node.
///
/// Once the named task completes its node is retired; passing a retired id
/// as a dependency counts as a dependency that is already satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(usize);

/// A node in the dependency graph.
///
/// For tasks dispatched immediately the `function` slot stays empty; the
/// node then exists purely to carry its dependees list.
struct Node {
    function: Option<PackagedTask>,
    /// Predecessors that have not completed yet.
    remaining: usize,
    /// Nodes whose `remaining` must drop when this one completes.
    dependees: Vec<usize>,
}

/// State shared between the graph and the trampolines running on workers.
///
/// Holds only the pool's enqueue handle, never its join side, so the last
/// trampoline to finish cannot make a worker join itself.
struct GraphCore {
    nodes: Mutex<SlotMap<Node>>,
    pool: PoolHandle,
}

impl GraphCore {
    /// Completion callback: promote newly unblocked dependees, then retire
    /// the finished node.
    fn complete(&self, id: usize) {
        let mut nodes = self.nodes.lock();
        let dependees = std::mem::take(&mut nodes[id].dependees);
        for dependee in dependees {
            let node = &mut nodes[dependee];
            node.remaining -= 1;
            if node.remaining == 0 {
                let task = node
                    .function
                    .take()
                    .expect("unblocked node holds no parked work");
                trace!(task_id = dependee, "dependency count reached zero");
                self.pool.add_packaged_task(task);
            }
        }
        nodes.erase(id);
    }
}

/// A submitted graph task: its id plus the handle to its result.
#[derive(Debug)]
pub struct GraphTask<R> {
    id: TaskId,
    handle: TaskHandle<R>,
}

impl<R> GraphTask<R> {
    /// The id to pass as a dependency of later submissions.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Blocks until the task has run and returns its result.
    ///
    /// # Errors
    ///
    /// As [`TaskHandle::wait`].
    pub fn wait(self) -> Result<R, TaskError> {
        self.handle.wait()
    }

    /// Like [`GraphTask::wait`] but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// As [`TaskHandle::wait_timeout`].
    pub fn wait_timeout(self, timeout: Duration) -> Result<R, TaskError> {
        self.handle.wait_timeout(timeout)
    }

    /// Whether the result is already available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Gives up the id and keeps only the completion handle.
    #[must_use]
    pub fn into_handle(self) -> TaskHandle<R> {
        self.handle
    }
}

/// Dependency scheduler over an owned [`ThreadPool`].
///
/// Submissions declare the tasks they must run after; independent branches
/// run in whatever order the pool's workers reach them. Dropping the graph
/// drains the pool: every task already handed to the pool runs first.
///
/// The graph is `Sync`; share it as `Arc<TaskGraph>` to submit follow-up
/// work from inside running tasks. Keep at least one clone of that `Arc`
/// outside the workers, so teardown never runs on a thread the pool is
/// about to join.
///
/// # Examples
///
/// ```
/// use workgraph::TaskGraph;
/// use std::time::Duration;
///
/// let graph = TaskGraph::new(2);
/// let base = graph.submit(|| 20, &[]);
/// let doubled = graph.submit(|| 2 * 21, &[base.id()]);
/// assert_eq!(doubled.wait_timeout(Duration::from_secs(10)).unwrap(), 42);
/// ```
pub struct TaskGraph {
    core: Arc<GraphCore>,
    pool: ThreadPool,
}

impl TaskGraph {
    /// Creates a graph executing on `worker_count` pool threads.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a worker thread.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let pool = ThreadPool::new(worker_count);
        Self::with_pool(pool)
    }

    /// Creates a graph from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_config(config: &GraphConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        Ok(Self::with_pool(ThreadPool::with_config(&config.pool)?))
    }

    fn with_pool(pool: ThreadPool) -> Self {
        let core = Arc::new(GraphCore {
            nodes: Mutex::new(SlotMap::new()),
            pool: pool.handle(),
        });
        Self { core, pool }
    }

    /// Submits `func` to run once every task in `deps` has completed.
    ///
    /// With no outstanding dependencies the work goes straight to the pool;
    /// otherwise it is parked in its node and promoted by the completion
    /// callback of the last predecessor to finish. Either way the returned
    /// handle resolves with `func`'s result (or its panic) once it has run.
    ///
    /// A dependency that has already completed counts as satisfied: retired
    /// node indices are never reissued, so a retired id can always be told
    /// apart from a live one.
    ///
    /// The node insertion, dependee wiring and dispatch decision all happen
    /// under one acquisition of the graph mutex, so a predecessor finishing
    /// concurrently can never observe the new node half-wired.
    pub fn submit<F, R>(&self, func: F, deps: &[TaskId]) -> GraphTask<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let core = Arc::clone(&self.core);
        let mut nodes = self.core.nodes.lock();

        let id = nodes.insert(Node {
            function: None,
            remaining: 0,
            dependees: Vec::new(),
        });
        let mut remaining = 0;
        for dep in deps {
            if let Some(dep_node) = nodes.get_mut(dep.0) {
                dep_node.dependees.push(id);
                remaining += 1;
            }
        }
        nodes[id].remaining = remaining;

        let (task, handle) = PackagedTask::with_completion(func, move || core.complete(id));
        if remaining == 0 {
            // Dispatch now; the node stays behind to carry its dependees.
            self.core.pool.add_packaged_task(task);
        } else {
            nodes[id].function = Some(task);
        }
        debug!(task_id = id, dependencies = deps.len(), "task submitted");

        GraphTask {
            id: TaskId(id),
            handle,
        }
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}
