//! # workgraph
//!
//! A small concurrent-execution toolkit: a shared-queue thread pool, a
//! dependency task graph scheduled through it, and the chunked slot map
//! that backs the graph's bookkeeping. A mutex-serialized logger with a
//! batching decorator rounds out the crate as a smaller instance of the
//! same resource-sharing discipline.
//!
//! ## Modules
//!
//! - [`slot_map`] - Chunked container with stable integer handles
//! - [`pool`] - Fixed-size worker pool over one FIFO queue
//! - [`graph`] - Dependency-ordered task scheduling
//! - [`task`] - Packaged tasks and completion handles
//! - [`logger`] - Serialized log sinks and scoped entries
//! - [`config`] - Pool/graph configuration
//! - [`telemetry`] - Tracing subscriber bootstrap
//!
//! ## Examples
//!
//! ### Running independent tasks on a pool
//!
//! ```
//! use workgraph::ThreadPool;
//!
//! let pool = ThreadPool::new(4);
//! let doubled = pool.add_task(|| 21 * 2);
//! assert_eq!(doubled.wait().unwrap(), 42);
//! ```
//!
//! ### Ordering work through a task graph
//!
//! ```
//! use workgraph::TaskGraph;
//! use std::time::Duration;
//!
//! let graph = TaskGraph::new(2);
//! let fetch = graph.submit(|| vec![3, 1, 2], &[]);
//! let sort = graph.submit(|| "sorted", &[fetch.id()]);
//! assert_eq!(sort.wait_timeout(Duration::from_secs(10)).unwrap(), "sorted");
//! ```
//!
//! ### Stable handles across reclamation
//!
//! ```
//! use workgraph::SlotMap;
//!
//! let mut map = SlotMap::new();
//! let keep = map.insert("kept");
//! let gone = map.insert("erased");
//! map.erase(gone);
//! assert_eq!(map[keep], "kept");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod graph;
pub mod logger;
pub mod pool;
pub mod slot_map;
pub mod sync;
pub mod task;
pub mod telemetry;

pub use config::{GraphConfig, PoolConfig};
pub use error::{PoolError, TaskError};
pub use graph::{GraphTask, TaskGraph, TaskId};
pub use logger::{stdout_writer, BufferedWriter, LogEntry, StreamWriter, Writer};
pub use pool::ThreadPool;
pub use slot_map::SlotMap;
pub use task::{PackagedTask, TaskHandle};
