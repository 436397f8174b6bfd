//! Error types for pool and graph operations.

use thiserror::Error;

/// Errors surfaced when waiting on a task's completion handle.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task body panicked. The worker that ran it keeps serving; the
    /// captured panic message is carried to the waiter.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The wait deadline elapsed before the task produced a result. The
    /// task itself still runs to completion.
    #[error("timed out waiting for task result")]
    Timeout,
    /// The task was dropped without ever running, so no result will arrive.
    #[error("task was dropped before producing a result")]
    Abandoned,
}

/// Errors produced when constructing a pool or graph.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
