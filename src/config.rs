//! Pool and graph configuration structures.

use serde::{Deserialize, Serialize};

/// Number of workers a [`crate::TaskGraph`] runs with unless told otherwise.
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Thread pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads. Zero is legal: such a pool accepts tasks
    /// but never makes progress, and its teardown completes immediately.
    pub worker_count: usize,
    /// Prefix for worker thread names, suffixed with the worker index.
    pub thread_name_prefix: String,
    /// Stack size per worker thread, or `None` for the platform default.
    pub thread_stack_size: Option<usize>,
}

impl PoolConfig {
    /// Configuration with default worker count and naming.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets an explicit per-worker stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0 when set".into());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            thread_name_prefix: "wg-worker".into(),
            thread_stack_size: None,
        }
    }
}

/// Task graph configuration: the pool the graph owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Configuration of the graph's internal pool.
    pub pool: PoolConfig,
}

impl GraphConfig {
    /// Configuration with the default pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads in the graph's pool.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.pool.worker_count = worker_count;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PoolConfig::default().validate().is_ok());
        assert!(GraphConfig::default().validate().is_ok());
        assert_eq!(PoolConfig::default().worker_count, DEFAULT_WORKER_COUNT);
    }

    #[test]
    fn zero_workers_is_accepted() {
        assert!(PoolConfig::new().with_worker_count(0).validate().is_ok());
    }

    #[test]
    fn empty_name_prefix_is_rejected() {
        let config = PoolConfig::new().with_thread_name_prefix("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_stack_size_is_rejected() {
        let config = PoolConfig::new().with_thread_stack_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_chains() {
        let config = PoolConfig::new()
            .with_worker_count(4)
            .with_thread_name_prefix("crunch")
            .with_thread_stack_size(256 * 1024);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.thread_name_prefix, "crunch");
        assert_eq!(config.thread_stack_size, Some(256 * 1024));
    }

    #[test]
    fn graph_config_forwards_worker_count() {
        let config = GraphConfig::new().with_worker_count(2);
        assert_eq!(config.pool.worker_count, 2);
    }
}
