//! Synchronization primitives used throughout the crate.
//!
//! Everything funnels through the battle-tested `parking_lot` crate: locks
//! are compact, acquisition does not allocate, and there is no poisoning to
//! unwind through when a task panics inside a worker. All modules in this
//! crate name their primitives from here rather than importing `parking_lot`
//! directly, so swapping the lock implementation is a one-line change.

pub use parking_lot::{Condvar, Mutex, MutexGuard};
