//! Default tunables for the dispatch engine.

use std::num::NonZeroUsize;
use std::thread;

/// Capacity of the worker pool's submission queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
/// How long shutdown waits for in-flight dispatch tasks, in milliseconds.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 1000;

/// Worker count matching the available hardware parallelism (at least one).
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
