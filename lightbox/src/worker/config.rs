//! Worker pool configuration.

use crate::scheduler::PRIORITY_PAGE_THUMBNAIL;
use std::time::Duration;

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default number of workers reserved for the high-priority band.
pub const DEFAULT_PRIMARY_WORKER_COUNT: usize = 2;

/// Default number of workers serving the full priority range.
pub const DEFAULT_SECONDARY_WORKER_COUNT: usize = 2;

/// Default lowest category priority the primary workers accept.
pub const DEFAULT_PRIMARY_FLOOR: i32 = PRIORITY_PAGE_THUMBNAIL;

/// Default interval at which an idle worker re-checks the queue.
///
/// The change notification only wakes workers already parked on it; the
/// idle poll covers the gap.
pub const DEFAULT_IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// Worker Pool Configuration
// =============================================================================

/// Configuration for the worker pool.
///
/// Primary workers only serve jobs at or above `primary_floor`, keeping
/// slots free for time-critical decodes while secondary workers drain the
/// whole queue (thumbnail backfill, metadata, prefetch).
#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    /// Workers restricted to `[primary_floor, i32::MAX]`.
    pub primary_workers: usize,

    /// Workers serving the full priority range.
    pub secondary_workers: usize,

    /// Lowest category priority the primary workers accept.
    pub primary_floor: i32,

    /// How often an idle worker re-checks the queue.
    pub idle_poll_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            primary_workers: DEFAULT_PRIMARY_WORKER_COUNT,
            secondary_workers: DEFAULT_SECONDARY_WORKER_COUNT,
            primary_floor: DEFAULT_PRIMARY_FLOOR,
            idle_poll_interval: DEFAULT_IDLE_POLL_INTERVAL,
        }
    }
}
