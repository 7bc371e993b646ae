//! Worker pool executing scheduled jobs.
//!
//! Workers implement the dispatch contract: each repeatedly calls
//! [`JobScheduler::fetch_next_job`](crate::scheduler::JobScheduler::fetch_next_job)
//! with its priority range, executes the returned job's command, and closes
//! the job exactly once regardless of success, failure, or cancellation.
//! When nothing is eligible a worker parks on the scheduler's change
//! notification, with an idle poll interval as fallback.
//!
//! The pool splits its workers into a *primary* set restricted to the
//! high-priority band (time-critical decodes stay responsive under
//! thumbnail backfill) and a *secondary* set serving the full range.

mod config;
mod pool;
mod worker;

pub use config::{
    WorkerPoolConfig, DEFAULT_IDLE_POLL_INTERVAL, DEFAULT_PRIMARY_FLOOR,
    DEFAULT_PRIMARY_WORKER_COUNT, DEFAULT_SECONDARY_WORKER_COUNT,
};
pub use pool::WorkerPool;
