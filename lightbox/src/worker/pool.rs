//! Bounded pool of workers draining the scheduler.

use super::config::WorkerPoolConfig;
use super::worker::Worker;
use crate::scheduler::JobScheduler;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A bounded pool of workers executing scheduled jobs.
///
/// Workers run as tokio tasks until the shutdown token is cancelled. The
/// pool never stops a running command; cancellation reaches commands
/// through their job's token.
///
/// # Example
///
/// ```ignore
/// use lightbox::worker::{WorkerPool, WorkerPoolConfig};
///
/// let pool = WorkerPool::spawn(scheduler, WorkerPoolConfig::default(), shutdown.clone());
/// // ... run the viewer ...
/// shutdown.cancel();
/// pool.join().await;
/// ```
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the configured workers against the scheduler.
    pub fn spawn(
        scheduler: Arc<JobScheduler>,
        config: WorkerPoolConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let mut handles = Vec::with_capacity(config.primary_workers + config.secondary_workers);
        let mut index = 0;

        for _ in 0..config.primary_workers {
            let worker = Worker::new(
                index,
                Arc::clone(&scheduler),
                config.primary_floor,
                i32::MAX,
                config.idle_poll_interval,
            );
            handles.push(tokio::spawn(worker.run(shutdown.clone())));
            index += 1;
        }

        for _ in 0..config.secondary_workers {
            let worker = Worker::new(
                index,
                Arc::clone(&scheduler),
                i32::MIN,
                i32::MAX,
                config.idle_poll_interval,
            );
            handles.push(tokio::spawn(worker.run(shutdown.clone())));
            index += 1;
        }

        info!(
            primary = config.primary_workers,
            secondary = config.secondary_workers,
            primary_floor = config.primary_floor,
            "Worker pool started"
        );

        Self { handles }
    }

    /// Number of spawned workers.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Waits for all workers to exit. Cancel the shutdown token first.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.handles.len())
            .finish()
    }
}
