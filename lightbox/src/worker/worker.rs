//! The worker loop: fetch, execute, close.

use crate::scheduler::{
    CommandContext, CommandResult, Job, JobOutcome, JobScheduler, SchedulerEvent,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One worker serving a priority range against the scheduler.
///
/// A worker repeatedly fetches the next eligible job, executes its command,
/// and closes the job—exactly once, regardless of success, failure, or
/// cancellation—so waiters are never left blocked.
pub(crate) struct Worker {
    index: usize,
    scheduler: Arc<JobScheduler>,
    min_priority: i32,
    max_priority: i32,
    idle_poll_interval: Duration,
}

impl Worker {
    pub(crate) fn new(
        index: usize,
        scheduler: Arc<JobScheduler>,
        min_priority: i32,
        max_priority: i32,
        idle_poll_interval: Duration,
    ) -> Self {
        Self {
            index,
            scheduler,
            min_priority,
            max_priority,
            idle_poll_interval,
        }
    }

    /// Runs the worker until shutdown is signalled.
    pub(crate) async fn run(self, shutdown: CancellationToken) {
        debug!(
            worker = self.index,
            min_priority = self.min_priority,
            max_priority = self.max_priority,
            "Worker started"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self
                .scheduler
                .fetch_next_job(self.min_priority, self.max_priority)
                .await
            {
                Some(job) => self.run_job(job).await,
                None => {
                    tokio::select! {
                        biased;

                        _ = shutdown.cancelled() => break,
                        _ = self.scheduler.changed() => {}
                        _ = tokio::time::sleep(self.idle_poll_interval) => {}
                    }
                }
            }
        }

        debug!(worker = self.index, "Worker stopped");
    }

    /// Executes one fetched job and closes it.
    pub(crate) async fn run_job(&self, job: Arc<Job>) {
        let Some(command) = job.take_command() else {
            job.set_completed();
            return;
        };

        if job.cancellation().is_cancelled() {
            job.close(JobOutcome::Canceled);
            return;
        }

        job.mark_running();
        let started = Instant::now();
        let command_name = command.name().to_string();
        debug!(
            worker = self.index,
            serial = job.serial(),
            command = %command_name,
            "Job started"
        );

        let mut ctx = CommandContext::new(job.cancellation().clone());
        let result = command.execute(&mut ctx).await;

        let outcome = match result {
            CommandResult::Success => JobOutcome::Completed,
            CommandResult::Cancelled => JobOutcome::Canceled,
            CommandResult::Failed(error) => {
                warn!(
                    worker = self.index,
                    serial = job.serial(),
                    command = %command_name,
                    error = %error,
                    "Command failed"
                );
                JobOutcome::Completed
            }
        };
        job.close(outcome);

        self.scheduler.telemetry().emit(SchedulerEvent::JobFinished {
            serial: job.serial(),
            command: command_name,
            outcome,
            duration: started.elapsed(),
        });
    }
}
