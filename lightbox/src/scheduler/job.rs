//! Cancellable units of work with a one-shot completion signal.
//!
//! A [`Job`] wraps an opaque command together with the signals that let the
//! rest of the system coordinate around it: a cancellation token shared
//! with the executing worker, and a completion signal that is set exactly
//! once when the job finishes, successfully or not. Jobs are created by the
//! scheduler when an order has no matching in-flight source, and are shared
//! by reference between the queue, workers, and any external waiter.

use super::command::JobCommand;
use super::error::SchedulerError;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Global counter for job serial numbers.
static JOB_SERIAL: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Lifecycle State
// =============================================================================

/// Lifecycle state of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    /// Created, not yet picked up by a worker.
    #[default]
    None = 0,

    /// A worker is executing the job's command.
    Running = 1,

    /// Execution finished or the job was cancelled before running.
    Closed = 2,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Running,
            _ => Self::Closed,
        }
    }
}

/// Final outcome of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum JobOutcome {
    /// Not finished yet.
    #[default]
    None = 0,

    /// Cancelled before or during execution.
    Canceled = 1,

    /// Execution finished. A failed command still counts as completed;
    /// failure is the command's business, finishing is the scheduler's.
    Completed = 2,
}

impl JobOutcome {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Canceled,
            _ => Self::Completed,
        }
    }
}

// =============================================================================
// Job
// =============================================================================

/// A cancellable unit of work wrapping an opaque command.
///
/// The completion signal is set at most once; waiting on it after it is
/// set returns immediately. Only the executing worker moves the state to
/// `Running`; close paths (worker completion, cancellation of a
/// never-dispatched source) move it to `Closed`.
pub struct Job {
    serial: u64,
    command: Mutex<Option<Box<dyn JobCommand>>>,
    cancellation: CancellationToken,
    state: AtomicU8,
    outcome: AtomicU8,
    completed_tx: watch::Sender<bool>,
}

impl Job {
    /// Creates a job in state `None`/`None` with an unset completion
    /// signal and the next serial number.
    pub(crate) fn new(command: Box<dyn JobCommand>, cancellation: CancellationToken) -> Self {
        let (completed_tx, _completed_rx) = watch::channel(false);
        Self {
            serial: JOB_SERIAL.fetch_add(1, Ordering::Relaxed),
            command: Mutex::new(Some(command)),
            cancellation,
            state: AtomicU8::new(JobState::None as u8),
            outcome: AtomicU8::new(JobOutcome::None as u8),
            completed_tx,
        }
    }

    /// Process-lifetime serial number. Informational only.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Final outcome, `None` until the job closes.
    pub fn outcome(&self) -> JobOutcome {
        JobOutcome::from_u8(self.outcome.load(Ordering::Acquire))
    }

    /// The job's cancellation token, shared with the executing worker.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancels the job's token.
    ///
    /// A job that has not started never runs after this; a running job is
    /// expected to observe the token and terminate early.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns true if the completion signal has been set.
    pub fn is_completed(&self) -> bool {
        *self.completed_tx.borrow()
    }

    /// Idempotently sets the completion signal, waking all waiters.
    ///
    /// Safe to call from any thread and any number of times.
    pub fn set_completed(&self) {
        self.completed_tx.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        });
    }

    /// Takes the command for execution. Returns `None` if a worker has
    /// already taken it.
    pub(crate) fn take_command(&self) -> Option<Box<dyn JobCommand>> {
        self.command.lock().unwrap().take()
    }

    /// Marks the job as running. Called by the executing worker only.
    pub(crate) fn mark_running(&self) {
        self.state.store(JobState::Running as u8, Ordering::Release);
    }

    /// Closes the job with the given outcome and sets the completion
    /// signal. The first close wins; later calls only re-assert
    /// completion.
    pub(crate) fn close(&self, outcome: JobOutcome) {
        if self
            .outcome
            .compare_exchange(
                JobOutcome::None as u8,
                outcome as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.state.store(JobState::Closed as u8, Ordering::Release);
        }
        self.set_completed();
    }

    /// Waits until the completion signal is set.
    ///
    /// Returns `Ok(true)` iff the completion signal was observed set
    /// before the timeout elapsed or a cancellation fired. The job's own
    /// cancellation ends the wait with `Ok(false)`; only the
    /// caller-supplied `external` token produces
    /// [`SchedulerError::WaitInterrupted`], signalling that the caller no
    /// longer cares about the result.
    pub async fn wait_completed(
        &self,
        timeout: Duration,
        external: Option<&CancellationToken>,
    ) -> Result<bool, SchedulerError> {
        let mut rx = self.completed_tx.subscribe();
        if *rx.borrow_and_update() {
            return Ok(true);
        }

        let completed = async move {
            while rx.changed().await.is_ok() {
                if *rx.borrow_and_update() {
                    return true;
                }
            }
            false
        };

        let interrupted = async {
            match external {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            observed = completed => Ok(observed),
            _ = self.cancellation.cancelled() => Ok(self.is_completed()),
            _ = interrupted => Err(SchedulerError::WaitInterrupted),
            _ = tokio::time::sleep(timeout) => Ok(false),
        }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("serial", &self.serial)
            .field("state", &self.state())
            .field("outcome", &self.outcome())
            .field("completed", &self.is_completed())
            .finish()
    }
}
