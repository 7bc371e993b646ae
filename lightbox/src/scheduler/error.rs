//! Error types for the scheduling engine.

use thiserror::Error;

/// Errors surfaced by scheduler operations.
///
/// The scheduler is a pure coordination structure: `order` and
/// `fetch_next_job` are total functions over their guarded state, and an
/// unregistered client is a no-op rather than an error. The only failure a
/// caller can observe is the abandonment of a completion wait by its own
/// cancellation token.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The caller-supplied cancellation token fired while waiting for a
    /// job to complete. The job itself is unaffected; this means "caller
    /// no longer cares", not "job was cancelled".
    #[error("wait for job completion abandoned by caller")]
    WaitInterrupted,
}
