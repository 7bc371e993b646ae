//! Queue entries binding jobs to dedup keys and categories.

use super::category::JobCategory;
use super::job::{Job, JobOutcome};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// =============================================================================
// Job Key
// =============================================================================

/// Consumer-defined deduplication key, typically a resource path.
///
/// Orders from any client that resolve to the same (category, key) pair
/// share one [`JobSource`], and through it one [`Job`].
///
/// # Example
///
/// ```ignore
/// use lightbox::scheduler::JobKey;
///
/// let key = JobKey::new("photos/2024/0042.jpg");
/// ```
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct JobKey(String);

impl JobKey {
    /// Creates a key from the given string value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the string value of this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobKey({})", self.0)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Job Source
// =============================================================================

/// A queue entry binding a [`Job`] to a dedup key and a category.
///
/// Sources are shared by `Arc` between client want-lists, the global
/// queue, and consumers holding the handles returned by `order`. The
/// `dispatched` flag transitions false to true exactly once, inside the
/// scheduler's fetch critical section, and never reverts.
pub struct JobSource {
    category: Arc<JobCategory>,
    key: JobKey,
    job: Arc<Job>,
    dispatched: AtomicBool,
}

impl JobSource {
    /// Wraps a freshly created job into a source.
    pub(crate) fn new(category: Arc<JobCategory>, key: JobKey, job: Job) -> Arc<Self> {
        Arc::new(Self {
            category,
            key,
            job: Arc::new(job),
            dispatched: AtomicBool::new(false),
        })
    }

    /// The category this source is queued under.
    pub fn category(&self) -> &Arc<JobCategory> {
        &self.category
    }

    /// The deduplication key.
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// The wrapped job, shared by reference.
    pub fn job(&self) -> Arc<Job> {
        Arc::clone(&self.job)
    }

    /// The category priority, for dispatch range checks.
    pub fn priority(&self) -> i32 {
        self.category.priority()
    }

    /// Returns true once a worker has fetched this source's job.
    pub fn dispatched(&self) -> bool {
        self.dispatched.load(Ordering::Acquire)
    }

    /// Marks the source dispatched. Called under the scheduler mutex only.
    pub(crate) fn mark_dispatched(&self) {
        self.dispatched.store(true, Ordering::Release);
    }

    /// Cancels the underlying job.
    ///
    /// A source that was never handed to a worker is closed as canceled
    /// here, so its completion signal is set and waiters unblock; a
    /// dispatched source is closed by the worker that observes the token.
    pub(crate) fn cancel(&self) {
        self.job.cancel();
        if !self.dispatched() {
            self.job.close(JobOutcome::Canceled);
        }
    }
}

impl fmt::Debug for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSource")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("serial", &self.job.serial())
            .field("dispatched", &self.dispatched())
            .finish()
    }
}
