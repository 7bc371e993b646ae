//! Consumer registration handles.

use super::category::JobCategory;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for client identifiers.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier for a registered client.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        Self(CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registration handle representing one consumer's want-list.
///
/// A client operates in exactly one category. Clones preserve identity:
/// they refer to the same registration, so a consumer can hand copies to
/// whatever owns its lifecycle.
///
/// # Example
///
/// ```ignore
/// use lightbox::scheduler::{JobCategory, JobClient};
///
/// let client = JobClient::new("folder-panel", JobCategory::folder_thumbnail());
/// scheduler.register_client(&client).await;
/// ```
#[derive(Clone)]
pub struct JobClient {
    id: ClientId,
    name: String,
    category: Arc<JobCategory>,
}

impl JobClient {
    /// Creates a client handle in the given category.
    ///
    /// The name is for logging only; identity comes from the generated id.
    pub fn new(name: impl Into<String>, category: Arc<JobCategory>) -> Self {
        Self {
            id: ClientId::next(),
            name: name.into(),
            category,
        }
    }

    /// The client's unique identifier.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Human-readable name for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category this client operates in.
    pub fn category(&self) -> &Arc<JobCategory> {
        &self.category
    }
}

impl fmt::Debug for JobClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobClient")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}
