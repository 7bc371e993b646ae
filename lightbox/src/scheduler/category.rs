//! Job categories: immutable priority tags shared by groups of consumers.
//!
//! A category names the priority band its clients compete in. Higher
//! priority categories are served first; within a band, clients keep their
//! registration order and each client keeps its submitted want-list order.

use std::fmt;
use std::sync::Arc;

// =============================================================================
// Standard Priority Bands
// =============================================================================

/// Priority of decodes for pages on screen right now.
pub const PRIORITY_PAGE_VIEW: i32 = 50;

/// Priority of thumbnails for pages near the viewport.
pub const PRIORITY_PAGE_THUMBNAIL: i32 = 40;

/// Priority of thumbnails in folder panels.
pub const PRIORITY_FOLDER_THUMBNAIL: i32 = 30;

/// Priority of metadata extraction (EXIF, dimensions).
pub const PRIORITY_METADATA: i32 = 20;

/// Priority of speculative read-ahead work.
pub const PRIORITY_PREFETCH: i32 = 10;

// =============================================================================
// Job Category
// =============================================================================

/// An immutable priority tag shared by a group of consumers.
///
/// Two categories with the same name and priority are the same category for
/// deduplication purposes. Categories are shared as `Arc<JobCategory>`
/// between clients and the job sources they resolve to.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JobCategory {
    name: String,
    priority: i32,
}

impl JobCategory {
    /// Creates a category with the given name and priority.
    ///
    /// Higher priorities are served first.
    pub fn new(name: impl Into<String>, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            priority,
        })
    }

    /// Category for pages being viewed right now.
    pub fn page_view() -> Arc<Self> {
        Self::new("PageView", PRIORITY_PAGE_VIEW)
    }

    /// Category for thumbnails of pages near the viewport.
    pub fn page_thumbnail() -> Arc<Self> {
        Self::new("PageThumbnail", PRIORITY_PAGE_THUMBNAIL)
    }

    /// Category for folder panel thumbnails.
    pub fn folder_thumbnail() -> Arc<Self> {
        Self::new("FolderThumbnail", PRIORITY_FOLDER_THUMBNAIL)
    }

    /// Category for metadata extraction.
    pub fn metadata() -> Arc<Self> {
        Self::new("Metadata", PRIORITY_METADATA)
    }

    /// Category for speculative read-ahead.
    pub fn prefetch() -> Arc<Self> {
        Self::new("Prefetch", PRIORITY_PREFETCH)
    }

    /// Returns the category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the category priority. Higher is served first.
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl fmt::Debug for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobCategory({}, {})", self.name, self.priority)
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
