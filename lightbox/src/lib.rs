//! Lightbox - prioritized job scheduling for an image viewer.
//!
//! This library provides the work-arbitration core of the Lightbox image
//! viewer: many independent consumers (folder panels, page viewers, history
//! lists) continuously re-declare the work they want (image decodes,
//! thumbnail renders, metadata extraction), and a bounded pool of workers
//! drains one globally ordered queue built from all of those declarations.
//!
//! # High-Level API
//!
//! ```ignore
//! use lightbox::scheduler::{JobCategory, JobClient, JobOrder, JobScheduler};
//! use lightbox::worker::{WorkerPool, WorkerPoolConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let scheduler = Arc::new(JobScheduler::new());
//! let shutdown = CancellationToken::new();
//! let pool = WorkerPool::spawn(
//!     Arc::clone(&scheduler),
//!     WorkerPoolConfig::default(),
//!     shutdown.clone(),
//! );
//!
//! let viewer = JobClient::new("page-viewer", JobCategory::page_view());
//! scheduler.register_client(&viewer).await;
//!
//! // Declare everything the viewer currently wants, most-wanted first.
//! let sources = scheduler
//!     .order(&viewer, vec![JobOrder::new("photos/0042.jpg", DecodePage::new())])
//!     .await;
//!
//! // Block on the decode the user is looking at right now.
//! sources[0].job().wait_completed(timeout, None).await?;
//! ```

pub mod logging;
pub mod scheduler;
pub mod worker;

/// Version of the Lightbox scheduling library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
