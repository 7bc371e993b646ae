//! Prioritized Job Scheduling
//!
//! This module provides the scheduling core that arbitrates concurrent work
//! requests from many independent consumers against a bounded worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Consumers (JobClient)                    │
//! │  re-declare their full want-list on every change (order)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        JobScheduler                          │
//! │  reconcile want-lists, dedup by (category, key), cancel     │
//! │  orphaned sources, rebuild the global queue                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Global      │  │ Change      │  │ Scheduler           │  │
//! │  │ Queue       │  │ Notify      │  │ Sink                │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Job**: A cancellable unit of work wrapping an opaque command and a
//!   one-shot completion signal.
//!
//! - **JobSource**: A queue entry binding a Job to a dedup key and a
//!   category. Many clients' orders can resolve to one shared source.
//!
//! - **JobClient**: A registration handle for one consumer. A client calls
//!   [`JobScheduler::order`] with its *complete* current want-list, not a
//!   delta; the scheduler reuses matching in-flight sources and cancels the
//!   ones nobody wants anymore.
//!
//! - **Category**: Clients operate in a priority band ([`JobCategory`]).
//!   The global queue concatenates all clients' want-lists in descending
//!   category priority, preserving each client's own order.
//!
//! # Dispatch
//!
//! Idle workers call [`JobScheduler::fetch_next_job`] with an acceptable
//! priority range and receive the first not-yet-dispatched job in queue
//! order. Dispatch is marked inside the same critical section, so two
//! concurrent fetches never receive the same job.

mod category;
mod client;
mod command;
mod core;
mod error;
mod job;
mod order;
mod source;
mod telemetry;

pub use category::{
    JobCategory, PRIORITY_FOLDER_THUMBNAIL, PRIORITY_METADATA, PRIORITY_PAGE_THUMBNAIL,
    PRIORITY_PAGE_VIEW, PRIORITY_PREFETCH,
};
pub use client::{ClientId, JobClient};
pub use command::{CommandContext, CommandError, CommandResult, JobCommand};
pub use self::core::JobScheduler;
pub use error::SchedulerError;
pub use job::{Job, JobOutcome, JobState};
pub use order::JobOrder;
pub use source::{JobKey, JobSource};
pub use telemetry::{
    MultiplexSchedulerSink, NullSchedulerSink, SchedulerEvent, SchedulerSink, TracingSchedulerSink,
};
