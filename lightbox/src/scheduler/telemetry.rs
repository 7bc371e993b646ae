//! Telemetry for scheduling observability.
//!
//! The scheduler and workers emit structured events via a sink
//! abstraction. The scheduler doesn't know how events are consumed—this
//! follows the "emit, don't present" pattern: a queue-depth display, a log
//! file, and a metrics exporter can all subscribe without the scheduler
//! caring which.
//!
//! # Example
//!
//! ```ignore
//! use lightbox::scheduler::{SchedulerEvent, SchedulerSink};
//!
//! struct LoggingSink;
//!
//! impl SchedulerSink for LoggingSink {
//!     fn emit(&self, event: SchedulerEvent) {
//!         tracing::info!(?event, "Scheduler event");
//!     }
//! }
//! ```

use super::client::ClientId;
use super::job::JobOutcome;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Scheduler Events
// =============================================================================

/// Events emitted by the scheduler and workers.
#[derive(Clone, Debug)]
pub enum SchedulerEvent {
    /// A client registered with the scheduler.
    ClientRegistered {
        client_id: ClientId,
        name: String,
        category: String,
        priority: i32,
    },

    /// A client was unregistered. Its sources stay queued until the next
    /// `order` call rebuilds the queue.
    ClientUnregistered { client_id: ClientId, name: String },

    /// An `order` call reconciled a client's want-list and rebuilt the
    /// global queue.
    QueueRebuilt {
        client_id: ClientId,
        queue_depth: usize,
        reused: usize,
        created: usize,
        canceled: usize,
    },

    /// A worker fetched a job for execution.
    JobDispatched {
        serial: u64,
        key: String,
        category: String,
        priority: i32,
    },

    /// A worker finished a job (successfully, with a failed command, or
    /// cancelled).
    JobFinished {
        serial: u64,
        command: String,
        outcome: JobOutcome,
        duration: Duration,
    },
}

impl SchedulerEvent {
    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ClientRegistered { .. } => "client_registered",
            Self::ClientUnregistered { .. } => "client_unregistered",
            Self::QueueRebuilt { .. } => "queue_rebuilt",
            Self::JobDispatched { .. } => "job_dispatched",
            Self::JobFinished { .. } => "job_finished",
        }
    }
}

// =============================================================================
// Scheduler Sink Trait
// =============================================================================

/// Sink for scheduler events.
///
/// Implementations must be thread-safe (`Send + Sync`); events are emitted
/// from consumer tasks and worker tasks concurrently. `emit` should be
/// fast and non-blocking—buffer or channel out anything expensive.
pub trait SchedulerSink: Send + Sync {
    /// Called when a scheduling event occurs.
    fn emit(&self, event: SchedulerEvent);
}

// =============================================================================
// Built-in Sink Implementations
// =============================================================================

/// No-op sink for when telemetry is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSchedulerSink;

impl SchedulerSink for NullSchedulerSink {
    fn emit(&self, _event: SchedulerEvent) {
        // Intentionally empty
    }
}

/// Sink that logs events using the `tracing` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSchedulerSink;

impl SchedulerSink for TracingSchedulerSink {
    fn emit(&self, event: SchedulerEvent) {
        match &event {
            SchedulerEvent::ClientRegistered {
                client_id,
                name,
                category,
                priority,
            } => {
                tracing::debug!(
                    client_id = %client_id,
                    name = %name,
                    category = %category,
                    priority = priority,
                    "Client registered"
                );
            }
            SchedulerEvent::ClientUnregistered { client_id, name } => {
                tracing::debug!(
                    client_id = %client_id,
                    name = %name,
                    "Client unregistered"
                );
            }
            SchedulerEvent::QueueRebuilt {
                client_id,
                queue_depth,
                reused,
                created,
                canceled,
            } => {
                tracing::debug!(
                    client_id = %client_id,
                    queue_depth = queue_depth,
                    reused = reused,
                    created = created,
                    canceled = canceled,
                    "Queue rebuilt"
                );
            }
            SchedulerEvent::JobDispatched {
                serial,
                key,
                category,
                priority,
            } => {
                tracing::trace!(
                    serial = serial,
                    key = %key,
                    category = %category,
                    priority = priority,
                    "Job dispatched"
                );
            }
            SchedulerEvent::JobFinished {
                serial,
                command,
                outcome,
                duration,
            } => {
                tracing::debug!(
                    serial = serial,
                    command = %command,
                    outcome = ?outcome,
                    duration_ms = duration.as_millis(),
                    "Job finished"
                );
            }
        }
    }
}

/// Sink that forwards events to multiple sinks.
pub struct MultiplexSchedulerSink {
    sinks: Vec<Arc<dyn SchedulerSink>>,
}

impl MultiplexSchedulerSink {
    /// Creates a new multiplex sink with the given sinks.
    pub fn new(sinks: Vec<Arc<dyn SchedulerSink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink to the multiplex.
    pub fn add_sink(&mut self, sink: Arc<dyn SchedulerSink>) {
        self.sinks.push(sink);
    }
}

impl SchedulerSink for MultiplexSchedulerSink {
    fn emit(&self, event: SchedulerEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

impl std::fmt::Debug for MultiplexSchedulerSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexSchedulerSink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}
