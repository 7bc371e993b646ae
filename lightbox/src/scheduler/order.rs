//! Request descriptors submitted by consumers.

use super::command::JobCommand;
use super::source::JobKey;
use std::fmt;

/// A single entry in a consumer's want-list.
///
/// An order names the resource it wants work for (the dedup key) and
/// carries the command to run if no matching source is in flight. When the
/// scheduler reuses an existing source, the supplied command is dropped;
/// the in-flight job already covers it.
pub struct JobOrder {
    key: JobKey,
    command: Box<dyn JobCommand>,
}

impl JobOrder {
    /// Creates an order for the given key.
    pub fn new(key: impl Into<JobKey>, command: impl JobCommand) -> Self {
        Self {
            key: key.into(),
            command: Box::new(command),
        }
    }

    /// Creates an order from an already boxed command.
    ///
    /// Useful for factories that produce `Box<dyn JobCommand>`.
    pub fn from_boxed(key: impl Into<JobKey>, command: Box<dyn JobCommand>) -> Self {
        Self {
            key: key.into(),
            command,
        }
    }

    /// The deduplication key this order resolves under.
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Consumes the order into its key and command.
    pub(crate) fn into_parts(self) -> (JobKey, Box<dyn JobCommand>) {
        (self.key, self.command)
    }
}

impl fmt::Debug for JobOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOrder")
            .field("key", &self.key)
            .field("command", &self.command.name())
            .finish()
    }
}
