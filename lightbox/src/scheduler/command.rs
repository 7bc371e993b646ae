//! The command contract: opaque executable units attached to jobs.
//!
//! The scheduler never inspects a command. It threads the command from
//! order submission through to the worker that executes it; everything the
//! command does (decode a bitmap, render a thumbnail, parse metadata) is
//! the consumer's business.
//!
//! # Example
//!
//! ```ignore
//! use lightbox::scheduler::{CommandContext, CommandResult, JobCommand};
//!
//! struct DecodePage { path: PathBuf }
//!
//! impl JobCommand for DecodePage {
//!     fn name(&self) -> &str { "DecodePage" }
//!
//!     fn execute<'a>(&'a self, ctx: &'a mut CommandContext)
//!         -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>
//!     {
//!         Box::pin(async move {
//!             if ctx.is_cancelled() {
//!                 return CommandResult::Cancelled;
//!             }
//!             // ... decode ...
//!             CommandResult::Success
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Command Result
// =============================================================================

/// Error produced by a failing command.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    /// Creates a command error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Outcome of a single command execution.
#[derive(Debug)]
pub enum CommandResult {
    /// The command ran to completion.
    Success,

    /// The command failed. The worker logs the error and still closes the
    /// job so waiters are not left blocked.
    Failed(CommandError),

    /// The command observed its cancellation token and bailed out early.
    Cancelled,
}

impl CommandResult {
    /// Returns true if the command ran to completion.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

// =============================================================================
// Command Context
// =============================================================================

/// Execution context handed to a running command.
///
/// Carries the owning job's cancellation token. Long-running commands
/// should check it between units of work and bail out early; the scheduler
/// never forcibly stops a running command.
#[derive(Clone, Debug)]
pub struct CommandContext {
    cancellation: CancellationToken,
}

impl CommandContext {
    /// Creates a context around the given cancellation token.
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// Returns true if the owning job has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the job's cancellation token, for commands that want to
    /// `select!` against it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

// =============================================================================
// Command Trait
// =============================================================================

/// An opaque executable unit associated with a job.
///
/// Implementations must be thread-safe: a command is created on a consumer
/// thread and executed on whichever worker fetches its job.
pub trait JobCommand: Send + Sync + 'static {
    /// Short name for logging ("DecodePage", "RenderThumbnail").
    fn name(&self) -> &str;

    /// Executes the command.
    ///
    /// The context carries the job's cancellation token; a command that
    /// observes cancellation should return [`CommandResult::Cancelled`]
    /// rather than completing partial work.
    fn execute<'a>(
        &'a self,
        ctx: &'a mut CommandContext,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCommand {
        counter: Arc<AtomicUsize>,
    }

    impl JobCommand for CountingCommand {
        fn name(&self) -> &str {
            "Counting"
        }

        fn execute<'a>(
            &'a self,
            ctx: &'a mut CommandContext,
        ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
            Box::pin(async move {
                if ctx.is_cancelled() {
                    return CommandResult::Cancelled;
                }
                self.counter.fetch_add(1, Ordering::SeqCst);
                CommandResult::Success
            })
        }
    }

    #[tokio::test]
    async fn test_command_executes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let command = CountingCommand {
            counter: Arc::clone(&counter),
        };
        let mut ctx = CommandContext::new(CancellationToken::new());

        let result = command.execute(&mut ctx).await;
        assert!(result.is_success());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_command_observes_cancellation() {
        let counter = Arc::new(AtomicUsize::new(0));
        let command = CountingCommand {
            counter: Arc::clone(&counter),
        };
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = CommandContext::new(token);

        let result = command.execute(&mut ctx).await;
        assert!(matches!(result, CommandResult::Cancelled));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_command_error_display() {
        let error = CommandError::new("decode failed");
        assert_eq!(format!("{}", error), "decode failed");
    }

    #[test]
    fn test_command_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.jpg");
        let error = CommandError::from(io);
        assert!(format!("{}", error).contains("missing.jpg"));
    }
}
