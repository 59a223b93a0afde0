//! Boundary contracts between the pool and its collaborators.
//!
//! The pool never interprets commands: it moves them from a
//! [`CommandSource`] to a [`CommandProcessor`], one command per worker at a
//! time.

use crate::shutdown::ShutdownToken;

/// A shared, blocking supplier of commands.
///
/// All workers call [`next_command`](Self::next_command) concurrently on the
/// same source; each returned command is handed to exactly one worker, which
/// owns it until processing completes.
pub trait CommandSource: Send + Sync {
    /// Unit of work handed to exactly one worker.
    type Command: Send;

    /// Fetch the next command, blocking until one arrives.
    ///
    /// `None` means "nothing right now, try again" and is not an error.
    /// Implementations must return promptly (normally `None`) once
    /// `shutdown` is cancelled; [`ShutdownToken::wait_for`] is the intended
    /// parking primitive for sources without their own wakeup mechanism.
    fn next_command(&self, shutdown: &ShutdownToken) -> Option<Self::Command>;

    /// Whether the source has permanently stopped producing commands.
    ///
    /// Must be cheap, non-blocking, and monotone: once `true`, it stays
    /// `true` for the rest of the run.
    fn has_exited(&self) -> bool;

    /// Cheap, non-blocking hint that at least one further command is
    /// already waiting.
    ///
    /// The pool only grows while the source reports backlog, so a source
    /// that answers accurately never pays for spare workers it cannot feed.
    /// The default grows eagerly whenever worker availability runs out.
    fn has_backlog(&self) -> bool {
        true
    }
}

/// Executes commands on behalf of the pool.
pub trait CommandProcessor<C>: Send + Sync {
    /// Process a single command.
    ///
    /// Runs synchronously on the worker that fetched the command and may
    /// block only that worker. The command is dropped when this returns.
    fn process(&self, command: C);
}

/// Any `Fn(C)` closure is a processor; per-run user data rides in its
/// captures.
impl<C, F> CommandProcessor<C> for F
where
    F: Fn(C) + Send + Sync,
{
    fn process(&self, command: C) {
        self(command)
    }
}
